// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use photobooth::config::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Four-shot vintage photo strip booth")]
#[command(version = env!("PHOTOBOOTH_BUILD_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/photobooth/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the booth in the terminal (default)
    Booth,

    /// List available cameras
    List,

    /// Run one session without a UI and export the strip
    Session {
        /// Camera index to use (from 'photobooth list')
        #[arg(short, long, conflicts_with = "frames")]
        camera: Option<usize>,

        /// Image files to use as frames instead of a camera, cycled in order
        #[arg(short, long, num_args = 1..)]
        frames: Vec<PathBuf>,

        /// Caption printed under the photos
        #[arg(long)]
        caption: Option<String>,

        /// Output folder (default: ~/Pictures/Photobooth)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=photobooth=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Session {
            camera,
            frames,
            caption,
            output,
        }) => {
            let input = if frames.is_empty() {
                cli::SessionInput::Camera(camera.unwrap_or(config.camera_index))
            } else {
                cli::SessionInput::Frames(frames)
            };
            cli::run_session(&config, input, caption, output).await
        }
        Some(Commands::Booth) | None => photobooth::terminal::run(&config).await,
    }
}
