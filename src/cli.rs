// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Running a headless session from a camera or from image files

use photobooth::backends::camera::{FileSource, FrameSource, V4l2Source, v4l2};
use photobooth::config::Config;
use photobooth::export::{DeliveryOutcome, Exporter};
use photobooth::flash::FlashFeedback;
use photobooth::pipelines::strip::StripComposer;
use photobooth::session::{Booth, Sequencer, SessionEvent, SessionTimings};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// How long a camera gets to deliver its first frame
const WARMUP_TIMEOUT: Duration = Duration::from_secs(5);

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = v4l2::enumerate_devices();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for camera in &cameras {
        println!("  [{}] {}", camera.index, camera.name);
        println!("      Device: {}", camera.path);
    }

    Ok(())
}

/// Where a headless session takes its frames from
pub enum SessionInput {
    Camera(usize),
    Frames(Vec<PathBuf>),
}

/// Run one session without a UI and export the strip
pub async fn run_session(
    config: &Config,
    input: SessionInput,
    caption: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    match input {
        SessionInput::Frames(paths) => {
            let source = FileSource::open(&paths)?;
            println!("Using {} image(s) as frames", source.len());
            session_with(config, &source, caption, output).await
        }
        SessionInput::Camera(index) => {
            let camera =
                V4l2Source::open_async(index, config.capture_width, config.capture_height)
                    .await?;
            println!("Using camera: {}", camera.device().name);

            let result = match wait_for_first_frame(&camera).await {
                Ok(()) => session_with(config, &camera, caption, output).await,
                Err(e) => Err(e),
            };
            tokio::task::spawn_blocking(move || camera.stop()).await?;
            result
        }
    }
}

async fn session_with(
    config: &Config,
    source: &dyn FrameSource,
    caption: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let flash = if config.hardware_flash {
        FlashFeedback::detect()
    } else {
        FlashFeedback::screen_only()
    };
    let sequencer = Sequencer::new(SessionTimings::default(), flash);

    let mut booth = Booth::new(StripComposer::from_config(config));
    if let Some(caption) = caption {
        booth.set_caption(caption);
    }

    let exporter = match output {
        Some(dir) => Exporter::save_or_open(dir),
        None => Exporter::from_config(config),
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });

    let date = chrono::Local::now().date_naive();
    let result = booth
        .run_session(&sequencer, source, Some(&tx), date)
        .await
        .map(|strip| strip.dimensions());
    drop(tx);
    let _ = printer.await;

    let (width, height) = result?;
    println!("Strip composed: {}x{}", width, height);

    match booth.export(&exporter).await? {
        Some(DeliveryOutcome::Saved(path)) => println!("Strip saved: {}", path.display()),
        Some(DeliveryOutcome::OpenedForManualSave(path)) => {
            println!("Strip opened for saving: {}", path.display())
        }
        None => println!("Nothing to export"),
    }

    Ok(())
}

async fn wait_for_first_frame(camera: &V4l2Source) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    loop {
        match camera.latest_frame() {
            Ok(_) => return Ok(()),
            Err(e) if start.elapsed() >= WARMUP_TIMEOUT => {
                return Err(format!("Camera did not deliver a frame: {}", e).into());
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(16)).await,
        }
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Started => println!("Session started"),
        SessionEvent::Countdown(n) => {
            print!("{}... ", n);
            let _ = std::io::stdout().flush();
        }
        SessionEvent::CountdownCleared => {}
        SessionEvent::Captured { index } => println!("Photo {} captured", index + 1),
        SessionEvent::Flash { .. } | SessionEvent::FlashEnded => {}
        SessionEvent::Completed => println!("Session complete"),
    }
}
