// SPDX-License-Identifier: GPL-3.0-only

//! Photobooth - four timed shots, one vintage photo strip
//!
//! A session counts down, captures and flashes four times, runs every still
//! through a fixed vintage filter and lays the stills out on a tall print
//! with a title, caption and date. The strip is exported as `photo-strip.png`.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Frame sources (V4L2 cameras, still images)
//! - [`pipelines`]: Still capture and strip composition
//! - [`session`]: Session sequencing and the [`Booth`] controller
//! - [`export`]: PNG export and delivery
//! - [`flash`]: Screen flash and optional flash LEDs
//! - [`config`]: User configuration handling
//! - [`terminal`]: The terminal booth
//!
//! # Example
//!
//! ```ignore
//! let mut booth = Booth::new(StripComposer::from_config(&config));
//! booth.run_session(&Sequencer::default(), &source, None, today).await?;
//! booth.export(&Exporter::from_config(&config)).await?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod export;
pub mod flash;
pub mod pipelines;
pub mod session;
pub mod terminal;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult, ExportError, SessionError};
pub use export::{DeliveryOutcome, Exporter};
pub use session::{Booth, Sequencer, SessionEvent, SessionState};
