// SPDX-License-Identifier: GPL-3.0-only

//! Camera frame sources
//!
//! A [`FrameSource`] exposes the current frame of a live feed. The terminal
//! preview peeks at it continuously with [`FrameSource::latest_frame`]; the
//! session takes stills with [`FrameSource::grab`].

pub mod file_source;
pub mod format_converters;
pub mod types;
pub mod v4l2;

pub use file_source::FileSource;
pub use types::*;
pub use v4l2::V4l2Source;

/// A live source of RGBA frames
///
/// Implementations must be cheap to query: `latest_frame` is called once per
/// preview redraw.
pub trait FrameSource: Send + Sync {
    /// Human-readable description for logs and status lines
    fn description(&self) -> String;

    /// The most recent frame, without side effects
    ///
    /// Fails with [`BackendError::NoFrame`] while the source is still warming up.
    fn latest_frame(&self) -> BackendResult<CameraFrame>;

    /// The frame to keep as a still
    ///
    /// Live cameras return the latest frame. Sources that replay a fixed set
    /// of images advance to the next image here.
    fn grab(&self) -> BackendResult<CameraFrame> {
        self.latest_frame()
    }
}
