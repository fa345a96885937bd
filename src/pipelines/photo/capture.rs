// SPDX-License-Identifier: GPL-3.0-only

//! Still capture from a frame source
//!
//! Takes the current frame, stretches it onto an 800x600 canvas, mirrors it
//! so the still matches what the subject saw in the preview, and bakes in the
//! vintage filter.

use super::StillImage;
use super::processing::apply_vintage_filter;
use crate::backends::camera::{CameraFrame, FrameSource};
use crate::constants::{PHOTO_HEIGHT, PHOTO_WIDTH};
use crate::errors::SessionError;
use image::imageops::{self, FilterType};
use tracing::{debug, info};

/// Photo capture handler
pub struct PhotoCapture;

impl PhotoCapture {
    /// Grab a frame from the source and turn it into a still
    ///
    /// Source errors (camera not ready, disconnected) are returned as
    /// [`SessionError::CaptureFailed`]; there is no retry.
    pub fn capture(source: &dyn FrameSource) -> Result<StillImage, SessionError> {
        info!(source = %source.description(), "Capturing still");

        let frame = source.grab()?;
        Self::capture_from_frame(&frame)
    }

    /// Turn an already grabbed frame into a still
    pub fn capture_from_frame(frame: &CameraFrame) -> Result<StillImage, SessionError> {
        debug!(
            width = frame.width,
            height = frame.height,
            "Processing frame into still"
        );

        let mut image = frame.to_rgba_image()?;

        // Stretch to fill, like drawing the frame into a fixed-size canvas
        if image.dimensions() != (PHOTO_WIDTH, PHOTO_HEIGHT) {
            image = imageops::resize(&image, PHOTO_WIDTH, PHOTO_HEIGHT, FilterType::Triangle);
        }

        imageops::flip_horizontal_in_place(&mut image);
        apply_vintage_filter(&mut image);

        StillImage::from_processed(image).ok_or_else(|| {
            SessionError::CaptureFailed("processed still has the wrong size".to_string())
        })
    }
}
