// SPDX-License-Identifier: GPL-3.0-only

//! PNG encoding for finished strips
//!
//! Encoding a 840x2700 RGBA image takes long enough to matter on small
//! machines, so it runs on the blocking pool.

use crate::errors::ExportError;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use tracing::{debug, info};

/// Encode an image as PNG bytes on a background task
pub async fn encode_png(image: RgbaImage) -> Result<Vec<u8>, ExportError> {
    info!(
        width = image.width(),
        height = image.height(),
        "Starting PNG encoding"
    );

    tokio::task::spawn_blocking(move || encode_png_blocking(&image))
        .await
        .map_err(|e| ExportError::EncodingFailed(format!("Encoding task error: {}", e)))?
}

/// Encode an image as PNG bytes on the current thread
pub fn encode_png_blocking(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();

    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| ExportError::EncodingFailed(format!("PNG encoding failed: {}", e)))?;

    debug!(size = buffer.len(), "Encoding complete");
    Ok(buffer)
}
