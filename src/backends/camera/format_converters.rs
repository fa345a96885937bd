// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for V4L2 buffers
//!
//! Everything downstream works on RGBA8, so each supported camera format is
//! converted here right after dequeuing.

use super::types::{BackendError, BackendResult, PixelFormat};

/// Convert a raw buffer of the given format to tightly packed RGBA
pub fn to_rgba(
    format: PixelFormat,
    data: &[u8],
    width: u32,
    height: u32,
) -> BackendResult<(Vec<u8>, u32, u32)> {
    match format {
        PixelFormat::Mjpeg => mjpeg_to_rgba(data),
        PixelFormat::Yuyv => {
            let needed = width as usize * height as usize * 2;
            if data.len() < needed {
                return Err(BackendError::FormatNotSupported(format!(
                    "YUYV buffer too small: expected {}, got {}",
                    needed,
                    data.len()
                )));
            }
            Ok((yuyv_to_rgba(&data[..needed], width, height), width, height))
        }
    }
}

/// Decode one MJPEG buffer
///
/// Webcams report their own size inside the JPEG, which wins over the
/// negotiated format.
pub fn mjpeg_to_rgba(data: &[u8]) -> BackendResult<(Vec<u8>, u32, u32)> {
    let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| BackendError::FormatNotSupported(format!("MJPEG decode failed: {}", e)))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((rgba.into_raw(), width, height))
}

/// Convert YUYV (YUV 4:2:2) to RGBA
///
/// YUYV: Y0 U Y1 V - each 4-byte group encodes 2 pixels (BT.601).
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut rgba = Vec::with_capacity(pixel_count * 4);

    for chunk in data.chunks_exact(4) {
        let y0 = chunk[0];
        let u = chunk[1];
        let y1 = chunk[2];
        let v = chunk[3];

        for luma in [y0, y1] {
            let (r, g, b) = yuv_to_rgb(luma, u, v);
            rgba.extend_from_slice(&[r, g, b, 255]);
        }

        if rgba.len() >= pixel_count * 4 {
            break;
        }
    }

    rgba.truncate(pixel_count * 4);
    rgba
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_chroma_is_gray() {
        assert_eq!(yuv_to_rgb(100, 128, 128), (100, 100, 100));
    }

    #[test]
    fn test_yuyv_pair_expands_to_two_pixels() {
        let rgba = yuyv_to_rgba(&[10, 128, 200, 128], 2, 1);
        assert_eq!(rgba, vec![10, 10, 10, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn test_short_yuyv_buffer_is_rejected() {
        let err = to_rgba(PixelFormat::Yuyv, &[0; 4], 4, 4).unwrap_err();
        assert!(matches!(err, BackendError::FormatNotSupported(_)));
    }

    #[test]
    fn test_mjpeg_garbage_is_rejected() {
        assert!(mjpeg_to_rgba(&[0xde, 0xad, 0xbe, 0xef]).is_err());
    }
}
