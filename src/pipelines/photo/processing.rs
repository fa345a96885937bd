// SPDX-License-Identifier: GPL-3.0-only

//! Vintage filter
//!
//! Grayscale, a contrast stretch around mid-gray, then a light sepia split:
//!
//! ```text
//! v  = 0.299 r + 0.587 g + 0.114 b
//! v' = (v - 128) * 1.4 + 128
//! r' = min(255, v' * 1.02 + 8)
//! g' = min(255, v' * 0.97 + 4)
//! b' = min(255, v' * 0.90)
//! ```
//!
//! Results are stored like a clamped 8-bit raster: clamp to [0, 255] and
//! round half to even. Alpha is left alone.

use image::RgbaImage;

/// Contrast gain applied around mid-gray
const CONTRAST: f64 = 1.4;
const MIDPOINT: f64 = 128.0;

/// Filter every pixel in place
pub fn apply_vintage_filter(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let [r, g, b] = vintage_pixel(pixel[0], pixel[1], pixel[2]);
        pixel[0] = r;
        pixel[1] = g;
        pixel[2] = b;
    }
}

/// Vintage tone for one RGB triple
pub fn vintage_pixel(r: u8, g: u8, b: u8) -> [u8; 3] {
    let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    let v = (luma - MIDPOINT) * CONTRAST + MIDPOINT;

    [
        store_channel((v * 1.02 + 8.0).min(255.0)),
        store_channel((v * 0.97 + 4.0).min(255.0)),
        store_channel((v * 0.90).min(255.0)),
    ]
}

/// Byte conversion of a clamped raster store
fn store_channel(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round_ties_even() as u8
}
