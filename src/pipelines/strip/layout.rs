// SPDX-License-Identifier: GPL-3.0-only

//! Fixed geometry of the printed strip
//!
//! ```text
//!  ┌────────────── 840 ──────────────┐
//!  │            title (y=80)         │  100
//!  │  ┌───────────────────────────┐  │
//!  │  │        photo 1 800x600    │  │
//!  │  └───────────────────────────┘  │  20
//!  │              ...                │
//!  │  ┌───────────────────────────┐  │
//!  │  │        photo 4            │  │
//!  │  └───────────────────────────┘  │
//!  │        caption (h-80)           │  140
//!  │          date (h-45)            │
//!  └─────────────────────────────────┘
//! ```

use crate::constants::strip::*;
use crate::constants::{PHOTO_COUNT, PHOTO_HEIGHT, PHOTO_WIDTH};

/// Strip size in pixels
pub const fn dimensions() -> (u32, u32) {
    (WIDTH, HEIGHT)
}

/// Top-left corner of photo `index` (0 = top)
pub const fn photo_origin(index: usize) -> (u32, u32) {
    (
        SIDE_MARGIN,
        TOP_MARGIN + index as u32 * (PHOTO_HEIGHT + SPACING),
    )
}

/// Photo slots top to bottom as `(x, y, width, height)`
pub fn photo_slots() -> impl Iterator<Item = (u32, u32, u32, u32)> {
    (0..PHOTO_COUNT).map(|i| {
        let (x, y) = photo_origin(i);
        (x, y, PHOTO_WIDTH, PHOTO_HEIGHT)
    })
}

/// Horizontal center used by all text
pub const fn center_x() -> f32 {
    WIDTH as f32 / 2.0
}

/// Widest the title may be drawn
pub const fn title_max_width() -> f32 {
    (WIDTH - TITLE_PADDING) as f32
}

pub const fn title_baseline() -> f32 {
    TITLE_BASELINE as f32
}

pub const fn caption_baseline() -> f32 {
    (HEIGHT - CAPTION_BASELINE_FROM_BOTTOM) as f32
}

pub const fn date_baseline() -> f32 {
    (HEIGHT - DATE_BASELINE_FROM_BOTTOM) as f32
}
