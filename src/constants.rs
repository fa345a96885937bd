// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants
//!
//! The strip geometry, colors and session timing are fixed; only the title,
//! fonts, texture and output location are configurable.

use std::time::Duration;

/// Number of photos in one session (and on one strip)
pub const PHOTO_COUNT: usize = 4;

/// Width of a captured still in pixels
pub const PHOTO_WIDTH: u32 = 800;

/// Height of a captured still in pixels
pub const PHOTO_HEIGHT: u32 = 600;

/// Maximum caption length in characters; longer captions are truncated when drawn
pub const MAX_CAPTION_CHARS: usize = 60;

/// Default file name for exported strips
pub const EXPORT_FILE_NAME: &str = "photo-strip.png";

/// Default folder name (under the user's pictures directory) for exported strips
pub const DEFAULT_SAVE_FOLDER: &str = "Photobooth";

/// Default title printed at the top of the strip
pub const DEFAULT_TITLE: &str = "Photo Booth";

/// Default strftime pattern for the date printed under the caption
pub const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Vertical strip layout
pub mod strip {
    use super::{PHOTO_COUNT, PHOTO_HEIGHT, PHOTO_WIDTH};

    /// Margin left and right of each photo
    pub const SIDE_MARGIN: u32 = 20;
    /// Space above the first photo (holds the title)
    pub const TOP_MARGIN: u32 = 100;
    /// Gap between consecutive photos
    pub const SPACING: u32 = 20;
    /// Space below the last photo (holds caption and date)
    pub const BOTTOM_MARGIN: u32 = 140;

    /// Total strip width: 840
    pub const WIDTH: u32 = PHOTO_WIDTH + SIDE_MARGIN * 2;
    /// Total strip height: 2700
    pub const HEIGHT: u32 = TOP_MARGIN
        + PHOTO_COUNT as u32 * PHOTO_HEIGHT
        + (PHOTO_COUNT as u32 - 1) * SPACING
        + BOTTOM_MARGIN;

    /// Title baseline, measured from the top edge
    pub const TITLE_BASELINE: u32 = TOP_MARGIN / 2 + 30;
    /// Horizontal padding the title must leave free (split across both sides)
    pub const TITLE_PADDING: u32 = 40;
    /// Largest title size; the fitting loop starts here
    pub const TITLE_MAX_SIZE: f32 = 48.0;
    /// Smallest title size; titles that still overflow are clipped
    pub const TITLE_MIN_SIZE: f32 = 12.0;

    /// Caption size and baseline offset from the bottom edge
    pub const CAPTION_SIZE: f32 = 22.0;
    pub const CAPTION_BASELINE_FROM_BOTTOM: u32 = 80;

    /// Date size and baseline offset from the bottom edge
    pub const DATE_SIZE: f32 = 16.0;
    pub const DATE_BASELINE_FROM_BOTTOM: u32 = 45;

    /// Opacity of the multiply-blended texture overlay
    pub const TEXTURE_OPACITY: f32 = 0.25;
}

/// Strip colors (RGBA)
pub mod colors {
    /// Near-black background (#0a0303)
    pub const BACKGROUND: [u8; 4] = [0x0a, 0x03, 0x03, 0xff];
    /// Off-white text (#f5f0e6)
    pub const TEXT: [u8; 4] = [0xf5, 0xf0, 0xe6, 0xff];
    /// Dark red photo border (#3e0f0f)
    pub const BORDER: [u8; 4] = [0x3e, 0x0f, 0x0f, 0xff];
}

/// Session phase timing
pub mod timing {
    use super::Duration;

    /// Countdown starts at this number
    pub const COUNTDOWN_FROM: u32 = 3;
    /// Interval between countdown ticks
    pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);
    /// Opacity of the flash overlay when it appears
    pub const FLASH_OPACITY: f32 = 0.7;
    /// How long the flash overlay stays at full opacity
    pub const FLASH_HOLD: Duration = Duration::from_millis(100);
    /// Fade-out duration of the flash overlay
    pub const FLASH_FADE: Duration = Duration::from_millis(250);
    /// Number of opacity steps emitted during the fade
    pub const FLASH_FADE_STEPS: u32 = 5;
    /// Pause between shots (not after the last one)
    pub const INTER_SHOT_PAUSE: Duration = Duration::from_millis(800);
}

/// Camera capture defaults
pub mod capture {
    /// Requested capture width from V4L2 devices
    pub const DEFAULT_WIDTH: u32 = 1280;
    /// Requested capture height from V4L2 devices
    pub const DEFAULT_HEIGHT: u32 = 720;
    /// Number of mmap buffers in the V4L2 stream
    pub const STREAM_BUFFERS: u32 = 4;
}

/// Supported still image extensions for file sources and textures
pub mod file_formats {
    /// Image file extensions (lowercase, without dot)
    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif"];

    /// Check if an extension (lowercase) is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext)
    }
}

/// Candidate system font files, tried in order when no font is configured
pub const FALLBACK_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/dejavu/DejaVuSerif.ttf",
    "/usr/share/fonts/TTF/DejaVuSerif.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSerif-Regular.ttf",
    "/usr/share/fonts/noto/NotoSerif-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSerif-Regular.ttf",
    "/Library/Fonts/Georgia.ttf",
    "/System/Library/Fonts/Supplemental/Georgia.ttf",
];
