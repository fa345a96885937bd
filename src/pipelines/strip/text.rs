// SPDX-License-Identifier: GPL-3.0-only

//! Text on the strip
//!
//! Glyph rasterization comes from `ab_glyph` through `imageproc`. Layout
//! decisions (title fitting, caption truncation) only need widths, so they
//! work against the [`TextMeasure`] trait.

use crate::constants::strip::{TITLE_MAX_SIZE, TITLE_MIN_SIZE};
use crate::constants::{FALLBACK_FONT_PATHS, MAX_CAPTION_CHARS};
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Width of a string at a pixel size
pub trait TextMeasure {
    fn text_width(&self, text: &str, size: f32) -> f32;
}

/// DejaVu Serif, used when neither the configured font nor a system font loads
const BUNDLED_FONT: &[u8] = include_bytes!("../../../resources/fonts/DejaVuSerif.ttf");

/// A loaded font
pub struct Typeface {
    font: FontVec,
    /// File the font came from; `None` for the bundled face
    path: Option<PathBuf>,
}

impl Typeface {
    /// Load a TrueType/OpenType font
    pub fn load(path: &Path) -> Result<Self, String> {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("Failed to read font '{}': {}", path.display(), e))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| format!("Invalid font '{}': {}", path.display(), e))?;

        debug!(path = %path.display(), "Font loaded");
        Ok(Self {
            font,
            path: Some(path.to_path_buf()),
        })
    }

    /// The font compiled into the binary
    pub fn bundled() -> Result<Self, String> {
        let font = FontVec::try_from_vec(BUNDLED_FONT.to_vec())
            .map_err(|e| format!("Invalid bundled font: {}", e))?;
        Ok(Self { font, path: None })
    }

    /// Load the configured font, the first usable system font, or the bundled one
    ///
    /// Only returns `None` if the bundled font itself fails to parse; the
    /// strip is then rendered without text.
    pub fn discover(configured: Option<&Path>) -> Option<Self> {
        if let Some(path) = configured {
            match Self::load(path) {
                Ok(face) => return Some(face),
                Err(e) => warn!(error = %e, "Configured font unusable, trying system fonts"),
            }
        }

        let system = FALLBACK_FONT_PATHS
            .iter()
            .map(Path::new)
            .filter(|p| p.exists())
            .find_map(|p| Self::load(p).ok());
        if let Some(face) = system {
            info!(path = ?face.path, "Using system font");
            return Some(face);
        }

        match Self::bundled() {
            Ok(face) => {
                info!("Using bundled font");
                Some(face)
            }
            Err(e) => {
                warn!(error = %e, "No usable font found; strip text will be skipped");
                None
            }
        }
    }

    /// Distance from the top of a line to its baseline
    pub fn ascent(&self, size: f32) -> f32 {
        self.font.as_scaled(PxScale::from(size)).ascent()
    }

    /// Draw `text` horizontally centered on `center_x` with its baseline at `baseline`
    pub fn draw_centered(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        size: f32,
        center_x: f32,
        baseline: f32,
        color: [u8; 4],
    ) {
        if text.is_empty() {
            return;
        }

        let width = self.text_width(text, size);
        let x = (center_x - width / 2.0).round() as i32;
        let y = (baseline - self.ascent(size)).round() as i32;

        draw_text_mut(
            canvas,
            Rgba(color),
            x,
            y,
            PxScale::from(size),
            &self.font,
            text,
        );
    }
}

impl TextMeasure for Typeface {
    fn text_width(&self, text: &str, size: f32) -> f32 {
        text_size(PxScale::from(size), &self.font, text).0 as f32
    }
}

/// Title text and the size it fits at
#[derive(Debug, Clone, PartialEq)]
pub struct FittedText<'a> {
    pub text: Cow<'a, str>,
    pub size: f32,
    /// True when the text was cut because it overflowed even at the minimum size
    pub clipped: bool,
}

/// Largest size from 48 px downwards (1 px steps) at which `text` fits in `max_width`
///
/// The search stops at the 12 px floor. Text that still overflows there is
/// cut at the last character that fits.
pub fn fit_title<'a>(measure: &dyn TextMeasure, text: &'a str, max_width: f32) -> FittedText<'a> {
    let mut size = TITLE_MAX_SIZE;
    loop {
        if measure.text_width(text, size) <= max_width {
            return FittedText {
                text: Cow::Borrowed(text),
                size,
                clipped: false,
            };
        }
        if size <= TITLE_MIN_SIZE {
            break;
        }
        size = (size - 1.0).max(TITLE_MIN_SIZE);
    }

    let mut end = text.chars().count();
    let clipped = loop {
        end = end.saturating_sub(1);
        let prefix: String = text.chars().take(end).collect();
        if end == 0 || measure.text_width(&prefix, size) <= max_width {
            break prefix;
        }
    };

    warn!(
        title = text,
        kept = clipped.chars().count(),
        "Title too wide even at minimum size, clipping"
    );

    FittedText {
        text: Cow::Owned(clipped),
        size,
        clipped: true,
    }
}

/// Cut a caption to its first 60 characters
pub fn truncate_caption(caption: &str) -> Cow<'_, str> {
    match caption.char_indices().nth(MAX_CAPTION_CHARS) {
        Some((byte_idx, _)) => Cow::Borrowed(&caption[..byte_idx]),
        None => Cow::Borrowed(caption),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;

    /// Every character is half as wide as the font size
    struct Monospace;

    impl TextMeasure for Monospace {
        fn text_width(&self, text: &str, size: f32) -> f32 {
            text.chars().count() as f32 * size * 0.5
        }
    }

    /// Records every size it is asked about
    struct Recording(RefCell<Vec<f32>>);

    impl TextMeasure for Recording {
        fn text_width(&self, text: &str, size: f32) -> f32 {
            self.0.borrow_mut().push(size);
            Monospace.text_width(text, size)
        }
    }

    #[test]
    fn test_short_title_keeps_max_size() {
        let fit = fit_title(&Monospace, "Party", 800.0);
        assert_eq!(fit.size, 48.0);
        assert!(!fit.clipped);
    }

    #[test]
    fn test_long_title_shrinks_until_it_fits() {
        // 40 chars * size * 0.5 <= 800 → size <= 40
        let title = "a".repeat(40);
        let fit = fit_title(&Monospace, &title, 800.0);
        assert_eq!(fit.size, 40.0);
        assert_eq!(fit.text, title.as_str());
    }

    #[test]
    fn test_sizes_tried_decrease_one_pixel_at_a_time() {
        let recording = Recording(RefCell::new(Vec::new()));
        fit_title(&recording, &"a".repeat(40), 800.0);
        let tried = recording.0.into_inner();
        assert_eq!(tried, (40..=48).rev().map(|s| s as f32).collect::<Vec<_>>());
    }

    #[test]
    fn test_huge_title_stops_at_floor_and_clips() {
        // At 12 px each char is 6 px wide; 800 px holds 133 chars
        let title = "b".repeat(500);
        let fit = fit_title(&Monospace, &title, 800.0);
        assert_eq!(fit.size, TITLE_MIN_SIZE);
        assert!(fit.clipped);
        assert_eq!(fit.text.chars().count(), 133);
    }

    #[test]
    fn test_caption_truncation() {
        let exact = "x".repeat(60);
        assert_eq!(truncate_caption(&exact), exact.as_str());

        let long = "y".repeat(75);
        assert_eq!(truncate_caption(&long).chars().count(), 60);

        assert_eq!(truncate_caption(""), "");
    }

    #[test]
    fn test_caption_truncation_respects_char_boundaries() {
        let caption = "é".repeat(70);
        let cut = truncate_caption(&caption);
        assert_eq!(cut.chars().count(), 60);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_bundled_font_loads_and_measures() {
        let face = Typeface::bundled().unwrap();
        assert!(face.path.is_none());
        assert_eq!(face.text_width("", 48.0), 0.0);

        let small = face.text_width("Photo Booth", 24.0);
        let large = face.text_width("Photo Booth", 48.0);
        assert!(small > 0.0 && large > small);
        assert!(face.ascent(48.0) > face.ascent(16.0));
    }

    #[test]
    fn test_discover_survives_missing_configured_font() {
        let face = Typeface::discover(Some(Path::new("/nonexistent/font.ttf")));
        assert!(face.is_some());
    }

    proptest! {
        #[test]
        fn prop_title_size_is_bounded(len in 0usize..400) {
            let title = "m".repeat(len);
            let fit = fit_title(&Monospace, &title, 800.0);
            prop_assert!(fit.size <= TITLE_MAX_SIZE);
            prop_assert!(fit.size >= TITLE_MIN_SIZE);
            prop_assert!(Monospace.text_width(&fit.text, fit.size) <= 800.0);
        }

        #[test]
        fn prop_caption_is_prefix_of_input(caption in ".{0,120}") {
            let cut = truncate_caption(&caption);
            prop_assert!(caption.starts_with(cut.as_ref()));
            prop_assert_eq!(cut.chars().count(), caption.chars().count().min(MAX_CAPTION_CHARS));
        }
    }
}
