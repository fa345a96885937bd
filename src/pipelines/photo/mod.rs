// SPDX-License-Identifier: GPL-3.0-only

//! Photo capture pipeline
//!
//! ```text
//! FrameSource → Capture (resize + mirror) → Vintage filter → StillImage
//! ```
//!
//! A [`StillImage`] is always 800x600 and already filtered; once built it is
//! never mutated again. Four of them fill a [`PhotoCollection`].

pub mod capture;
pub mod encoding;
pub mod processing;

pub use capture::PhotoCapture;
pub use encoding::encode_png;
pub use processing::apply_vintage_filter;

use crate::constants::{PHOTO_COUNT, PHOTO_HEIGHT, PHOTO_WIDTH};
use crate::errors::SessionError;
use image::RgbaImage;

/// One captured, filtered camera frame
#[derive(Debug, Clone, PartialEq)]
pub struct StillImage {
    image: RgbaImage,
}

impl StillImage {
    /// Adopt an already processed 800x600 image
    ///
    /// Returns `None` for any other size.
    pub fn from_processed(image: RgbaImage) -> Option<Self> {
        if image.dimensions() == (PHOTO_WIDTH, PHOTO_HEIGHT) {
            Some(Self { image })
        } else {
            None
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Ordered stills of one session, in capture order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoCollection {
    stills: Vec<StillImage>,
}

impl PhotoCollection {
    pub fn new() -> Self {
        Self {
            stills: Vec::with_capacity(PHOTO_COUNT),
        }
    }

    /// Append the next still
    pub fn push(&mut self, still: StillImage) -> Result<(), SessionError> {
        if self.stills.len() >= PHOTO_COUNT {
            return Err(SessionError::CollectionFull);
        }
        self.stills.push(still);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.stills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stills.is_empty()
    }

    /// True once all four stills are present
    pub fn is_complete(&self) -> bool {
        self.stills.len() == PHOTO_COUNT
    }

    pub fn clear(&mut self) {
        self.stills.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &StillImage> {
        self.stills.iter()
    }
}
