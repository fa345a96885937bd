// SPDX-License-Identifier: GPL-3.0-only

//! Paper texture overlay
//!
//! The texture is stretched over the whole strip and multiplied in at 25%
//! opacity, which darkens and ages the print without hiding it. It comes
//! either from an image file or from a procedural film-grain generator.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Where the overlay texture comes from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureSource {
    /// No overlay
    None,
    /// Film grain and a soft vignette generated in code
    #[default]
    Procedural,
    /// An image file, stretched to the strip size
    File(PathBuf),
}

/// A texture already scaled to the strip
#[derive(Debug, Clone)]
pub struct Texture {
    image: RgbaImage,
}

impl Texture {
    /// Load or generate the texture for a canvas of `width` x `height`
    ///
    /// Decoding and scaling run on the blocking pool. A file that cannot be
    /// loaded is logged and treated as no texture.
    pub async fn load(source: &TextureSource, width: u32, height: u32) -> Option<Self> {
        let source = source.clone();
        let loaded = tokio::task::spawn_blocking(move || match source {
            TextureSource::None => None,
            TextureSource::Procedural => Some(Self::procedural(width, height)),
            TextureSource::File(path) => match image::open(&path) {
                Ok(img) => {
                    info!(path = %path.display(), "Texture loaded");
                    Some(Self::from_image(img.to_rgba8(), width, height))
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to load texture, skipping overlay"
                    );
                    None
                }
            },
        })
        .await;

        match loaded {
            Ok(texture) => texture,
            Err(e) => {
                warn!(error = %e, "Texture task failed, skipping overlay");
                None
            }
        }
    }

    /// Wrap an image, stretching it to `width` x `height` if needed
    pub fn from_image(image: RgbaImage, width: u32, height: u32) -> Self {
        let image = if image.dimensions() == (width, height) {
            image
        } else {
            imageops::resize(&image, width, height, FilterType::Triangle)
        };
        Self { image }
    }

    /// Deterministic warm paper with grain and darker edges
    pub fn procedural(width: u32, height: u32) -> Self {
        debug!(width, height, "Generating procedural texture");

        // Pseudo-random noise, stable per pixel
        let hash = |x: u32, y: u32| -> f32 {
            let p = (x as f32 * 127.1 + y as f32 * 311.7) * 0.01;
            (p.sin() * 43758.5453).rem_euclid(1.0)
        };

        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;

        let image = RgbaImage::from_fn(width, height, |x, y| {
            let grain = (hash(x, y) - 0.5) * 40.0;

            let dx = (x as f32 - cx) / cx.max(1.0);
            let dy = (y as f32 - cy) / cy.max(1.0);
            let vignette = (dx * dx + dy * dy).min(2.0) * 30.0;

            let shade = |base: f32| (base + grain - vignette).clamp(0.0, 255.0) as u8;
            Rgba([shade(240.0), shade(228.0), shade(206.0), 255])
        });

        Self { image }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Multiply the texture into `canvas` at `opacity`
    ///
    /// Texture and canvas must be the same size; extra pixels on either side
    /// are ignored.
    pub fn apply_multiply(&self, canvas: &mut RgbaImage, opacity: f32) {
        let (w, h) = self.image.dimensions();
        let (cw, ch) = canvas.dimensions();
        if (w, h) != (cw, ch) {
            warn!(
                texture = ?(w, h),
                canvas = ?(cw, ch),
                "Texture size mismatch, blending the overlapping area"
            );
        }

        for y in 0..h.min(ch) {
            for x in 0..w.min(cw) {
                let src = self.image.get_pixel(x, y);
                let alpha = opacity * src[3] as f32 / 255.0;
                let dst = canvas.get_pixel_mut(x, y);
                for c in 0..3 {
                    dst[c] = multiply_blend(dst[c], src[c], alpha);
                }
            }
        }
    }
}

/// Multiply blend of one channel over an opaque backdrop
///
/// `out = dst * (1 - a) + (dst * src / 255) * a`
pub fn multiply_blend(dst: u8, src: u8, alpha: f32) -> u8 {
    let dst = dst as f32;
    let multiplied = dst * src as f32 / 255.0;
    (dst * (1.0 - alpha) + multiplied * alpha)
        .round()
        .clamp(0.0, 255.0) as u8
}
