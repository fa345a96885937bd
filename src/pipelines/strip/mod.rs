// SPDX-License-Identifier: GPL-3.0-only

//! Strip composition
//!
//! Renders four stills into one 840x2700 print:
//!
//! 1. Fill the dark background
//! 2. Title, shrunk until it fits
//! 3. Photos with a 1 px border, top to bottom in capture order
//! 4. Caption and date near the bottom edge
//! 5. Multiply the paper texture over everything
//!
//! The texture is loaded (once) before rendering starts, so a finished strip
//! always carries its overlay.

pub mod layout;
pub mod text;
pub mod texture;

pub use text::{FittedText, TextMeasure, Typeface, fit_title, truncate_caption};
pub use texture::{Texture, TextureSource};

use crate::config::Config;
use crate::constants::{DEFAULT_DATE_FORMAT, colors, strip};
use crate::errors::SessionError;
use crate::pipelines::photo::PhotoCollection;
use chrono::NaiveDate;
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::fmt::Write;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// The finished print
#[derive(Debug, Clone)]
pub struct CompositeStrip {
    image: RgbaImage,
    caption: String,
    date: NaiveDate,
}

impl CompositeStrip {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Caption as printed (already truncated)
    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Renders photo collections into strips
pub struct StripComposer {
    title: String,
    date_format: String,
    typeface: Option<Arc<Typeface>>,
    texture_source: TextureSource,
    texture: OnceCell<Option<Arc<Texture>>>,
}

impl StripComposer {
    pub fn new(
        title: impl Into<String>,
        typeface: Option<Typeface>,
        texture_source: TextureSource,
        date_format: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            date_format: date_format.into(),
            typeface: typeface.map(Arc::new),
            texture_source,
            texture: OnceCell::new(),
        }
    }

    /// Composer with the configured title, font, texture and date pattern
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.title.clone(),
            Typeface::discover(config.font_path.as_deref()),
            config.texture.clone(),
            config.date_format.clone(),
        )
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Texture scaled to the strip, loaded on first use
    pub async fn texture(&self) -> Option<Arc<Texture>> {
        self.texture
            .get_or_init(|| async {
                let (w, h) = layout::dimensions();
                Texture::load(&self.texture_source, w, h).await.map(Arc::new)
            })
            .await
            .clone()
    }

    /// Render a complete collection into a strip
    ///
    /// Fails if the collection does not hold exactly four stills.
    pub async fn compose(
        &self,
        photos: &PhotoCollection,
        caption: &str,
        date: NaiveDate,
    ) -> Result<CompositeStrip, SessionError> {
        if !photos.is_complete() {
            return Err(SessionError::IncompleteCollection(photos.len()));
        }

        let texture = self.texture().await;

        let caption = truncate_caption(caption).into_owned();
        let date_text = format_date(date, &self.date_format);
        info!(
            title = %self.title,
            caption = %caption,
            date = %date_text,
            textured = texture.is_some(),
            "Composing strip"
        );

        let photos = photos.clone();
        let title = self.title.clone();
        let typeface = self.typeface.clone();
        let caption_for_render = caption.clone();

        let image = tokio::task::spawn_blocking(move || {
            render(
                &photos,
                &title,
                &caption_for_render,
                &date_text,
                typeface.as_deref(),
                texture.as_deref(),
            )
        })
        .await
        .map_err(|e| SessionError::ComposeFailed(format!("Render task error: {}", e)))?;

        debug!("Strip composed");
        Ok(CompositeStrip {
            image,
            caption,
            date,
        })
    }
}

/// Draw the strip synchronously
///
/// `caption` must already be truncated. Without a typeface (only when even
/// the bundled font fails to parse) all text is skipped; without a texture no
/// overlay is applied.
pub fn render(
    photos: &PhotoCollection,
    title: &str,
    caption: &str,
    date_text: &str,
    typeface: Option<&Typeface>,
    texture: Option<&Texture>,
) -> RgbaImage {
    let (width, height) = layout::dimensions();
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba(colors::BACKGROUND));

    if let Some(face) = typeface {
        let fitted = fit_title(face, title, layout::title_max_width());
        debug!(size = fitted.size, clipped = fitted.clipped, "Title fitted");
        face.draw_centered(
            &mut canvas,
            &fitted.text,
            fitted.size,
            layout::center_x(),
            layout::title_baseline(),
            colors::TEXT,
        );
    }

    for (still, (x, y, w, h)) in photos.iter().zip(layout::photo_slots()) {
        imageops::replace(&mut canvas, still.image(), x as i64, y as i64);
        draw_hollow_rect_mut(
            &mut canvas,
            Rect::at(x as i32, y as i32).of_size(w, h),
            Rgba(colors::BORDER),
        );
    }

    if let Some(face) = typeface {
        face.draw_centered(
            &mut canvas,
            caption,
            strip::CAPTION_SIZE,
            layout::center_x(),
            layout::caption_baseline(),
            colors::TEXT,
        );
        face.draw_centered(
            &mut canvas,
            date_text,
            strip::DATE_SIZE,
            layout::center_x(),
            layout::date_baseline(),
            colors::TEXT,
        );
    }

    if let Some(texture) = texture {
        texture.apply_multiply(&mut canvas, strip::TEXTURE_OPACITY);
    }

    canvas
}

/// Format a date with a strftime pattern, falling back to the default on bad patterns
pub fn format_date(date: NaiveDate, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(pattern)).is_ok() {
        return out;
    }

    warn!(pattern, "Invalid date format, using default");
    date.format(DEFAULT_DATE_FORMAT).to_string()
}
