// SPDX-License-Identifier: GPL-3.0-only

//! Strip export
//!
//! The finished strip is encoded as PNG and handed to a [`Delivery`]. The
//! default chain saves straight into the output folder and, if that fails,
//! writes a staging copy and opens it in the desktop's image viewer so the
//! user can save it by hand.

use crate::config::Config;
use crate::constants::EXPORT_FILE_NAME;
use crate::errors::ExportError;
use crate::pipelines::photo::encode_png;
use image::RgbaImage;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where an exported strip ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Written to its final location
    Saved(PathBuf),
    /// Written to a staging file and opened for the user to save
    OpenedForManualSave(PathBuf),
}

impl DeliveryOutcome {
    pub fn path(&self) -> &Path {
        match self {
            DeliveryOutcome::Saved(path) | DeliveryOutcome::OpenedForManualSave(path) => path,
        }
    }
}

/// A way of getting the encoded strip to the user
pub trait Delivery: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    fn deliver(&self, png: &[u8], file_name: &str) -> Result<DeliveryOutcome, ExportError>;
}

/// Save into a folder without overwriting earlier strips
#[derive(Debug, Clone)]
pub struct DirectSave {
    dir: PathBuf,
}

impl DirectSave {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// `name.ext` for attempt 0, then `name (1).ext`, `name (2).ext`, ...
pub fn numbered_file_name(file_name: &str, attempt: u32) -> String {
    if attempt == 0 {
        return file_name.to_string();
    }

    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{} ({}).{}", stem, attempt, ext),
        None => format!("{} ({})", stem, attempt),
    }
}

impl Delivery for DirectSave {
    fn name(&self) -> &'static str {
        "direct save"
    }

    fn deliver(&self, png: &[u8], file_name: &str) -> Result<DeliveryOutcome, ExportError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            ExportError::DeliveryFailed(format!(
                "Cannot create '{}': {}",
                self.dir.display(),
                e
            ))
        })?;

        // create_new keeps an existing strip from being replaced even if
        // another process writes the same name concurrently
        for attempt in 0..1000 {
            let path = self.dir.join(numbered_file_name(file_name, attempt));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(png)?;
                    file.sync_all()?;
                    info!(path = %path.display(), bytes = png.len(), "Strip saved");
                    return Ok(DeliveryOutcome::Saved(path));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(ExportError::DeliveryFailed(format!(
            "No free file name for '{}' in '{}'",
            file_name,
            self.dir.display()
        )))
    }
}

type Opener = Box<dyn Fn(&Path) -> io::Result<()> + Send + Sync>;

/// Write a staging copy and open it in the default viewer
pub struct OpenForManualSave {
    staging_dir: PathBuf,
    opener: Opener,
}

impl OpenForManualSave {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self::with_opener(staging_dir, |path| open::that_detached(path))
    }

    /// Use `opener` instead of the desktop's default application
    pub fn with_opener(
        staging_dir: impl Into<PathBuf>,
        opener: impl Fn(&Path) -> io::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            opener: Box::new(opener),
        }
    }

    /// Staging directory under the system temp dir
    pub fn default_staging_dir() -> PathBuf {
        std::env::temp_dir().join("photobooth")
    }
}

impl Delivery for OpenForManualSave {
    fn name(&self) -> &'static str {
        "open for manual save"
    }

    fn deliver(&self, png: &[u8], file_name: &str) -> Result<DeliveryOutcome, ExportError> {
        std::fs::create_dir_all(&self.staging_dir)?;
        let path = self.staging_dir.join(file_name);
        std::fs::write(&path, png)?;
        debug!(path = %path.display(), "Staging copy written");

        (self.opener)(&path).map_err(|e| {
            ExportError::DeliveryFailed(format!("Cannot open '{}': {}", path.display(), e))
        })?;

        info!(path = %path.display(), "Strip opened for manual save");
        Ok(DeliveryOutcome::OpenedForManualSave(path))
    }
}

/// Try `primary`, fall back to `fallback` when it fails
pub struct FallbackDelivery {
    primary: Box<dyn Delivery>,
    fallback: Box<dyn Delivery>,
}

impl FallbackDelivery {
    pub fn new(primary: impl Delivery + 'static, fallback: impl Delivery + 'static) -> Self {
        Self {
            primary: Box::new(primary),
            fallback: Box::new(fallback),
        }
    }
}

impl Delivery for FallbackDelivery {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    fn deliver(&self, png: &[u8], file_name: &str) -> Result<DeliveryOutcome, ExportError> {
        match self.primary.deliver(png, file_name) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %e,
                    "Delivery failed, trying fallback"
                );
                self.fallback.deliver(png, file_name)
            }
        }
    }
}

/// Encodes strips and delivers them
#[derive(Clone)]
pub struct Exporter {
    delivery: Arc<dyn Delivery>,
    file_name: String,
}

impl Exporter {
    pub fn new(delivery: impl Delivery + 'static) -> Self {
        Self {
            delivery: Arc::new(delivery),
            file_name: EXPORT_FILE_NAME.to_string(),
        }
    }

    /// Save to `dir`, or open for manual save if that fails
    pub fn save_or_open(dir: impl Into<PathBuf>) -> Self {
        Self::new(FallbackDelivery::new(
            DirectSave::new(dir),
            OpenForManualSave::new(OpenForManualSave::default_staging_dir()),
        ))
    }

    /// The default chain targeting the configured output folder
    pub fn from_config(config: &Config) -> Self {
        Self::save_or_open(config.resolved_output_dir())
    }

    /// Encode `image` as PNG and deliver it
    pub async fn export(&self, image: RgbaImage) -> Result<DeliveryOutcome, ExportError> {
        let png = encode_png(image).await?;

        let delivery = Arc::clone(&self.delivery);
        let file_name = self.file_name.clone();
        tokio::task::spawn_blocking(move || delivery.deliver(&png, &file_name))
            .await
            .map_err(|e| ExportError::DeliveryFailed(format!("Delivery task error: {}", e)))?
    }
}
