// SPDX-License-Identifier: GPL-3.0-only

//! Image-file frame source
//!
//! Replays a fixed list of still images as if they were a camera. Each
//! [`FrameSource::grab`] advances to the next image (wrapping around), so four
//! files stand in for four poses in headless runs and demos. The preview
//! keeps showing whatever was grabbed last.

use super::FrameSource;
use super::types::{BackendError, BackendResult, CameraFrame};
use crate::constants::file_formats;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

/// Frame source backed by decoded image files
pub struct FileSource {
    paths: Vec<PathBuf>,
    frames: Vec<CameraFrame>,
    /// Index the next grab returns
    cursor: AtomicUsize,
    /// Index of the frame grabbed last
    shown: AtomicUsize,
}

impl FileSource {
    /// Decode every file up front
    ///
    /// Fails on the first file that is missing, has an unsupported extension,
    /// or does not decode.
    pub fn open(paths: &[PathBuf]) -> BackendResult<Self> {
        if paths.is_empty() {
            return Err(BackendError::DeviceNotFound(
                "no image files given".to_string(),
            ));
        }

        let frames = paths
            .iter()
            .map(|path| load_image_as_frame(path))
            .collect::<BackendResult<Vec<_>>>()?;

        Ok(Self {
            paths: paths.to_vec(),
            frames,
            cursor: AtomicUsize::new(0),
            shown: AtomicUsize::new(0),
        })
    }

    /// Wrap already decoded frames
    pub fn from_frames(frames: Vec<CameraFrame>) -> BackendResult<Self> {
        if frames.is_empty() {
            return Err(BackendError::NoFrame("no frames given".to_string()));
        }
        Ok(Self {
            paths: Vec::new(),
            frames,
            cursor: AtomicUsize::new(0),
            shown: AtomicUsize::new(0),
        })
    }

    /// Number of distinct frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for FileSource {
    fn description(&self) -> String {
        match self.paths.first() {
            Some(first) if self.paths.len() == 1 => format!("image {}", first.display()),
            Some(first) => format!(
                "{} images starting at {}",
                self.paths.len(),
                first.display()
            ),
            None => format!("{} in-memory frames", self.frames.len()),
        }
    }

    fn latest_frame(&self) -> BackendResult<CameraFrame> {
        let idx = self.shown.load(Ordering::SeqCst);
        Ok(self.frames[idx].clone())
    }

    fn grab(&self) -> BackendResult<CameraFrame> {
        let idx = self.cursor.fetch_add(1, Ordering::SeqCst) % self.frames.len();
        self.shown.store(idx, Ordering::SeqCst);
        Ok(self.frames[idx].clone())
    }
}

/// Load an image file as an RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if !file_formats::is_image_extension(&extension) {
        return Err(BackendError::FormatNotSupported(format!(
            "Unsupported file format: {}",
            path.display()
        )));
    }

    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::Other(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let frame = CameraFrame::from_image(img.to_rgba8());
    info!(
        width = frame.width,
        height = frame.height,
        "Image loaded successfully"
    );
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(value: u8) -> CameraFrame {
        CameraFrame::from_image(RgbaImage::from_pixel(4, 3, Rgba([value, value, value, 255])))
    }

    #[test]
    fn test_grab_cycles_through_frames() {
        let source = FileSource::from_frames(vec![solid(1), solid(2)]).unwrap();
        let grabbed: Vec<u8> = (0..5).map(|_| source.grab().unwrap().data[0]).collect();
        assert_eq!(grabbed, vec![1, 2, 1, 2, 1]);
    }

    #[test]
    fn test_latest_frame_does_not_advance() {
        let source = FileSource::from_frames(vec![solid(1), solid(2)]).unwrap();
        assert_eq!(source.latest_frame().unwrap().data[0], 1);
        assert_eq!(source.latest_frame().unwrap().data[0], 1);
        assert_eq!(source.grab().unwrap().data[0], 1);
    }

    #[test]
    fn test_latest_frame_shows_last_grab() {
        let source = FileSource::from_frames(vec![solid(1), solid(2), solid(3)]).unwrap();
        for _ in 0..4 {
            let grabbed = source.grab().unwrap();
            assert_eq!(source.latest_frame().unwrap().data[0], grabbed.data[0]);
        }
        // Fourth grab wrapped to the first frame
        assert_eq!(source.latest_frame().unwrap().data[0], 1);
    }

    #[test]
    fn test_open_rejects_unknown_extension() {
        let err = FileSource::open(&[PathBuf::from("/tmp/notes.txt")]).err().unwrap();
        assert!(matches!(err, BackendError::FormatNotSupported(_)));
    }

    #[test]
    fn test_open_rejects_empty_list() {
        assert!(FileSource::open(&[]).is_err());
    }

    #[test]
    fn test_open_decodes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pose.png");
        RgbaImage::from_pixel(6, 4, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let source = FileSource::open(&[path]).unwrap();
        let frame = source.grab().unwrap();
        assert_eq!((frame.width, frame.height), (6, 4));
        assert_eq!(frame.pixel_rgb(0, 0), (10, 20, 30));
    }
}
