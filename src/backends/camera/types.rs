// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for frame sources

use image::RgbaImage;
use std::sync::Arc;

/// A single RGBA8 frame from a source
///
/// Pixel data is reference counted so preview and capture can share a frame
/// without copying it.
#[derive(Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows (`width * 4` bytes per row)
    pub data: Arc<[u8]>,
}

impl CameraFrame {
    /// Wrap tightly packed RGBA data, validating its length
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> BackendResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(BackendError::FormatNotSupported(format!(
                "RGBA frame {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
        })
    }

    /// Build a frame from a decoded image
    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: Arc::from(image.into_raw().into_boxed_slice()),
        }
    }

    /// Copy the frame into an owned image buffer
    pub fn to_rgba_image(&self) -> BackendResult<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.to_vec()).ok_or_else(|| {
            BackendError::FormatNotSupported(format!(
                "Frame data does not match {}x{}",
                self.width, self.height
            ))
        })
    }

    /// RGB of the pixel at (x, y), clamped to the frame bounds
    pub fn pixel_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let idx = (y * self.width as usize + x) * 4;
        match self.data.get(idx..idx + 3) {
            Some(px) => (px[0], px[1], px[2]),
            None => (0, 0, 0),
        }
    }
}

impl std::fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// A V4L2 capture device found on the system
#[derive(Debug, Clone)]
pub struct CameraDevice {
    /// Index as in `/dev/videoN`
    pub index: usize,
    /// Card name reported by the driver
    pub name: String,
    pub path: String,
}

/// Pixel layouts the V4L2 source knows how to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Motion JPEG, one JPEG per buffer
    Mjpeg,
    /// Packed YUV 4:2:2 (Y0 U Y1 V)
    Yuyv,
}

impl PixelFormat {
    /// V4L2 fourcc code
    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            PixelFormat::Mjpeg => *b"MJPG",
            PixelFormat::Yuyv => *b"YUYV",
        }
    }

    /// Look up a format by fourcc code
    pub fn from_fourcc(code: [u8; 4]) -> Option<Self> {
        match &code {
            b"MJPG" => Some(PixelFormat::Mjpeg),
            b"YUYV" => Some(PixelFormat::Yuyv),
            _ => None,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PixelFormat::Mjpeg => write!(f, "MJPG"),
            PixelFormat::Yuyv => write!(f, "YUYV"),
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Camera device not found
    DeviceNotFound(String),
    /// Device could not be opened or configured
    InitializationFailed(String),
    /// Format not supported
    FormatNotSupported(String),
    /// The source has not produced a frame yet
    NoFrame(String),
    /// Capture thread stopped
    Disconnected(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::NoFrame(msg) => write!(f, "No frame available: {}", msg),
            BackendError::Disconnected(msg) => write!(f, "Camera disconnected: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}
