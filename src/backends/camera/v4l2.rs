// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 webcam capture
//!
//! Opens `/dev/videoN` with the `v4l` crate, negotiates MJPG (or YUYV when
//! the camera has no compressed mode) and runs a capture thread that keeps
//! only the most recent decoded frame. The booth never needs a frame queue:
//! preview and capture both want "now".

use super::FrameSource;
use super::format_converters;
use super::types::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// How long `open` waits for the device to be configured by the capture thread
const OPEN_TIMEOUT: Duration = Duration::from_secs(5);

/// List V4L2 capture devices
pub fn enumerate_devices() -> Vec<CameraDevice> {
    let mut devices: Vec<CameraDevice> = v4l::context::enum_devices()
        .into_iter()
        .map(|node| CameraDevice {
            index: node.index(),
            name: node
                .name()
                .unwrap_or_else(|| format!("Video device {}", node.index())),
            path: node.path().display().to_string(),
        })
        .collect();

    devices.sort_by_key(|d| d.index);
    devices
}

/// Live V4L2 camera
pub struct V4l2Source {
    device: CameraDevice,
    format: PixelFormat,
    latest: Arc<Mutex<Option<CameraFrame>>>,
    running: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl V4l2Source {
    /// Open a camera and start streaming
    ///
    /// Fails if the device cannot be opened or speaks neither MJPG nor YUYV.
    /// Frames become available shortly after this returns.
    pub fn open(index: usize, width: u32, height: u32) -> BackendResult<Self> {
        let device = enumerate_devices()
            .into_iter()
            .find(|d| d.index == index)
            .ok_or_else(|| BackendError::DeviceNotFound(format!("/dev/video{}", index)))?;

        info!(
            device = %device.name,
            path = %device.path,
            width,
            height,
            "Opening V4L2 camera"
        );

        let latest = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));
        let alive = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread_handle = {
            let latest = latest.clone();
            let running = running.clone();
            let alive = alive.clone();
            let path = device.path.clone();
            std::thread::Builder::new()
                .name("v4l2-capture".into())
                .spawn(move || {
                    if let Err(e) = capture_loop(&path, width, height, latest, running, ready_tx)
                    {
                        error!(error = %e, "V4L2 capture loop failed");
                    }
                    alive.store(false, Ordering::SeqCst);
                })
                .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
        };

        let format = match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(format)) => format,
            Ok(Err(e)) => {
                let _ = thread_handle.join();
                return Err(e);
            }
            Err(_) => {
                running.store(false, Ordering::SeqCst);
                return Err(BackendError::InitializationFailed(format!(
                    "Timed out configuring {}",
                    device.path
                )));
            }
        };

        info!(format = %format, "V4L2 stream started");

        Ok(Self {
            device,
            format,
            latest,
            running,
            alive,
            thread_handle: Some(thread_handle),
        })
    }

    /// [`open`](Self::open) on the blocking pool
    ///
    /// Opening waits for the capture thread to negotiate a format, which can
    /// take seconds; async callers use this so the runtime keeps running.
    pub async fn open_async(index: usize, width: u32, height: u32) -> BackendResult<Self> {
        tokio::task::spawn_blocking(move || Self::open(index, width, height))
            .await
            .map_err(|e| BackendError::InitializationFailed(format!("Open task failed: {}", e)))?
    }

    /// Device this source streams from
    pub fn device(&self) -> &CameraDevice {
        &self.device
    }

    /// Stop the capture thread and wait for it
    pub fn stop(mut self) {
        info!("Stopping V4L2 camera");
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            match handle.join() {
                Ok(_) => info!("Capture thread stopped"),
                Err(_) => warn!("Capture thread panicked"),
            }
        }
    }
}

impl Drop for V4l2Source {
    fn drop(&mut self) {
        // The thread exits after its current dequeue
        self.running.store(false, Ordering::SeqCst);
    }
}

impl FrameSource for V4l2Source {
    fn description(&self) -> String {
        format!("{} ({}, {})", self.device.name, self.device.path, self.format)
    }

    fn latest_frame(&self) -> BackendResult<CameraFrame> {
        let slot = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(frame) => Ok(frame.clone()),
            None if !self.alive.load(Ordering::SeqCst) => {
                Err(BackendError::Disconnected(self.device.path.clone()))
            }
            None => Err(BackendError::NoFrame("camera is still warming up".into())),
        }
    }
}

/// Negotiate a format: MJPG first, then YUYV
fn negotiate_format(dev: &Device, width: u32, height: u32) -> BackendResult<(PixelFormat, Format)> {
    for candidate in [PixelFormat::Mjpeg, PixelFormat::Yuyv] {
        let requested = Format::new(width, height, FourCC::new(&candidate.fourcc()));
        match dev.set_format(&requested) {
            Ok(actual) => {
                if PixelFormat::from_fourcc(actual.fourcc.repr) == Some(candidate) {
                    debug!(
                        width = actual.width,
                        height = actual.height,
                        fourcc = %candidate,
                        "Negotiated V4L2 format"
                    );
                    return Ok((candidate, actual));
                }
                debug!(requested = %candidate, got = ?actual.fourcc, "Device substituted format");
            }
            Err(e) => {
                warn!(format = %candidate, error = %e, "Could not set format");
            }
        }
    }

    Err(BackendError::FormatNotSupported(
        "device offers neither MJPG nor YUYV".into(),
    ))
}

/// Main capture loop running in a separate thread
fn capture_loop(
    device_path: &str,
    width: u32,
    height: u32,
    latest: Arc<Mutex<Option<CameraFrame>>>,
    running: Arc<AtomicBool>,
    ready: mpsc::Sender<BackendResult<PixelFormat>>,
) -> Result<(), BackendError> {
    static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

    let setup = Device::with_path(device_path)
        .map_err(|e| {
            BackendError::InitializationFailed(format!("Failed to open {}: {}", device_path, e))
        })
        .and_then(|dev| negotiate_format(&dev, width, height).map(|f| (dev, f)));

    let (mut dev, (pixel_format, format)) = match setup {
        Ok(ok) => ok,
        Err(e) => {
            let _ = ready.send(Err(e.clone()));
            return Err(e);
        }
    };

    let mut stream = match MmapStream::with_buffers(
        &mut dev,
        Type::VideoCapture,
        crate::constants::capture::STREAM_BUFFERS,
    ) {
        Ok(stream) => stream,
        Err(e) => {
            let err = BackendError::InitializationFailed(format!(
                "Failed to create buffer stream: {}",
                e
            ));
            let _ = ready.send(Err(err.clone()));
            return Err(err);
        }
    };

    let _ = ready.send(Ok(pixel_format));

    while running.load(Ordering::SeqCst) {
        let (buf, meta) = stream
            .next()
            .map_err(|e| BackendError::Disconnected(e.to_string()))?;

        let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
        let used = (meta.bytesused as usize).min(buf.len());
        let started = Instant::now();

        match format_converters::to_rgba(pixel_format, &buf[..used], format.width, format.height)
        {
            Ok((rgba, w, h)) => match CameraFrame::from_rgba(w, h, rgba) {
                Ok(frame) => {
                    *latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
                    if frame_num % 120 == 0 {
                        debug!(
                            frame = frame_num,
                            decode_ms = started.elapsed().as_millis() as u64,
                            "V4L2 frame decoded"
                        );
                    }
                }
                Err(e) => warn!(frame = frame_num, error = %e, "Dropping malformed frame"),
            },
            Err(e) => {
                // Corrupt MJPEG buffers happen during warm-up
                if frame_num % 30 == 0 {
                    warn!(frame = frame_num, error = %e, "Failed to decode frame");
                }
            }
        }
    }

    info!("V4L2 capture loop exiting");
    Ok(())
}
