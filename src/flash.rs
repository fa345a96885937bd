// SPDX-License-Identifier: GPL-3.0-only

//! Flash feedback after each capture
//!
//! The on-screen flash is a white overlay that appears at 70% opacity, holds
//! for 100 ms and fades out over 250 ms. Front ends draw it from the
//! [`SessionEvent::Flash`] events emitted here.
//!
//! When enabled, flash LEDs exposed at `/sys/class/leds/*:flash` are lit for
//! the hold period as well. Torch mode (the `brightness` file) is used since
//! it is group-writable by `feedbackd`, unlike the root-only strobe interface.

use crate::session::{EventSender, SessionEvent, SessionTimings, emit};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default sysfs LED class directory
const LEDS_DIR: &str = "/sys/class/leds";

/// A flash LED device discovered via sysfs
#[derive(Debug, Clone)]
pub struct FlashDevice {
    /// Sysfs path, e.g. `/sys/class/leds/white:flash`
    path: PathBuf,
    /// Maximum brightness value (from `max_brightness` file)
    max_brightness: u32,
    /// Directory basename
    name: String,
}

impl FlashDevice {
    /// Writable flash LEDs under `/sys/class/leds`
    pub fn discover() -> Vec<FlashDevice> {
        Self::discover_in(Path::new(LEDS_DIR))
    }

    /// Scan `leds_dir` for entries matching `*:flash` that we can write to
    pub fn discover_in(leds_dir: &Path) -> Vec<FlashDevice> {
        let Ok(entries) = std::fs::read_dir(leds_dir) else {
            debug!(dir = %leds_dir.display(), "Cannot read LED directory, no hardware flash");
            return Vec::new();
        };

        let mut devices = Vec::new();

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name_str) = name.to_str() else {
                continue;
            };

            // Match entries like "white:flash", "yellow:flash"
            if !name_str.ends_with(":flash") {
                continue;
            }

            let led_path = entry.path();
            let brightness_path = led_path.join("brightness");
            let max_brightness_path = led_path.join("max_brightness");

            let max_brightness = match std::fs::read_to_string(&max_brightness_path) {
                Ok(s) => match s.trim().parse::<u32>() {
                    Ok(v) if v > 0 => v,
                    _ => {
                        warn!(
                            path = %max_brightness_path.display(),
                            "Invalid max_brightness value"
                        );
                        continue;
                    }
                },
                Err(e) => {
                    warn!(
                        path = %max_brightness_path.display(),
                        error = %e,
                        "Cannot read max_brightness"
                    );
                    continue;
                }
            };

            if let Err(e) = std::fs::OpenOptions::new()
                .write(true)
                .open(&brightness_path)
            {
                warn!(
                    path = %brightness_path.display(),
                    error = %e,
                    "Cannot write brightness, user may need to be in 'feedbackd' group"
                );
                continue;
            }

            info!(name = name_str, max_brightness, "Discovered flash LED");

            devices.push(FlashDevice {
                path: led_path,
                max_brightness,
                name: name_str.to_string(),
            });
        }

        // Deterministic order (white before yellow)
        devices.sort_by(|a, b| a.name.cmp(&b.name));
        devices
    }

    /// Device name, e.g. "white:flash"
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set raw brightness value (0 = off, max_brightness = full)
    pub fn set_brightness(&self, value: u32) -> io::Result<()> {
        let clamped = value.min(self.max_brightness);
        std::fs::write(self.path.join("brightness"), clamped.to_string())
    }

    pub fn off(&self) -> io::Result<()> {
        self.set_brightness(0)
    }

    /// Turn on at a fraction of max brightness (0.0 = off, 1.0 = full)
    pub fn torch(&self, intensity: f32) -> io::Result<()> {
        let clamped = intensity.clamp(0.0, 1.0);
        let value = (clamped * self.max_brightness as f32).round() as u32;
        self.set_brightness(value)
    }
}

/// Turn on all flash devices at full brightness
pub fn all_on(devices: &[FlashDevice]) {
    for dev in devices {
        if let Err(e) = dev.torch(1.0) {
            warn!(device = %dev.name, error = %e, "Failed to turn on flash LED");
        }
    }
}

/// Turn off all flash devices
pub fn all_off(devices: &[FlashDevice]) {
    for dev in devices {
        if let Err(e) = dev.off() {
            warn!(device = %dev.name, error = %e, "Failed to turn off flash LED");
        }
    }
}

/// Runs the flash phase of a shot
#[derive(Debug, Clone, Default)]
pub struct FlashFeedback {
    devices: Arc<[FlashDevice]>,
}

impl FlashFeedback {
    /// Overlay only, no LEDs
    pub fn screen_only() -> Self {
        Self::default()
    }

    /// Overlay plus the given LEDs
    pub fn with_devices(devices: Vec<FlashDevice>) -> Self {
        Self {
            devices: devices.into(),
        }
    }

    /// Overlay plus every writable LED found on this machine
    pub fn detect() -> Self {
        let devices = FlashDevice::discover();
        if devices.is_empty() {
            info!("No hardware flash available, using screen flash only");
        }
        Self::with_devices(devices)
    }

    /// Flash overlay opacity after `step` of `steps` fade steps
    pub fn fade_opacity(peak: f32, step: u32, steps: u32) -> f32 {
        if steps == 0 {
            return 0.0;
        }
        peak * (1.0 - step.min(steps) as f32 / steps as f32)
    }

    /// Show the flash, hold it, fade it out and remove it
    pub async fn fire(&self, timings: &SessionTimings, events: Option<&EventSender>) {
        all_on(&self.devices);
        emit(
            events,
            SessionEvent::Flash {
                opacity: timings.flash_opacity,
            },
        );
        tokio::time::sleep(timings.flash_hold).await;
        all_off(&self.devices);

        let steps = timings.flash_fade_steps.max(1);
        let step_duration = timings.flash_fade / steps;
        for step in 1..steps {
            tokio::time::sleep(step_duration).await;
            emit(
                events,
                SessionEvent::Flash {
                    opacity: Self::fade_opacity(timings.flash_opacity, step, steps),
                },
            );
        }
        tokio::time::sleep(step_duration).await;

        emit(events, SessionEvent::FlashEnded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn fake_led(dir: &Path, name: &str, max: &str) -> PathBuf {
        let led = dir.join(name);
        std::fs::create_dir(&led).unwrap();
        std::fs::write(led.join("max_brightness"), max).unwrap();
        std::fs::write(led.join("brightness"), "0").unwrap();
        led
    }

    #[test]
    fn test_discover_matches_flash_entries_only() {
        let dir = tempfile::tempdir().unwrap();
        fake_led(dir.path(), "yellow:flash", "255\n");
        fake_led(dir.path(), "white:flash", "100\n");
        fake_led(dir.path(), "input0::capslock", "1\n");
        fake_led(dir.path(), "broken:flash", "zero\n");

        let devices = FlashDevice::discover_in(dir.path());
        let names: Vec<_> = devices.iter().map(FlashDevice::name).collect();
        assert_eq!(names, vec!["white:flash", "yellow:flash"]);
    }

    #[test]
    fn test_torch_scales_and_off_clears() {
        let dir = tempfile::tempdir().unwrap();
        let led = fake_led(dir.path(), "white:flash", "200");
        let devices = FlashDevice::discover_in(dir.path());

        all_on(&devices);
        assert_eq!(std::fs::read_to_string(led.join("brightness")).unwrap(), "200");

        devices[0].torch(0.5).unwrap();
        assert_eq!(std::fs::read_to_string(led.join("brightness")).unwrap(), "100");

        all_off(&devices);
        assert_eq!(std::fs::read_to_string(led.join("brightness")).unwrap(), "0");
    }

    #[test]
    fn test_missing_led_dir_yields_nothing() {
        assert!(FlashDevice::discover_in(Path::new("/nonexistent/leds")).is_empty());
    }

    #[test]
    fn test_fade_opacity_reaches_zero() {
        assert_eq!(FlashFeedback::fade_opacity(0.7, 0, 5), 0.7);
        assert_eq!(FlashFeedback::fade_opacity(0.7, 5, 5), 0.0);
        assert!(FlashFeedback::fade_opacity(0.7, 2, 5) < 0.7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fire_takes_hold_plus_fade() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timings = SessionTimings::default();

        let start = tokio::time::Instant::now();
        FlashFeedback::screen_only().fire(&timings, Some(&tx)).await;
        assert_eq!(start.elapsed(), timings.flash_hold + timings.flash_fade);

        drop(tx);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(events.first(), Some(&SessionEvent::Flash { opacity: 0.7 }));
        assert_eq!(events.last(), Some(&SessionEvent::FlashEnded));
        // Peak + 4 intermediate fade steps + end
        assert_eq!(events.len(), 6);
    }
}
