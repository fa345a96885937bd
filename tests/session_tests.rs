// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end session tests (paused clock)

use chrono::NaiveDate;
use image::{Rgba, RgbaImage};
use photobooth::backends::camera::{
    BackendError, BackendResult, CameraFrame, FileSource, FrameSource,
};
use photobooth::pipelines::strip::{StripComposer, TextureSource};
use photobooth::session::{Booth, Sequencer, SessionEvent, SessionState, SessionTimings};
use photobooth::{SessionError, constants};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

fn booth() -> Booth {
    Booth::new(StripComposer::new(
        "Integration",
        None,
        TextureSource::None,
        "%Y-%m-%d",
    ))
}

fn poses() -> FileSource {
    let frames = [(200, 30, 30), (30, 200, 30), (30, 30, 200), (220, 220, 220)]
        .iter()
        .map(|(r, g, b)| {
            CameraFrame::from_image(RgbaImage::from_pixel(64, 48, Rgba([*r, *g, *b, 255])))
        })
        .collect();
    FileSource::from_frames(frames).unwrap()
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

/// Works for `ok_after` grabs, then fails
struct FlakyCamera {
    grabs: AtomicUsize,
    ok_after: usize,
}

impl FrameSource for FlakyCamera {
    fn description(&self) -> String {
        "flaky camera".to_string()
    }

    fn latest_frame(&self) -> BackendResult<CameraFrame> {
        Ok(CameraFrame::from_image(RgbaImage::new(8, 6)))
    }

    fn grab(&self) -> BackendResult<CameraFrame> {
        if self.grabs.fetch_add(1, Ordering::SeqCst) < self.ok_after {
            self.latest_frame()
        } else {
            Err(BackendError::Disconnected("unplugged".to_string()))
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_full_session_produces_strip() {
    let mut booth = booth();
    booth.set_caption("Happy birthday");
    let start = tokio::time::Instant::now();

    let strip = booth
        .run_session(&Sequencer::default(), &poses(), None, date())
        .await
        .unwrap();
    assert_eq!(strip.dimensions(), (constants::strip::WIDTH, constants::strip::HEIGHT));
    assert_eq!(strip.dimensions(), (840, 2700));
    assert_eq!(strip.caption(), "Happy birthday");

    assert!(start.elapsed() >= Duration::from_millis(15_800));
    assert_eq!(booth.state(), SessionState::Composed);
    assert_eq!(booth.photos().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_stills_are_stacked_in_capture_order() {
    let mut booth = booth();
    let strip = booth
        .run_session(&Sequencer::default(), &poses(), None, date())
        .await
        .unwrap();

    // Red, green, blue and light grey poses, after the vintage filter
    let reds: Vec<u8> = [400, 1020, 1640, 2260]
        .iter()
        .map(|y| strip.image().get_pixel(420, *y)[0])
        .collect();
    let stills: Vec<u8> = booth
        .photos()
        .iter()
        .map(|s| s.image().get_pixel(400, 300)[0])
        .collect();
    assert_eq!(reds, stills);
}

#[tokio::test(start_paused = true)]
async fn test_event_stream_of_a_session() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut booth = booth();
    booth
        .run_session(&Sequencer::default(), &poses(), Some(&tx), date())
        .await
        .unwrap();
    drop(tx);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.first(), Some(&SessionEvent::Started));
    assert_eq!(events.last(), Some(&SessionEvent::Completed));

    let countdowns = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::Countdown(_)))
        .count();
    assert_eq!(countdowns, 12);

    // Every capture is followed by a flash
    for (i, event) in events.iter().enumerate() {
        if let SessionEvent::Captured { .. } = event {
            assert_eq!(events[i + 1], SessionEvent::Flash { opacity: 0.7 });
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_custom_timings_shorten_session() {
    let timings = SessionTimings {
        countdown_from: 1,
        countdown_tick: Duration::from_millis(10),
        inter_shot_pause: Duration::ZERO,
        ..SessionTimings::default()
    };
    let sequencer = Sequencer::new(timings.clone(), Default::default());

    let start = tokio::time::Instant::now();
    let photos = sequencer.run(&poses(), None).await.unwrap();
    assert_eq!(photos.len(), 4);
    assert_eq!(start.elapsed(), timings.total());
}

#[tokio::test(start_paused = true)]
async fn test_capture_failure_mid_session_resets() {
    let camera = FlakyCamera {
        grabs: AtomicUsize::new(0),
        ok_after: 2,
    };
    let mut booth = booth();

    let err = booth
        .run_session(&Sequencer::default(), &camera, None, date())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::CaptureFailed(_)));
    assert_eq!(booth.state(), SessionState::Idle);
    assert!(booth.photos().is_empty());

    // The booth is usable again
    assert!(booth.begin_session().is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_start_rejected_while_strip_pending() {
    let mut booth = booth();
    booth
        .run_session(&Sequencer::default(), &poses(), None, date())
        .await
        .unwrap();

    let err = booth
        .run_session(&Sequencer::default(), &poses(), None, date())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotIdle(SessionState::Composed)));
    assert!(booth.strip().is_some());
}
