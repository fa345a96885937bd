// SPDX-License-Identifier: GPL-3.0-only

//! Photo sessions
//!
//! A session is four shots, each one a fixed sequence of phases:
//!
//! ```text
//! Countdown 3-2-1 (1 s each) → Capture → Flash (100 ms + 250 ms fade) → Pause (800 ms)
//! ```
//!
//! The pause is skipped after the last shot. [`Sequencer`] runs the phases and
//! reports progress as [`SessionEvent`]s; [`Booth`] owns everything a session
//! produces and guards against overlapping sessions.

use crate::backends::camera::FrameSource;
use crate::constants::{PHOTO_COUNT, timing};
use crate::errors::{ExportError, SessionError};
use crate::export::{DeliveryOutcome, Exporter};
use crate::flash::FlashFeedback;
use crate::pipelines::photo::{PhotoCapture, PhotoCollection};
use crate::pipelines::strip::{CompositeStrip, StripComposer};
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Where the booth is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Ready for a new session
    #[default]
    Idle,
    /// Shots are being taken
    Capturing,
    /// A strip is waiting to be exported
    Composed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Capturing => write!(f, "capturing"),
            SessionState::Composed => write!(f, "composed"),
        }
    }
}

/// Progress notifications for front ends
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The first countdown is about to start
    Started,
    /// Countdown digit to display
    Countdown(u32),
    /// Countdown finished, the shot is taken now
    CountdownCleared,
    /// Still `index` (0-based) was captured
    Captured { index: usize },
    /// Flash overlay at this opacity
    Flash { opacity: f32 },
    /// Flash overlay removed
    FlashEnded,
    /// The strip is composed and ready for export
    Completed,
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// Send an event if anyone is listening; a closed receiver is ignored
pub(crate) fn emit(events: Option<&EventSender>, event: SessionEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}

/// Phase durations of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTimings {
    pub countdown_from: u32,
    pub countdown_tick: Duration,
    pub flash_opacity: f32,
    pub flash_hold: Duration,
    pub flash_fade: Duration,
    pub flash_fade_steps: u32,
    pub inter_shot_pause: Duration,
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self {
            countdown_from: timing::COUNTDOWN_FROM,
            countdown_tick: timing::COUNTDOWN_TICK,
            flash_opacity: timing::FLASH_OPACITY,
            flash_hold: timing::FLASH_HOLD,
            flash_fade: timing::FLASH_FADE,
            flash_fade_steps: timing::FLASH_FADE_STEPS,
            inter_shot_pause: timing::INTER_SHOT_PAUSE,
        }
    }
}

impl SessionTimings {
    /// Wall-clock length of a full session, composition excluded
    pub fn total(&self) -> Duration {
        let shots = PHOTO_COUNT as u32;
        let per_shot =
            self.countdown_tick * self.countdown_from + self.flash_hold + self.flash_fade;
        per_shot * shots + self.inter_shot_pause * (shots - 1)
    }
}

/// Runs the timed capture loop
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    timings: SessionTimings,
    flash: FlashFeedback,
}

impl Sequencer {
    pub fn new(timings: SessionTimings, flash: FlashFeedback) -> Self {
        Self { timings, flash }
    }

    /// Take four stills from `source`
    ///
    /// Phases run strictly one after another. The first capture failure ends
    /// the run; stills taken so far are dropped.
    pub async fn run(
        &self,
        source: &dyn FrameSource,
        events: Option<&EventSender>,
    ) -> Result<PhotoCollection, SessionError> {
        info!(source = %source.description(), "Session started");
        emit(events, SessionEvent::Started);

        let mut photos = PhotoCollection::new();

        for index in 0..PHOTO_COUNT {
            self.countdown(events).await;

            let still = PhotoCapture::capture(source).map_err(|e| {
                error!(index, error = %e, "Capture failed, abandoning session");
                e
            })?;
            photos.push(still)?;
            debug!(index, "Still captured");
            emit(events, SessionEvent::Captured { index });

            self.flash.fire(&self.timings, events).await;

            if index + 1 < PHOTO_COUNT {
                tokio::time::sleep(self.timings.inter_shot_pause).await;
            }
        }

        info!(count = photos.len(), "All stills captured");
        Ok(photos)
    }

    async fn countdown(&self, events: Option<&EventSender>) {
        for n in (1..=self.timings.countdown_from).rev() {
            emit(events, SessionEvent::Countdown(n));
            tokio::time::sleep(self.timings.countdown_tick).await;
        }
        emit(events, SessionEvent::CountdownCleared);
    }
}

/// The booth controller
///
/// Holds the state of the current session. A composite strip exists exactly
/// while the booth is [`SessionState::Composed`].
pub struct Booth {
    state: SessionState,
    photos: PhotoCollection,
    strip: Option<CompositeStrip>,
    caption: String,
    composer: Arc<StripComposer>,
}

impl Booth {
    pub fn new(composer: StripComposer) -> Self {
        Self {
            state: SessionState::Idle,
            photos: PhotoCollection::new(),
            strip: None,
            caption: String::new(),
            composer: Arc::new(composer),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn photos(&self) -> &PhotoCollection {
        &self.photos
    }

    pub fn strip(&self) -> Option<&CompositeStrip> {
        self.strip.as_ref()
    }

    pub fn composer(&self) -> &StripComposer {
        &self.composer
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }

    /// Caption buffer for in-place editing
    pub fn caption_mut(&mut self) -> &mut String {
        &mut self.caption
    }

    /// Move from Idle to Capturing and clear the previous collection
    pub fn begin_session(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Idle {
            warn!(state = %self.state, "Session start rejected");
            return Err(SessionError::NotIdle(self.state));
        }

        self.photos.clear();
        self.strip = None;
        self.state = SessionState::Capturing;
        debug!("Booth capturing");
        Ok(())
    }

    /// Drop a running session and go back to Idle
    pub fn abort_session(&mut self) {
        if self.state == SessionState::Capturing {
            info!("Session aborted");
        }
        self.photos.clear();
        self.strip = None;
        self.state = SessionState::Idle;
    }

    /// Hand in the stills of a running session and compose the strip
    ///
    /// Any failure aborts the session.
    pub async fn finish_session(
        &mut self,
        photos: PhotoCollection,
        date: NaiveDate,
    ) -> Result<&CompositeStrip, SessionError> {
        if self.state != SessionState::Capturing {
            return Err(SessionError::NotCapturing(self.state));
        }

        let strip = match self.composer.compose(&photos, &self.caption, date).await {
            Ok(strip) => strip,
            Err(e) => {
                error!(error = %e, "Composition failed");
                self.abort_session();
                return Err(e);
            }
        };

        self.photos = photos;
        self.state = SessionState::Composed;
        info!("Strip ready for export");
        Ok(self.strip.insert(strip))
    }

    /// Run a whole session: capture four stills, then compose them
    pub async fn run_session(
        &mut self,
        sequencer: &Sequencer,
        source: &dyn FrameSource,
        events: Option<&EventSender>,
        date: NaiveDate,
    ) -> Result<&CompositeStrip, SessionError> {
        self.begin_session()?;

        let photos = match sequencer.run(source, events).await {
            Ok(photos) => photos,
            Err(e) => {
                self.abort_session();
                return Err(e);
            }
        };

        let strip = self.finish_session(photos, date).await?;
        emit(events, SessionEvent::Completed);
        Ok(strip)
    }

    /// Export the composed strip and reset the booth
    ///
    /// Without a strip this does nothing and returns `Ok(None)`. Otherwise
    /// collection, strip and caption are cleared whether or not delivery
    /// succeeds.
    pub async fn export(
        &mut self,
        exporter: &Exporter,
    ) -> Result<Option<DeliveryOutcome>, ExportError> {
        let Some(strip) = self.strip.take() else {
            debug!("Nothing to export");
            return Ok(None);
        };

        let result = exporter.export(strip.into_image()).await;
        self.reset();

        match result {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                error!(error = %e, "Export failed");
                Err(e)
            }
        }
    }

    fn reset(&mut self) {
        self.photos.clear();
        self.strip = None;
        self.caption.clear();
        self.state = SessionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::{BackendError, BackendResult, CameraFrame, FileSource};
    use crate::pipelines::strip::TextureSource;
    use image::{Rgba, RgbaImage};

    fn composer() -> StripComposer {
        StripComposer::new("Test", None, TextureSource::None, "%Y")
    }

    fn source() -> FileSource {
        let frames = [40u8, 80, 120, 160]
            .iter()
            .map(|v| {
                CameraFrame::from_image(RgbaImage::from_pixel(32, 24, Rgba([*v, *v, *v, 255])))
            })
            .collect();
        FileSource::from_frames(frames).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()
    }

    struct NotReady;

    impl FrameSource for NotReady {
        fn description(&self) -> String {
            "not ready".into()
        }

        fn latest_frame(&self) -> BackendResult<CameraFrame> {
            Err(BackendError::NoFrame("warming up".into()))
        }
    }

    #[test]
    fn test_state_display_is_lowercase() {
        assert_eq!(SessionState::Composed.to_string(), "composed");
    }

    #[test]
    fn test_default_session_length() {
        assert_eq!(SessionTimings::default().total(), Duration::from_millis(15_800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequencer_collects_four_in_order() {
        let start = tokio::time::Instant::now();
        let photos = Sequencer::default().run(&source(), None).await.unwrap();

        assert_eq!(start.elapsed(), SessionTimings::default().total());
        assert!(photos.is_complete());

        let firsts: Vec<u8> = photos.iter().map(|s| s.image().get_pixel(0, 0)[0]).collect();
        let mut sorted = firsts.clone();
        sorted.sort_unstable();
        assert_eq!(firsts, sorted, "grey levels should rise with capture order");
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_events_precede_capture() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        Sequencer::default().run(&source(), Some(&tx)).await.unwrap();
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert_eq!(
            &events[..6],
            &[
                SessionEvent::Started,
                SessionEvent::Countdown(3),
                SessionEvent::Countdown(2),
                SessionEvent::Countdown(1),
                SessionEvent::CountdownCleared,
                SessionEvent::Captured { index: 0 },
            ]
        );
        let captured: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Captured { index } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(captured, vec![0, 1, 2, 3]);
        assert_eq!(events.last(), Some(&SessionEvent::FlashEnded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_receiver_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        assert!(Sequencer::default().run(&source(), Some(&tx)).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_failure_aborts_to_idle() {
        let mut booth = Booth::new(composer());
        let err = booth
            .run_session(&Sequencer::default(), &NotReady, None, date())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::CaptureFailed(_)));
        assert_eq!(booth.state(), SessionState::Idle);
        assert!(booth.photos().is_empty());
        assert!(booth.strip().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_rejected_until_export() {
        let mut booth = Booth::new(composer());
        booth
            .run_session(&Sequencer::default(), &source(), None, date())
            .await
            .unwrap();
        assert_eq!(booth.state(), SessionState::Composed);

        let err = booth.begin_session().unwrap_err();
        assert!(matches!(err, SessionError::NotIdle(SessionState::Composed)));
        assert!(booth.strip().is_some());
        assert_eq!(booth.photos().len(), 4);
    }

    #[tokio::test]
    async fn test_finish_requires_capturing() {
        let mut booth = Booth::new(composer());
        let err = booth
            .finish_session(PhotoCollection::new(), date())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotCapturing(SessionState::Idle)));
    }

    #[tokio::test]
    async fn test_finish_with_incomplete_collection_aborts() {
        let mut booth = Booth::new(composer());
        booth.begin_session().unwrap();
        let err = booth
            .finish_session(PhotoCollection::new(), date())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::IncompleteCollection(0)));
        assert_eq!(booth.state(), SessionState::Idle);
    }

    #[test]
    fn test_begin_twice_is_rejected() {
        let mut booth = Booth::new(composer());
        booth.begin_session().unwrap();
        assert!(matches!(
            booth.begin_session(),
            Err(SessionError::NotIdle(SessionState::Capturing))
        ));
        booth.abort_session();
        assert!(booth.begin_session().is_ok());
    }
}
