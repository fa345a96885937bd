// SPDX-License-Identifier: GPL-3.0-only

//! Terminal photo booth
//!
//! Renders the mirrored camera feed to the terminal using Unicode half-block
//! characters for improved vertical resolution. Countdown digits and the
//! flash overlay are drawn on top of the preview; once a strip is composed it
//! replaces the preview until it is exported.

use crate::backends::camera::{CameraFrame, FrameSource, V4l2Source};
use crate::config::Config;
use crate::errors::SessionError;
use crate::export::{DeliveryOutcome, Exporter};
use crate::flash::FlashFeedback;
use crate::pipelines::photo::PhotoCollection;
use crate::pipelines::strip::StripComposer;
use crate::session::{
    Booth, EventReceiver, Sequencer, SessionEvent, SessionState, SessionTimings,
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::future::Future;
use std::io::{self, stdout};
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Redraw interval
const TICK: Duration = Duration::from_millis(33);

type SessionFuture<'a> = Pin<Box<dyn Future<Output = Result<PhotoCollection, SessionError>> + 'a>>;

/// Run the booth on the configured camera
pub async fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    // Camera acquisition failure aborts startup
    let camera = V4l2Source::open_async(
        config.camera_index,
        config.capture_width,
        config.capture_height,
    )
    .await?;
    info!(source = %camera.description(), "Camera ready");

    let flash = if config.hardware_flash {
        FlashFeedback::detect()
    } else {
        FlashFeedback::screen_only()
    };
    let sequencer = Sequencer::new(SessionTimings::default(), flash);
    let mut booth = Booth::new(StripComposer::from_config(config));
    let exporter = Exporter::from_config(config);

    // Warm the texture cache so the first composition doesn't wait on it
    booth.composer().texture().await;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut booth, &sequencer, &camera, &exporter).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tokio::task::spawn_blocking(move || camera.stop()).await?;
    result
}

/// What the screen shows besides the camera feed
struct Overlay {
    countdown: Option<u32>,
    flash: f32,
    editing_caption: bool,
    status: String,
}

impl Overlay {
    fn new() -> Self {
        Self {
            countdown: None,
            flash: 0.0,
            editing_caption: false,
            status: build_status_message(SessionState::Idle),
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Started => self.status = "Get ready!".to_string(),
            SessionEvent::Countdown(n) => self.countdown = Some(n),
            SessionEvent::CountdownCleared => self.countdown = None,
            SessionEvent::Captured { index } => {
                self.status = format!("Photo {} of {}", index + 1, crate::constants::PHOTO_COUNT);
            }
            SessionEvent::Flash { opacity } => self.flash = opacity,
            SessionEvent::FlashEnded => self.flash = 0.0,
            SessionEvent::Completed => self.status = build_status_message(SessionState::Composed),
        }
    }
}

enum Action {
    None,
    Start,
    Export,
    Quit,
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    booth: &mut Booth,
    sequencer: &Sequencer,
    source: &dyn FrameSource,
    exporter: &Exporter,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session: Option<SessionFuture<'_>> = None;
    let mut preview = FrameWidget::new(true);
    let mut overlay = Overlay::new();
    let mut ticker = tokio::time::interval(TICK);

    loop {
        tokio::select! {
            result = async {
                match session.as_mut() {
                    Some(running) => running.await,
                    None => std::future::pending().await,
                }
            }, if session.is_some() => {
                session = None;
                drain_events(&mut rx, &mut overlay);
                finish(terminal, booth, result, &mut overlay, &mut preview).await?;
            }
            _ = ticker.tick() => {
                drain_events(&mut rx, &mut overlay);

                if booth.state() != SessionState::Composed
                    && let Ok(frame) = source.latest_frame()
                {
                    preview.update_frame(frame);
                }

                draw(terminal, &preview, &overlay, booth)?;

                match handle_input(booth, &mut overlay)? {
                    Action::None => {}
                    Action::Quit => break,
                    Action::Start => match booth.begin_session() {
                        Ok(()) => {
                            let tx = tx.clone();
                            session = Some(Box::pin(async move {
                                sequencer.run(source, Some(&tx)).await
                            }));
                        }
                        Err(e) => overlay.status = format!("{}", e),
                    },
                    Action::Export => {
                        overlay.status = "Exporting...".to_string();
                        draw(terminal, &preview, &overlay, booth)?;
                        overlay.status = match booth.export(exporter).await {
                            Ok(Some(DeliveryOutcome::Saved(path))) => {
                                format!("Saved: {}", path.display())
                            }
                            Ok(Some(DeliveryOutcome::OpenedForManualSave(path))) => {
                                format!("Opened for saving: {}", path.display())
                            }
                            Ok(None) => build_status_message(booth.state()),
                            Err(e) => {
                                error!("Failed to export strip: {}", e);
                                format!("Error: {}", e)
                            }
                        };
                        preview = FrameWidget::new(true);
                    }
                }
            }
        }
    }

    Ok(())
}

fn drain_events(rx: &mut EventReceiver, overlay: &mut Overlay) {
    while let Ok(event) = rx.try_recv() {
        overlay.apply(event);
    }
}

/// Compose the strip after the last shot, or abort on failure
async fn finish(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    booth: &mut Booth,
    result: Result<PhotoCollection, SessionError>,
    overlay: &mut Overlay,
    preview: &mut FrameWidget,
) -> Result<(), Box<dyn std::error::Error>> {
    overlay.countdown = None;
    overlay.flash = 0.0;

    let photos = match result {
        Ok(photos) => photos,
        Err(e) => {
            error!("Session failed: {}", e);
            booth.abort_session();
            overlay.status = format!("Error: {}", e);
            return Ok(());
        }
    };

    overlay.status = "Composing strip...".to_string();
    draw(terminal, preview, overlay, booth)?;

    let date = chrono::Local::now().date_naive();
    match booth.finish_session(photos, date).await {
        Ok(strip) => {
            *preview = FrameWidget::new(false);
            preview.update_frame(CameraFrame::from_image(strip.image().clone()));
            overlay.apply(SessionEvent::Completed);
        }
        Err(e) => {
            error!("Failed to compose strip: {}", e);
            overlay.status = format!("Error: {}", e);
        }
    }
    Ok(())
}

fn draw(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    preview: &FrameWidget,
    overlay: &Overlay,
    booth: &Booth,
) -> io::Result<()> {
    terminal.draw(|f| {
        let area = f.area();

        // Reserve the bottom two lines for caption and status
        let camera_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height: area.height.saturating_sub(2),
        };

        f.render_widget(
            &FlashedFrame {
                frame: preview,
                flash: overlay.flash,
            },
            camera_area,
        );

        if let Some(n) = overlay.countdown {
            f.render_widget(BigDigit(n), camera_area);
        }

        let caption_line = if overlay.editing_caption {
            format!("Caption: {}_", booth.caption())
        } else if booth.caption().is_empty() {
            "Caption: (Tab to edit)".to_string()
        } else {
            format!("Caption: {}", booth.caption())
        };
        f.render_widget(
            StatusBar {
                message: &caption_line,
                bg: Color::Black,
            },
            Rect {
                x: area.x,
                y: area.height.saturating_sub(2),
                width: area.width,
                height: 1,
            },
        );

        f.render_widget(
            StatusBar {
                message: &overlay.status,
                bg: Color::DarkGray,
            },
            Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            },
        );
    })?;
    Ok(())
}

/// Poll one key without blocking and apply it
fn handle_input(booth: &mut Booth, overlay: &mut Overlay) -> io::Result<Action> {
    if !event::poll(Duration::ZERO)? {
        return Ok(Action::None);
    }
    let Event::Key(key) = event::read()? else {
        return Ok(Action::None);
    };
    if key.kind != KeyEventKind::Press {
        return Ok(Action::None);
    }

    // Ctrl+C to quit, even while typing
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Ok(Action::Quit);
    }

    if overlay.editing_caption {
        edit_caption(booth, overlay, key);
        return Ok(Action::None);
    }

    Ok(match key.code {
        KeyCode::Char(' ') => Action::Start,
        KeyCode::Char('e') if booth.state() == SessionState::Composed => Action::Export,
        KeyCode::Tab => {
            overlay.editing_caption = true;
            Action::None
        }
        KeyCode::Char('q') => Action::Quit,
        _ => Action::None,
    })
}

fn edit_caption(booth: &mut Booth, overlay: &mut Overlay, key: KeyEvent) {
    match key.code {
        KeyCode::Tab | KeyCode::Enter | KeyCode::Esc => overlay.editing_caption = false,
        KeyCode::Backspace => {
            booth.caption_mut().pop();
        }
        KeyCode::Char(c) => booth.caption_mut().push(c),
        _ => {}
    }
}

fn build_status_message(state: SessionState) -> String {
    match state {
        SessionState::Idle => "Space: start | Tab: caption | q: quit".to_string(),
        SessionState::Capturing => "Smile!".to_string(),
        SessionState::Composed => "Strip ready | e: export | Tab: caption | q: quit".to_string(),
    }
}

/// Widget that renders a frame using half-block characters
struct FrameWidget {
    frame: Option<CameraFrame>,
    mirror: bool,
}

impl FrameWidget {
    fn new(mirror: bool) -> Self {
        Self {
            frame: None,
            mirror,
        }
    }

    fn update_frame(&mut self, frame: CameraFrame) {
        self.frame = Some(frame);
    }
}

/// A frame with the flash overlay blended over it
struct FlashedFrame<'a> {
    frame: &'a FrameWidget,
    flash: f32,
}

impl Widget for &FlashedFrame<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame.frame else {
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, ratatui::style::Style::default());
            }
            return;
        };
        if frame.width == 0 || frame.height == 0 || area.width == 0 || area.height == 0 {
            return;
        }

        let (display_width, display_height) = fit_to_area(frame.width, frame.height, area);
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let col = if self.frame.mirror {
                    display_width - 1 - tx
                } else {
                    tx
                };
                let src_x = (col as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let top = flashed(frame.pixel_rgb(src_x, src_y_top), self.flash);
                let bottom = flashed(frame.pixel_rgb(src_x, src_y_bottom), self.flash);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

/// Display size in cells, keeping the frame's aspect ratio
fn fit_to_area(width: u32, height: u32, area: Rect) -> (u16, u16) {
    let frame_aspect = width as f64 / height as f64;
    let term_width = area.width as f64;
    let term_height = (area.height * 2) as f64; // *2 because half-blocks

    if term_width / term_height > frame_aspect {
        // Terminal is wider - fit to height
        let h = term_height;
        let w = h * frame_aspect;
        (w as u16, (h / 2.0) as u16)
    } else {
        // Terminal is taller - fit to width
        let w = term_width;
        let h = w / frame_aspect;
        (w as u16, (h / 2.0) as u16)
    }
}

/// Blend a pixel towards white
fn flashed((r, g, b): (u8, u8, u8), opacity: f32) -> Color {
    let mix = |c: u8| (c as f32 + (255.0 - c as f32) * opacity.clamp(0.0, 1.0)).round() as u8;
    Color::Rgb(mix(r), mix(g), mix(b))
}

/// 3x5 bitmap digits
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// A countdown digit drawn large in the middle of the area
struct BigDigit(u32);

impl Widget for BigDigit {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(rows) = DIGITS.get(self.0 as usize) else {
            return;
        };

        // Each bitmap pixel is 4 cells wide and 2 cells tall
        let (cell_w, cell_h) = (4u16, 2u16);
        let width = 3 * cell_w;
        let height = 5 * cell_h;
        let x0 = area.x + area.width.saturating_sub(width) / 2;
        let y0 = area.y + area.height.saturating_sub(height) / 2;

        for (row, bits) in rows.iter().enumerate() {
            for col in 0..3u16 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                for dy in 0..cell_h {
                    for dx in 0..cell_w {
                        let x = x0 + col * cell_w + dx;
                        let y = y0 + row as u16 * cell_h + dy;
                        if x >= area.x + area.width || y >= area.y + area.height {
                            continue;
                        }
                        if let Some(cell) = buf.cell_mut((x, y)) {
                            cell.set_char('█');
                            cell.set_fg(Color::Rgb(0xf5, 0xf0, 0xe6));
                        }
                    }
                }
            }
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
    bg: Color,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(self.bg);
            }
        }

        // Truncate on a char boundary
        let text: String = self.message.chars().take(area.width as usize).collect();

        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default().fg(Color::White).bg(self.bg),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_flash_blends_towards_white() {
        assert_eq!(flashed((0, 0, 0), 0.0), Color::Rgb(0, 0, 0));
        assert_eq!(flashed((0, 100, 255), 1.0), Color::Rgb(255, 255, 255));
        assert_eq!(flashed((0, 0, 0), 0.5), Color::Rgb(128, 128, 128));
    }

    #[test]
    fn test_fit_keeps_aspect_ratio() {
        let area = Rect::new(0, 0, 80, 20);
        // 4:3 frame in 80x40 half-block pixels: height bound
        assert_eq!(fit_to_area(800, 600, area), (53, 20));
    }

    #[test]
    fn test_mirrored_preview_swaps_sides() {
        let image = RgbaImage::from_fn(2, 2, |x, _| {
            if x == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let mut widget = FrameWidget::new(true);
        widget.update_frame(CameraFrame::from_image(image));

        let area = Rect::new(0, 0, 2, 1);
        let mut buf = Buffer::empty(area);
        (&FlashedFrame {
            frame: &widget,
            flash: 0.0,
        })
            .render(area, &mut buf);

        assert_eq!(buf[(0, 0)].fg, Color::Rgb(0, 0, 255));
        assert_eq!(buf[(1, 0)].fg, Color::Rgb(255, 0, 0));
    }

    #[test]
    fn test_overlay_tracks_events() {
        let mut overlay = Overlay::new();
        overlay.apply(SessionEvent::Countdown(2));
        overlay.apply(SessionEvent::Flash { opacity: 0.7 });
        assert_eq!(overlay.countdown, Some(2));
        assert_eq!(overlay.flash, 0.7);

        overlay.apply(SessionEvent::CountdownCleared);
        overlay.apply(SessionEvent::FlashEnded);
        assert_eq!(overlay.countdown, None);
        assert_eq!(overlay.flash, 0.0);
    }
}
