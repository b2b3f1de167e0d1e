//! Terminal lifecycle, event loop and input dispatch.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::{info, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Position, Rect};
use recordlens_lib::scrollbar::DragSession;
use recordlens_lib::source::HttpRecordSource;
use recordlens_lib::{ViewerConfig, ViewerSession};
use thiserror::Error;

use crate::sink::{UiSink, UiState};
use crate::ui::{self, AppLayout};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Terminal error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Screen {
    PathInput,
    Viewer,
}

/// Where a collection load stands. The load task runs detached and
/// parks the session here for the event loop to pick up.
enum LoadState {
    Idle,
    InFlight,
    Ready(ViewerSession),
}

pub struct App {
    base_url: String,
    pub(crate) state: Arc<Mutex<UiState>>,
    load_slot: Arc<Mutex<LoadState>>,
    pub(crate) screen: Screen,
    session: Option<ViewerSession>,
    drag: Option<DragSession>,
    pub(crate) input: String,
    area: Rect,
    should_quit: bool,
}

impl App {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            state: Arc::new(Mutex::new(UiState::default())),
            load_slot: Arc::new(Mutex::new(LoadState::Idle)),
            screen: Screen::PathInput,
            session: None,
            drag: None,
            input: String::new(),
            area: Rect::default(),
            should_quit: false,
        }
    }

    pub async fn run(mut self) -> Result<(), AppError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let size = terminal.size()?;
        self.area = Rect::new(0, 0, size.width, size.height);

        let result = self.event_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<(), AppError> {
        loop {
            self.adopt_ready_session();
            terminal.draw(|f| ui::draw(f, self))?;

            if event::poll(Duration::from_millis(100))? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    Event::Resize(width, height) => self.handle_resize(width, height),
                    _ => {}
                }
            }

            if self.should_quit {
                info!("quit requested");
                return Ok(());
            }
        }
    }

    /// Moves a finished load out of the slot and switches to the viewer.
    fn adopt_ready_session(&mut self) {
        let session = {
            let mut slot = self.load_slot.lock().expect("load slot poisoned");
            match std::mem::replace(&mut *slot, LoadState::Idle) {
                LoadState::Ready(session) => Some(session),
                other => {
                    *slot = other;
                    None
                }
            }
        };
        if let Some(session) = session {
            self.session = Some(session);
            self.screen = Screen::Viewer;
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('q') {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::PathInput => match key.code {
                KeyCode::Enter => self.begin_load(),
                KeyCode::Esc => self.should_quit = true,
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            },
            Screen::Viewer => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                _ => {}
            },
        }
    }

    fn begin_load(&mut self) {
        let path = self.input.trim().to_string();
        if path.is_empty() {
            return;
        }
        {
            let mut slot = self.load_slot.lock().expect("load slot poisoned");
            if matches!(*slot, LoadState::InFlight) {
                return;
            }
            *slot = LoadState::InFlight;
        }
        info!("loading collection at '{path}'");

        let source = Arc::new(HttpRecordSource::new(&self.base_url));
        let sink = Arc::new(UiSink::new(Arc::clone(&self.state)));
        let config = self.viewer_config();
        let load_slot = Arc::clone(&self.load_slot);
        tokio::spawn(async move {
            let result = ViewerSession::load(source, sink, config, &path).await;
            let mut slot = load_slot.lock().expect("load slot poisoned");
            *slot = match result {
                Ok(session) => LoadState::Ready(session),
                Err(err) => {
                    warn!("collection load failed: {err}");
                    LoadState::Idle
                }
            };
        });
    }

    fn viewer_config(&self) -> ViewerConfig {
        let layout = ui::compute_layout(self.area);
        ViewerConfig::new()
            .with_items_per_view(usize::from(layout.list_inner.height).max(1))
            .with_track_px(f64::from(layout.track.height))
            .with_min_thumb_px(1.0)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.screen != Screen::Viewer {
            return;
        }
        let layout = ui::compute_layout(self.area);
        let position = Position::new(mouse.column, mouse.row);
        let over_list = layout.list.contains(position) || layout.track.contains(position);

        match mouse.kind {
            MouseEventKind::ScrollDown if over_list => self.spawn_wheel(1.0),
            MouseEventKind::ScrollUp if over_list => self.spawn_wheel(-1.0),
            MouseEventKind::Down(MouseButton::Left) if layout.track.contains(position) => {
                self.press_track(&layout, mouse.row);
            }
            MouseEventKind::Down(MouseButton::Left) if layout.list_inner.contains(position) => {
                self.select_row(&layout, mouse.row);
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let (Some(session), Some(drag)) = (&self.session, self.drag) {
                    let session = session.clone();
                    let pointer_y = f64::from(mouse.row);
                    tokio::spawn(async move { session.handle_drag(drag, pointer_y).await });
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.drag = None,
            _ => {}
        }
    }

    /// A press on the thumb starts a drag; anywhere else on the track
    /// jumps there.
    fn press_track(&mut self, layout: &AppLayout, row: u16) {
        let Some(session) = &self.session else {
            return;
        };
        let track_y = row.saturating_sub(layout.track.y);
        let thumb = self.state.lock().expect("ui state poisoned").thumb;
        let on_thumb = thumb.is_some_and(|thumb| {
            let top = thumb.top_px.round() as u16;
            let height = thumb.height_px.round().max(1.0) as u16;
            track_y >= top && track_y < top.saturating_add(height)
        });

        if on_thumb {
            self.drag = Some(session.begin_drag(f64::from(row)));
        } else {
            let session = session.clone();
            tokio::spawn(async move { session.handle_track_click(f64::from(track_y)).await });
        }
    }

    fn select_row(&self, layout: &AppLayout, row: u16) {
        let Some(session) = &self.session else {
            return;
        };
        let offset = usize::from(row.saturating_sub(layout.list_inner.y));
        let record = {
            let state = self.state.lock().expect("ui state poisoned");
            state.window.slots.get(offset).and_then(|slot| slot.clone())
        };
        if let Some(record) = record {
            let session = session.clone();
            tokio::spawn(async move { session.select_record(record).await });
        }
    }

    fn spawn_wheel(&self, notches: f64) {
        if let Some(session) = &self.session {
            let session = session.clone();
            tokio::spawn(async move { session.handle_wheel(notches).await });
        }
    }

    fn handle_resize(&mut self, width: u16, height: u16) {
        self.area = Rect::new(0, 0, width, height);
        if let Some(session) = &self.session {
            let layout = ui::compute_layout(self.area);
            session.resize_track(f64::from(layout.track.height));
        }
    }
}
