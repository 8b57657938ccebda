//! Main Application
//!
//! The App struct manages the TUI lifecycle as a thin display client:
//! - Event loop (keyboard, resize)
//! - Embedded `SyncConductor` for orchestration
//! - DisplayState and FormInput for rendering
//!
//! The App:
//! 1. Converts terminal events to SurfaceEvents
//! 2. Sends them to the embedded conductor
//! 3. Receives SyncMessages and updates DisplayState
//! 4. Renders from DisplayState and the status presenter

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use shift_sync_core::{
    render, AccessTokenGrant, HttpSyncBackend, SurfaceEvent, SyncBackend, SyncConductor,
    SyncConfig, SyncMessage,
};

use crate::display::DisplayState;
use crate::input::{FormInput, InputField};
use crate::widgets::{self, Screen};

/// Capacity of the conductor -> surface channel
pub(crate) const MESSAGE_CAPACITY: usize = 100;

/// Upper bound on how long startup may hold the first frames
const START_TIMEOUT: Duration = Duration::from_millis(750);

/// Values to pre-fill from the command line
#[derive(Clone, Debug, Default)]
pub struct Prefill {
    /// Google access token
    pub token: Option<String>,
    /// Venue ID
    pub venue: Option<String>,
    /// Venue user ID
    pub user: Option<String>,
    /// Venue PIN
    pub pin: Option<String>,
}

/// What a key press asks for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Forward to the conductor
    Event(SurfaceEvent),
    /// Only the local input changed
    Redraw,
    /// Nothing to do
    Ignore,
}

/// Main application state
pub struct App<B: SyncBackend + 'static = HttpSyncBackend> {
    /// Is the app still running?
    running: bool,
    /// The embedded conductor
    conductor: SyncConductor<B>,
    /// Receiver for messages from the conductor
    rx: mpsc::Receiver<SyncMessage>,
    /// Display state derived from SyncMessages
    display: DisplayState,
    /// Form buffers and focus
    input: FormInput,
    /// Animation frame counter
    tick: usize,
}

impl App<HttpSyncBackend> {
    /// Create an App talking to the configured sync server
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: SyncConfig) -> anyhow::Result<Self> {
        let backend = HttpSyncBackend::from_config(&config)?;
        Ok(Self::with_backend(backend, config))
    }
}

impl<B: SyncBackend + 'static> App<B> {
    /// Create an App around any backend
    pub fn with_backend(backend: B, config: SyncConfig) -> Self {
        let (tx, rx) = mpsc::channel(MESSAGE_CAPACITY);
        let display = DisplayState::new(config.idle_message.clone());
        let conductor = SyncConductor::new(backend, config, tx);

        Self {
            running: true,
            conductor,
            rx,
            display,
            input: FormInput::new(),
            tick: 0,
        }
    }

    /// Push command-line values into the form and conductor
    pub async fn prefill(&mut self, prefill: Prefill) {
        use shift_sync_core::FormField;

        for (field, value) in [
            (FormField::VenueId, prefill.venue),
            (FormField::Username, prefill.user),
            (FormField::Pin, prefill.pin),
        ] {
            if let Some(value) = value {
                self.input.set(InputField::Form(field), value.clone());
                self.conductor
                    .handle_event(SurfaceEvent::FieldChanged { field, value })
                    .await;
            }
        }

        if let Some(token) = prefill.token {
            self.conductor.handle_event(token_event(&token)).await;
        }
    }

    /// Main event loop
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        // Target ~10 FPS, enough for the spinner
        let frame_duration = Duration::from_millis(100);

        // Create async event stream for non-blocking terminal events
        let mut event_stream = EventStream::new();

        // Render initial frame immediately so user sees UI
        self.render(terminal)?;

        if tokio::time::timeout(START_TIMEOUT, self.conductor.start())
            .await
            .is_err()
        {
            tracing::warn!("Health check still pending, continuing without it");
        }
        self.conductor.handle_event(SurfaceEvent::Connected).await;

        while self.running {
            let frame_start = Instant::now();

            tokio::select! {
                biased;

                // Terminal events - highest priority
                maybe_event = event_stream.next() => {
                    match maybe_event {
                        // Only handle Press events (not Release or Repeat)
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            self.handle_key(key).await;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => tracing::warn!("Terminal event error: {}", e),
                        None => self.running = false,
                    }
                }

                // Frame tick
                () = tokio::time::sleep(frame_duration) => {
                    self.tick = self.tick.wrapping_add(1);
                }
            }

            // Apply stream chunks that have arrived
            self.pump_stream().await;

            self.display.update(Instant::now());

            self.render(terminal)?;

            if self.display.quit_requested {
                self.running = false;
            }

            // Frame rate limiting
            let elapsed = frame_start.elapsed();
            if elapsed < frame_duration / 4 {
                tokio::time::sleep(frame_duration / 4 - elapsed).await;
            }
        }

        Ok(())
    }

    /// Apply arrived stream chunks while draining the message channel
    ///
    /// One poll can emit more messages than the channel holds, so the
    /// receiver is drained alongside it.
    async fn pump_stream(&mut self) {
        let conductor = &mut self.conductor;
        let rx = &mut self.rx;
        let display = &mut self.display;

        tokio::select! {
            biased;

            _ = conductor.poll_stream() => {}
            () = async {
                while let Some(msg) = rx.recv().await {
                    display.apply_message(msg);
                }
            } => {}
        }

        self.process_messages();
    }

    /// Process all pending messages from the conductor
    fn process_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            self.display.apply_message(msg);
        }
    }

    /// Handle keyboard input
    async fn handle_key(&mut self, key: KeyEvent) {
        if let KeyAction::Event(event) = self.key_action(key) {
            self.conductor.handle_event(event).await;
        }
    }

    /// Translate a key press into an action, updating local input
    pub fn key_action(&mut self, key: KeyEvent) -> KeyAction {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') if ctrl => KeyAction::Event(SurfaceEvent::QuitRequested),
            KeyCode::Char('l') if ctrl => {
                self.input.set(InputField::Token, String::new());
                KeyAction::Event(SurfaceEvent::CredentialCleared)
            }
            KeyCode::Esc => {
                self.display.clear_notification();
                KeyAction::Event(SurfaceEvent::CancelRequested)
            }

            KeyCode::Tab | KeyCode::Down => {
                self.input.focus_next();
                KeyAction::Redraw
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.input.focus_prev();
                KeyAction::Redraw
            }

            KeyCode::Enter => match self.input.focus() {
                InputField::Token => {
                    let token = self.input.take_token();
                    if token.trim().is_empty() {
                        KeyAction::Ignore
                    } else {
                        KeyAction::Event(token_event(&token))
                    }
                }
                InputField::Form(_) => KeyAction::Event(SurfaceEvent::SyncRequested),
            },

            KeyCode::Char(_) if ctrl => KeyAction::Ignore,
            KeyCode::Char(c) => {
                self.input.push(c);
                self.field_changed()
            }
            KeyCode::Backspace => {
                if self.input.pop() {
                    self.field_changed()
                } else {
                    KeyAction::Ignore
                }
            }

            _ => KeyAction::Ignore,
        }
    }

    /// Mirror an edit of the focused field to the conductor
    fn field_changed(&self) -> KeyAction {
        match self.input.focus() {
            InputField::Form(field) => KeyAction::Event(SurfaceEvent::FieldChanged {
                field,
                value: self.input.value(self.input.focus()).to_string(),
            }),
            InputField::Token => KeyAction::Redraw,
        }
    }

    /// Render the UI
    fn render(&self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
        let view = render(&self.conductor.snapshot());
        let screen = Screen {
            display: &self.display,
            input: &self.input,
            view: &view,
            has_credential: self.conductor.has_credential(),
            tick: self.tick,
        };

        terminal.draw(|frame| widgets::draw(frame, &screen))?;
        Ok(())
    }

    /// Final status text, for printing after the TUI closes
    pub fn final_status(&self) -> &str {
        self.conductor.current_status_text()
    }

    /// Access the display state
    pub fn display(&self) -> &DisplayState {
        &self.display
    }
}

/// Turn pasted token input into the matching credential event
fn token_event(input: &str) -> SurfaceEvent {
    match AccessTokenGrant::parse(input) {
        Ok(grant) => SurfaceEvent::CredentialGranted {
            access_token: grant.access_token,
        },
        Err(e) => SurfaceEvent::CredentialFailed {
            reason: e.to_string(),
        },
    }
}
