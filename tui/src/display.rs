//! Display State Types
//!
//! What the TUI knows about the sync, derived only from `SyncMessage`s.
//!
//! # Design Philosophy
//!
//! The TUI is a "thin client". It never decides whether a sync may start or
//! what the status line says; it mirrors the conductor and hands a snapshot
//! to the presenter.

use std::time::{Duration, Instant};

use shift_sync_core::{NotifyLevel, SyncMessage, SyncState, SyncSummary};

/// How long a notification stays on screen
const NOTIFICATION_TTL: Duration = Duration::from_secs(6);

/// Status lines kept for the history panel
const MAX_HISTORY: usize = 50;

/// A notification to display
#[derive(Clone, Debug)]
pub struct DisplayNotification {
    /// Notification level
    pub level: NotifyLevel,
    /// Message content
    pub message: String,
    /// When it arrived
    shown_at: Instant,
}

impl DisplayNotification {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= NOTIFICATION_TTL
    }
}

/// Complete display state
#[derive(Clone, Debug)]
pub struct DisplayState {
    /// Mirrored conductor state
    pub state: SyncState,
    /// Mirrored status text
    pub status_text: String,
    /// Status lines of the current sync, oldest first
    pub history: Vec<String>,
    /// Pending notification (if any)
    pub notification: Option<DisplayNotification>,
    /// Summary of the last settled sync
    pub last_summary: Option<SyncSummary>,
    /// The conductor asked the surface to exit
    pub quit_requested: bool,
}

impl DisplayState {
    /// Create a display state showing `idle_message`
    pub fn new(idle_message: impl Into<String>) -> Self {
        Self {
            state: SyncState::Idle,
            status_text: idle_message.into(),
            history: Vec::new(),
            notification: None,
            last_summary: None,
            quit_requested: false,
        }
    }

    /// Apply a `SyncMessage` to update display state
    pub fn apply_message(&mut self, msg: SyncMessage) {
        match msg {
            SyncMessage::State { state } => {
                if state == SyncState::Connecting {
                    // New sync, fresh history
                    self.history.clear();
                    self.last_summary = None;
                }
                self.state = state;
            }
            SyncMessage::Status { text } => {
                if self.state.is_active() {
                    self.history.push(text.clone());
                    if self.history.len() > MAX_HISTORY {
                        self.history.remove(0);
                    }
                }
                self.status_text = text;
            }
            SyncMessage::Notify { level, message } => {
                self.notification = Some(DisplayNotification {
                    level,
                    message,
                    shown_at: Instant::now(),
                });
            }
            SyncMessage::SyncFinished { summary } => {
                self.last_summary = Some(summary);
            }
            SyncMessage::Quit => {
                self.quit_requested = true;
            }
        }
    }

    /// Expire old notifications
    pub fn update(&mut self, now: Instant) {
        if self
            .notification
            .as_ref()
            .is_some_and(|n| n.is_expired(now))
        {
            self.notification = None;
        }
    }

    /// Clear the notification
    pub fn clear_notification(&mut self) {
        self.notification = None;
    }
}
