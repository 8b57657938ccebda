//! Status Presenter
//!
//! Stateless projection from conductor state to what a surface shows: one
//! line of text, whether a spinner runs, and whether the sync button takes
//! input. Surfaces must not derive any of these on their own.

use serde::{Deserialize, Serialize};

use crate::messages::SyncState;

/// Button text when a sync can be started
pub const SYNC_BUTTON_LABEL: &str = "Sync to Google Calendar";

/// Prompt shown while no credential is held
pub const SIGN_IN_PROMPT: &str = "Sign in with Google to sync";

/// Prompt shown while a credential is held but the form is incomplete
pub const FIELDS_REQUIRED_PROMPT: &str = "All fields required";

/// Everything the presenter needs from the conductor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncSnapshot {
    /// Current conductor state
    pub state: SyncState,
    /// Latest applied status text
    pub status_text: String,
    /// A credential is held
    pub has_credential: bool,
    /// All form fields are filled in
    pub form_valid: bool,
}

impl SyncSnapshot {
    /// A sync request would pass its preconditions
    #[must_use]
    pub fn submittable(&self) -> bool {
        self.has_credential && self.form_valid && !self.state.is_active()
    }
}

/// Rendered status
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusView {
    /// Text for the status line / sync button
    pub text: String,
    /// Show a busy indicator
    pub spinner_visible: bool,
    /// The sync button ignores input
    pub disabled: bool,
}

/// Project a snapshot into a view
#[must_use]
pub fn render(snapshot: &SyncSnapshot) -> StatusView {
    let disabled = !snapshot.submittable();

    let (text, spinner_visible) = match &snapshot.state {
        SyncState::Idle => (snapshot.status_text.clone(), false),
        SyncState::AwaitingCredential if !snapshot.has_credential => {
            (SIGN_IN_PROMPT.to_string(), false)
        }
        SyncState::AwaitingCredential => (FIELDS_REQUIRED_PROMPT.to_string(), false),
        SyncState::Ready => (SYNC_BUTTON_LABEL.to_string(), false),
        SyncState::Connecting | SyncState::Syncing(_) => (snapshot.status_text.clone(), true),
        SyncState::Done | SyncState::Failed(_) => (snapshot.status_text.clone(), false),
    };

    StatusView {
        text,
        spinner_visible,
        disabled,
    }
}
