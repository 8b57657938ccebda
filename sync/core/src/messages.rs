//! Sync Messages
//!
//! Messages sent from the sync conductor to a UI surface. Surfaces render
//! what they are told and keep no sync logic of their own.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Lifecycle of the sync conductor
///
/// Exactly one value is current at a time. It is reset when a new sync
/// begins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing rendered yet
    Idle,
    /// No credential held, or the form is not yet submittable
    AwaitingCredential,
    /// Credential present and form valid
    Ready,
    /// Request dispatched, no bytes received yet
    Connecting,
    /// At least one byte received; carries the latest applied status
    Syncing(String),
    /// Ended with an unrecoverable error
    Failed(SyncError),
    /// Stream ended without error
    Done,
}

impl SyncState {
    /// A sync is in flight (`Connecting` or `Syncing`)
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Syncing(_))
    }

    /// The last sync has settled (`Done` or `Failed`)
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }

    /// Short name for logs and status bars
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingCredential => "awaiting credential",
            Self::Ready => "ready",
            Self::Connecting => "connecting",
            Self::Syncing(_) => "syncing",
            Self::Failed(_) => "failed",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Notification level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Something looked wrong but the sync continues
    Warning,
    /// The action failed
    Error,
}

/// Counters reported when a sync settles
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Status events applied to the display
    pub events_applied: u64,
    /// Frames that could not be decoded
    pub decode_errors: u64,
    /// Unterminated trailing bytes dropped at end of stream
    pub discarded_bytes: usize,
}

/// Messages from the conductor to a UI surface
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncMessage {
    /// Conductor state change
    State {
        /// The new state
        state: SyncState,
    },

    /// Displayed status text changed
    Status {
        /// The text to show
        text: String,
    },

    /// Transient notification
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Message content
        message: String,
    },

    /// The running sync settled
    SyncFinished {
        /// What happened during the sync
        summary: SyncSummary,
    },

    /// The surface should exit
    Quit,
}
