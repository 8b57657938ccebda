//! Surface Events
//!
//! Events sent from a UI surface to the sync conductor. Surfaces report what
//! the user did; the conductor decides what it means.

use serde::{Deserialize, Serialize};

use crate::form::FormField;

/// Events from a UI surface to the conductor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// Surface is up and has rendered its first frame
    Connected,

    /// A form field was edited
    FieldChanged {
        /// Which field
        field: FormField,
        /// The full new value
        value: String,
    },

    /// The external sign-in flow returned an access token
    CredentialGranted {
        /// Opaque bearer token
        access_token: String,
    },

    /// The external sign-in flow failed or was cancelled
    CredentialFailed {
        /// Why, as reported by the flow
        reason: String,
    },

    /// User signed out
    CredentialCleared,

    /// User pressed the sync button
    SyncRequested,

    /// User aborted the running sync
    CancelRequested,

    /// User wants to exit
    QuitRequested,
}
