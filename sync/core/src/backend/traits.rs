//! Sync Backend Traits
//!
//! The seam between the orchestrator and the remote job executor. The
//! orchestrator only needs to open one streaming request per sync and read
//! raw chunks from it; everything about how the job logs into the venue and
//! writes calendar events lives on the other side of this trait.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::Serialize;

use crate::credential::AccessToken;
use crate::error::{SyncError, TransportError};
use crate::form::{FormField, SyncForm};

/// Raw response body of a sync request
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Payload of `POST /sync`
///
/// Built once, right before the request is issued, and never modified.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SyncRequest {
    venue_id: String,
    username: String,
    #[serde(rename = "password")]
    pin: String,
    #[serde(rename = "google_token")]
    token: AccessToken,
}

impl SyncRequest {
    /// Build a request, requiring every field to be non-empty
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::PreconditionNotMet`] naming the first blank field.
    pub fn new(
        venue_id: impl Into<String>,
        username: impl Into<String>,
        pin: impl Into<String>,
        token: AccessToken,
    ) -> Result<Self, SyncError> {
        let request = Self {
            venue_id: venue_id.into(),
            username: username.into(),
            pin: pin.into(),
            token,
        };

        for (field, value) in [
            (FormField::VenueId, &request.venue_id),
            (FormField::Username, &request.username),
            (FormField::Pin, &request.pin),
        ] {
            if value.trim().is_empty() {
                return Err(SyncError::PreconditionNotMet(format!(
                    "{} is required",
                    field.label()
                )));
            }
        }

        Ok(request)
    }

    /// Build a request from the current form values
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::PreconditionNotMet`] if any form field is blank.
    pub fn from_form(form: &SyncForm, token: AccessToken) -> Result<Self, SyncError> {
        Self::new(
            form.value(FormField::VenueId),
            form.value(FormField::Username),
            form.value(FormField::Pin),
            token,
        )
    }

    /// Venue identifier
    #[must_use]
    pub fn venue_id(&self) -> &str {
        &self.venue_id
    }

    /// Venue login ID
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Venue PIN
    #[must_use]
    pub fn pin(&self) -> &str {
        &self.pin
    }

    /// Calendar bearer token
    #[must_use]
    pub fn token(&self) -> &AccessToken {
        &self.token
    }
}

impl std::fmt::Debug for SyncRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncRequest")
            .field("venue_id", &self.venue_id)
            .field("username", &self.username)
            .field("pin", &"<redacted>")
            .field("token", &self.token)
            .finish()
    }
}

/// Sync backend trait
///
/// Implement this to point the orchestrator at a different job executor
/// (or at a scripted stream in tests).
#[async_trait]
pub trait SyncBackend: Send + Sync {
    /// Backend name for logs (e.g. "HTTP")
    fn name(&self) -> &str;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Issue the sync request and return its response body as a byte stream
    ///
    /// Resolves once response headers arrive. A non-success response is an
    /// error here, not an empty stream.
    async fn open_stream(&self, request: &SyncRequest) -> Result<ByteStream, TransportError>;
}
