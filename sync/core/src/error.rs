//! Error Types
//!
//! Typed failures for the sync core. Rejections (`InvalidCredential`,
//! `PreconditionNotMet`, `AlreadyInProgress`) are raised synchronously before
//! any network activity. Transport failures end a sync. Decode failures are
//! scoped to one frame and never end a sync.

use thiserror::Error;

/// Errors surfaced by orchestrator operations
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Credential was empty or missing
    #[error("Invalid credential: no usable access token")]
    InvalidCredential,

    /// Sync requested without a credential, with an incomplete form, or from a
    /// state that cannot start a sync
    #[error("Cannot start sync: {0}")]
    PreconditionNotMet(String),

    /// A sync is already connecting or streaming
    #[error("A sync is already in progress")]
    AlreadyInProgress,

    /// Network or HTTP failure
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A single frame could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The sync was aborted before the stream ended
    #[error("Sync cancelled")]
    Cancelled,
}

/// Failures talking to the sync endpoint
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request could not be built or sent
    #[error("Request failed: {0}")]
    Request(String),

    /// The endpoint answered with a non-success status
    #[error("Sync endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (may be empty)
        body: String,
    },

    /// The response body failed mid-stream
    #[error("Stream read failed: {0}")]
    Read(String),

    /// The HTTP client could not be constructed
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Failure to decode one frame of the status stream
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Frame bytes were not valid UTF-8
    #[error("Frame is not valid UTF-8")]
    InvalidUtf8,

    /// Frame payload was not a status object
    #[error("Malformed status payload ({message}): {payload}")]
    InvalidPayload {
        /// The raw payload text after the `data: ` prefix
        payload: String,
        /// Parser error description
        message: String,
    },

    /// Frame grew past the buffer limit before its terminator arrived
    #[error("Frame exceeds {limit} bytes without a terminator; dropped")]
    FrameTooLarge {
        /// Configured limit in bytes
        limit: usize,
    },
}
