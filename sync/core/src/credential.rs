//! Credential Holder
//!
//! Holds the single opaque bearer token handed over by the OAuth capability.
//! The token is never parsed or validated beyond being non-empty; it is
//! forwarded verbatim in the sync request.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Opaque bearer token granting calendar-write access
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token, rejecting empty or whitespace-only input
    pub fn new(token: impl Into<String>) -> Result<Self, SyncError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(SyncError::InvalidCredential);
        }
        Ok(Self(token))
    }

    /// The raw token, exactly as granted
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Successful result of the OAuth capability
#[derive(Clone, Debug, Deserialize)]
pub struct AccessTokenGrant {
    /// Bearer token issued by the provider
    pub access_token: String,
}

impl AccessTokenGrant {
    /// Read a grant from either a provider JSON response or a bare token
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidCredential`] for blank input, a JSON
    /// object without an `access_token`, or a blank `access_token`.
    pub fn parse(input: &str) -> Result<Self, SyncError> {
        let input = input.trim();
        let grant = if input.starts_with('{') {
            serde_json::from_str::<Self>(input).map_err(|e| {
                tracing::warn!(error = %e, "Unreadable token response");
                SyncError::InvalidCredential
            })?
        } else {
            Self {
                access_token: input.to_string(),
            }
        };

        if grant.access_token.trim().is_empty() {
            return Err(SyncError::InvalidCredential);
        }
        Ok(grant)
    }
}

/// Stores at most one credential for the lifetime of a session
#[derive(Clone, Debug, Default)]
pub struct CredentialHolder {
    token: Option<AccessToken>,
}

impl CredentialHolder {
    /// Create an empty holder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a token, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidCredential`] if the token is empty. The
    /// previously held token is kept in that case.
    pub fn set(&mut self, token: impl Into<String>) -> Result<(), SyncError> {
        self.token = Some(AccessToken::new(token)?);
        Ok(())
    }

    /// Whether a credential is present
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.token.is_some()
    }

    /// The held token, if any
    #[must_use]
    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    /// Drop the held token. Safe to call when empty.
    pub fn clear(&mut self) {
        self.token = None;
    }
}
