//! HTTP Backend Implementation
//!
//! Talks to the sync job server over plain HTTP.
//!
//! # Endpoint
//!
//! - `POST /sync` with a JSON [`SyncRequest`] body; the response is a
//!   `text/event-stream` body of `data: {"status": ...}` frames
//!
//! The client has a connect timeout but no overall request timeout: a sync
//! streams for as long as the job runs.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use super::traits::{ByteStream, SyncBackend, SyncRequest};
use crate::config::SyncConfig;
use crate::error::TransportError;

/// HTTP sync backend
#[derive(Clone, Debug)]
pub struct HttpSyncBackend {
    /// Server base URL, without trailing slash
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl HttpSyncBackend {
    /// Create a backend for the given base URL
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Result<Self, TransportError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http_client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Create from resolved configuration
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the HTTP client cannot be built.
    pub fn from_config(config: &SyncConfig) -> Result<Self, TransportError> {
        Self::new(config.base_url.clone(), config.connect_timeout)
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get sync endpoint URL
    fn sync_url(&self) -> String {
        format!("{}/sync", self.base_url)
    }
}

#[async_trait]
impl SyncBackend for HttpSyncBackend {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(&self.base_url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }

    async fn open_stream(&self, request: &SyncRequest) -> Result<ByteStream, TransportError> {
        let url = self.sync_url();
        tracing::debug!(url = %url, venue_id = %request.venue_id(), "Opening sync stream");

        let response = self
            .http_client
            .post(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        // Check for HTTP errors
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Read(e.to_string())))
            .boxed())
    }
}
