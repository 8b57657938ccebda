//! Sync Backend Integration
//!
//! Access to the remote sync job through a common trait interface.
//!
//! # Available Backends
//!
//! - **HTTP**: the job server's `POST /sync` streaming endpoint (default)
//!
//! # Usage
//!
//! ```ignore
//! use shift_sync_core::backend::{HttpSyncBackend, SyncBackend, SyncRequest};
//!
//! let backend = HttpSyncBackend::from_config(&config)?;
//! let request = SyncRequest::new("SSE", "U1", "1234", token)?;
//! let body = backend.open_stream(&request).await?;
//! ```

mod http;
mod traits;

pub use http::HttpSyncBackend;
pub use traits::{ByteStream, SyncBackend, SyncRequest};
