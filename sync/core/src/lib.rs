//! Shift Sync Core - Headless Sync Orchestration
//!
//! This crate holds everything needed to copy a venue shift schedule into a
//! Google Calendar through a remote sync job, independent of any UI. It can
//! drive the terminal UI or run headless for scripts and tests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      UI Surfaces                         │
//! │        ┌─────────┐                ┌──────────┐           │
//! │        │   TUI   │                │ Headless │           │
//! │        └────┬────┘                └────┬─────┘           │
//! │             └──────────┬───────────────┘                 │
//! │                 SurfaceEvent (up)                        │
//! │                 SyncMessage (down)                       │
//! └────────────────────────┼─────────────────────────────────┘
//!                          │
//! ┌────────────────────────┼─────────────────────────────────┐
//! │                  SyncConductor                           │
//! │  ┌────────────┐  ┌──────────┐  ┌──────────────────────┐  │
//! │  │ Credential │  │   Form   │  │ FrameDecoder (SSE)   │  │
//! │  └────────────┘  └──────────┘  └──────────┬───────────┘  │
//! │                                           │ raw chunks   │
//! │                              ┌────────────┴───────────┐  │
//! │                              │ reader task + backend  │  │
//! │                              └────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use shift_sync_core::{
//!     config::load_config, FormField, HttpSyncBackend, SurfaceEvent, SyncConductor,
//! };
//! use tokio::sync::mpsc;
//!
//! let config = load_config()?;
//! let backend = HttpSyncBackend::from_config(&config)?;
//! let (tx, mut rx) = mpsc::channel(100);
//! let mut conductor = SyncConductor::new(backend, config, tx);
//!
//! conductor.start().await;
//! conductor.handle_event(SurfaceEvent::Connected).await;
//! conductor.set_credential(token).await?;
//! conductor.update_field(FormField::VenueId, "SSE").await;
//! conductor.update_field(FormField::Username, "U1").await;
//! conductor.update_field(FormField::Pin, "1234").await;
//! conductor.request_sync().await?;
//!
//! while conductor.wait_for_stream().await {
//!     while let Ok(msg) = rx.try_recv() {
//!         // render
//!     }
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Sync job transport (HTTP streaming)
//! - [`conductor`]: The sync state machine
//! - [`config`]: TOML / environment configuration
//! - [`credential`]: Access token holder
//! - [`decoder`]: Incremental `data:` frame decoder
//! - [`events`]: Events from UI surfaces
//! - [`form`]: Venue login form validation
//! - [`messages`]: Messages to UI surfaces
//! - [`presenter`]: State to status-line projection

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod conductor;
pub mod config;
pub mod credential;
pub mod decoder;
pub mod error;
pub mod events;
pub mod form;
pub mod messages;
pub mod presenter;

pub use backend::{ByteStream, HttpSyncBackend, SyncBackend, SyncRequest};
pub use conductor::SyncConductor;
pub use config::{ConfigError, ConfigOverrides, ConfigSource, SyncConfig};
pub use credential::{AccessToken, AccessTokenGrant, CredentialHolder};
pub use decoder::{DecodedFrame, FrameDecoder, StatusEvent};
pub use error::{DecodeError, SyncError, TransportError};
pub use events::SurfaceEvent;
pub use form::{FormField, SyncForm};
pub use messages::{NotifyLevel, SyncMessage, SyncState, SyncSummary};
pub use presenter::{render, StatusView, SyncSnapshot};
