//! Shift Sync TUI - Terminal surface for the shift sync orchestrator
//!
//! A single-screen form: venue login fields, a Google access token, and a
//! sync button that turns into a live status line while the sync server
//! streams progress.
//!
//! # Architecture
//!
//! - **App**: event loop, embeds a `SyncConductor` and mirrors its messages
//! - **Display**: state derived from `SyncMessage`s
//! - **Input**: form buffers and focus
//! - **Widgets**: form panel, sync button, status log
//! - **Headless**: one sync without the terminal, status lines on stdout

pub mod app;
pub mod cli;
pub mod display;
pub mod headless;
pub mod input;
pub mod logging;
pub mod theme;
pub mod widgets;

pub use app::{App, Prefill};
pub use cli::Cli;
