//! Headless Mode
//!
//! Runs a single sync without the terminal UI. Status lines go to stdout as
//! they are applied; logs go to stderr.

use std::io::{self, Write};

use anyhow::{bail, Context};
use tokio::sync::mpsc;

use shift_sync_core::{
    AccessTokenGrant, FormField, HttpSyncBackend, NotifyLevel, SurfaceEvent, SyncBackend,
    SyncConductor, SyncMessage, SyncState, SyncSummary,
};

use crate::app::MESSAGE_CAPACITY;
use crate::cli::Cli;

/// Everything one headless sync needs
#[derive(Clone, Debug, Default)]
pub struct HeadlessInputs {
    /// Google access token
    pub token: String,
    /// Venue ID
    pub venue: String,
    /// Venue user ID
    pub user: String,
    /// Venue PIN
    pub pin: String,
}

/// Drive one sync to completion, writing progress to `writer`
///
/// Returns the final state and the writer once every message has been
/// printed.
///
/// # Errors
///
/// Returns an error if the credential or the request is rejected before any
/// network activity.
pub async fn run_headless<B, W>(
    mut conductor: SyncConductor<B>,
    rx: mpsc::Receiver<SyncMessage>,
    inputs: HeadlessInputs,
    writer: W,
) -> anyhow::Result<(SyncState, W)>
where
    B: SyncBackend + 'static,
    W: Write + Send + 'static,
{
    // Drain messages concurrently so a long stream never fills the channel
    let printer = tokio::spawn(print_messages(rx, writer));

    conductor.handle_event(SurfaceEvent::Connected).await;
    for (field, value) in [
        (FormField::VenueId, inputs.venue),
        (FormField::Username, inputs.user),
        (FormField::Pin, inputs.pin),
    ] {
        conductor.update_field(field, value).await;
    }

    let started = match AccessTokenGrant::parse(&inputs.token) {
        Ok(grant) => match conductor.set_credential(grant.access_token).await {
            Ok(()) => conductor.request_sync().await,
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };

    let state = match started {
        Ok(()) => conductor.run_until_settled().await,
        Err(e) => {
            tracing::error!(error = %e, "Sync rejected");
            drop(conductor);
            printer.await.context("Status printer panicked")??;
            return Err(e.into());
        }
    };

    // Closing the channel ends the printer
    drop(conductor);
    let writer = printer.await.context("Status printer panicked")??;

    Ok((state, writer))
}

/// Print status lines until the conductor goes away
async fn print_messages<W: Write>(
    mut rx: mpsc::Receiver<SyncMessage>,
    mut writer: W,
) -> io::Result<W> {
    let mut syncing = false;

    while let Some(msg) = rx.recv().await {
        match msg {
            SyncMessage::State { state } => {
                syncing = state.is_active();
            }
            SyncMessage::Status { text } if syncing => {
                writeln!(writer, "{text}")?;
            }
            SyncMessage::Status { .. } => {}
            SyncMessage::Notify { level, message } => {
                writeln!(writer, "[{}] {message}", level_tag(level))?;
            }
            SyncMessage::SyncFinished { summary } => {
                writeln!(writer, "{}", summary_line(&summary))?;
            }
            SyncMessage::Quit => break,
        }
        writer.flush()?;
    }

    Ok(writer)
}

fn level_tag(level: NotifyLevel) -> &'static str {
    match level {
        NotifyLevel::Info => "info",
        NotifyLevel::Warning => "warning",
        NotifyLevel::Error => "error",
    }
}

/// One-line wrap-up printed after the stream settles
fn summary_line(summary: &SyncSummary) -> String {
    let mut line = format!("{} status update(s) applied", summary.events_applied);
    if summary.decode_errors > 0 {
        line.push_str(&format!(", {} skipped", summary.decode_errors));
    }
    if summary.discarded_bytes > 0 {
        line.push_str(&format!(
            ", {} byte(s) of an incomplete frame dropped",
            summary.discarded_bytes
        ));
    }
    line
}

/// Headless entry point used by `main`
///
/// # Errors
///
/// Returns an error for missing flags, bad configuration, a rejected
/// request, or a sync that ends in `Failed`.
pub async fn run(cli: &Cli) -> anyhow::Result<()> {
    let missing = cli.missing_headless_inputs();
    if !missing.is_empty() {
        bail!("--headless requires {}", missing.join(", "));
    }

    let config = cli.resolve_config().context("Invalid configuration")?;
    tracing::info!(source = %config.source(), url = %config.base_url, "Configuration resolved");

    let backend = HttpSyncBackend::from_config(&config)?;
    let (tx, rx) = mpsc::channel(MESSAGE_CAPACITY);
    let conductor = SyncConductor::new(backend, config, tx);

    let inputs = HeadlessInputs {
        token: cli.token.clone().unwrap_or_default(),
        venue: cli.venue.clone().unwrap_or_default(),
        user: cli.user.clone().unwrap_or_default(),
        pin: cli.pin.clone().unwrap_or_default(),
    };

    let (state, _) = run_headless(conductor, rx, inputs, io::stdout()).await?;
    match state {
        SyncState::Done => Ok(()),
        SyncState::Failed(e) => bail!("Sync failed: {e}"),
        other => bail!("Sync ended in unexpected state: {other}"),
    }
}
