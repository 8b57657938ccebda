//! Sync Conductor - The Orchestration Core
//!
//! The conductor owns the sync lifecycle. It holds the credential and the
//! form, decides when a sync may start, runs exactly one stream reader per
//! sync, and applies decoded status events in arrival order.
//!
//! # Design Philosophy
//!
//! The conductor is UI-agnostic. It communicates through:
//! - `SyncMessage`: sent TO the UI surface
//! - `SurfaceEvent`: received FROM the UI surface
//!
//! Reading the response body happens on a spawned task that only forwards raw
//! chunks. Decoding and every state transition happen here, on the caller's
//! task, either through [`SyncConductor::poll_stream`] (non-blocking, for
//! render loops) or [`SyncConductor::wait_for_stream`] (awaits the next chunk).
//!
//! # State Machine
//!
//! ```text
//! Idle ──► AwaitingCredential ◄──► Ready ──► Connecting ──► Syncing ──► Done
//!                                               │              │
//!                                               └──────────────┴──► Failed
//! Done / Failed ──► Connecting   (new request, preconditions re-checked)
//! ```

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::backend::{SyncBackend, SyncRequest};
use crate::config::SyncConfig;
use crate::credential::CredentialHolder;
use crate::decoder::{DecodedFrame, FrameDecoder};
use crate::error::{SyncError, TransportError};
use crate::events::SurfaceEvent;
use crate::form::{FormField, SyncForm};
use crate::messages::{NotifyLevel, SyncMessage, SyncState, SyncSummary};
use crate::presenter::SyncSnapshot;

/// Status text applied when a request is dispatched
pub const CONNECTING_STATUS: &str = "Connecting...";

/// Status text applied when the user aborts a sync
pub const CANCELLED_STATUS: &str = "Sync cancelled";

/// Chunk forwarded from the reader task
#[derive(Debug)]
enum StreamChunk {
    /// Raw body bytes
    Data(Bytes),
    /// Request or read failure; the reader has stopped
    Failed(TransportError),
    /// Body ended cleanly; the reader has stopped
    Closed,
}

impl StreamChunk {
    fn is_terminal(&self) -> bool {
        !matches!(self, Self::Data(_))
    }

    fn reader_stopped() -> Self {
        Self::Failed(TransportError::Read(
            "stream reader stopped unexpectedly".to_string(),
        ))
    }
}

/// Per-sync resources, dropped as a unit when the sync settles
struct ActiveSync {
    rx: mpsc::Receiver<StreamChunk>,
    decoder: FrameDecoder,
    summary: SyncSummary,
    started: Instant,
    /// Cancels the reader task when dropped
    _reader: DropGuard,
}

/// The sync conductor - headless orchestration core
pub struct SyncConductor<B: SyncBackend> {
    /// Configuration
    config: SyncConfig,
    /// Remote job executor
    backend: Arc<B>,
    /// Calendar access token
    credential: CredentialHolder,
    /// Venue login fields
    form: SyncForm,
    /// Current lifecycle state
    state: SyncState,
    /// Latest applied status text
    status_text: String,
    /// Channel to the UI surface
    tx: mpsc::Sender<SyncMessage>,
    /// Running sync, if any
    active: Option<ActiveSync>,
}

impl<B: SyncBackend + 'static> SyncConductor<B> {
    /// Create a conductor in the `Idle` state
    pub fn new(backend: B, config: SyncConfig, tx: mpsc::Sender<SyncMessage>) -> Self {
        let status_text = config.idle_message.clone();
        Self {
            config,
            backend: Arc::new(backend),
            credential: CredentialHolder::new(),
            form: SyncForm::new(),
            state: SyncState::Idle,
            status_text,
            tx,
            active: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Latest applied status text, or the idle message before any sync
    pub fn current_status_text(&self) -> &str {
        &self.status_text
    }

    /// Get the form
    pub fn form(&self) -> &SyncForm {
        &self.form
    }

    /// Check if a credential is held
    pub fn has_credential(&self) -> bool {
        self.credential.has_credential()
    }

    /// Everything the presenter needs
    pub fn snapshot(&self) -> SyncSnapshot {
        SyncSnapshot {
            state: self.state.clone(),
            status_text: self.status_text.clone(),
            has_credential: self.credential.has_credential(),
            form_valid: self.form.is_valid(),
        }
    }

    /// Probe the backend and report configuration gaps
    pub async fn start(&mut self) {
        tracing::info!(
            backend = self.backend.name(),
            url = %self.config.base_url,
            max_frame_bytes = self.config.max_frame_bytes,
            "Starting sync conductor"
        );
        tracing::warn!("No stream read timeout is enforced; a stalled sync stays open until cancelled");

        if !self.backend.health_check().await {
            tracing::warn!(url = %self.config.base_url, "Sync server not reachable");
            self.notify(
                NotifyLevel::Warning,
                &format!("Sync server not reachable at {}", self.config.base_url),
            )
            .await;
        }
    }

    /// Handle an event from the UI surface
    ///
    /// Rejected actions are reported to the surface as notifications.
    pub async fn handle_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Connected => {
                self.refresh_readiness().await;
                self.send(SyncMessage::State {
                    state: self.state.clone(),
                })
                .await;
                self.send(SyncMessage::Status {
                    text: self.status_text.clone(),
                })
                .await;
            }

            SurfaceEvent::FieldChanged { field, value } => {
                self.update_field(field, value).await;
            }

            SurfaceEvent::CredentialGranted { access_token } => {
                if let Err(e) = self.set_credential(access_token).await {
                    tracing::warn!(error = %e, "Rejected credential");
                    self.notify(NotifyLevel::Error, &e.to_string()).await;
                }
            }

            SurfaceEvent::CredentialFailed { reason } => {
                tracing::warn!(reason = %reason, "Sign-in failed");
                self.notify(NotifyLevel::Error, &format!("Sign-in failed: {reason}"))
                    .await;
                self.refresh_readiness().await;
            }

            SurfaceEvent::CredentialCleared => {
                self.clear_credential().await;
            }

            SurfaceEvent::SyncRequested => {
                if let Err(e) = self.request_sync().await {
                    self.notify(NotifyLevel::Warning, &e.to_string()).await;
                }
            }

            SurfaceEvent::CancelRequested => {
                if !self.cancel().await {
                    tracing::debug!("Cancel requested with no sync running");
                }
            }

            SurfaceEvent::QuitRequested => {
                self.shutdown().await;
            }
        }
    }

    /// Store an access token
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidCredential`] for an empty token; any
    /// previously held token is kept.
    pub async fn set_credential(&mut self, token: impl Into<String>) -> Result<(), SyncError> {
        self.credential.set(token)?;
        tracing::info!("Credential stored");
        self.refresh_readiness().await;
        Ok(())
    }

    /// Drop the access token
    ///
    /// A running sync keeps running with the token it was started with.
    pub async fn clear_credential(&mut self) {
        self.credential.clear();
        tracing::info!("Credential cleared");
        if !self.state.is_active() {
            self.set_state(SyncState::AwaitingCredential).await;
        }
    }

    /// Set one form field
    pub async fn update_field(&mut self, field: FormField, value: impl Into<String>) {
        self.form.update(field, value);
        self.refresh_readiness().await;
    }

    /// Start a sync with the current form and credential
    ///
    /// Returns once the request has been handed to the reader task. Progress
    /// is applied by [`Self::poll_stream`] or [`Self::wait_for_stream`].
    ///
    /// # Errors
    ///
    /// - [`SyncError::AlreadyInProgress`] while connecting or syncing
    /// - [`SyncError::PreconditionNotMet`] without a credential, with a blank
    ///   field, or before the conductor is ready
    pub async fn request_sync(&mut self) -> Result<(), SyncError> {
        if self.state.is_active() {
            tracing::warn!(state = %self.state, "Sync already in progress");
            return Err(SyncError::AlreadyInProgress);
        }

        let Some(token) = self.credential.token().cloned() else {
            return Err(SyncError::PreconditionNotMet(
                "sign in with Google first".to_string(),
            ));
        };

        let missing = self.form.missing_fields();
        if !missing.is_empty() {
            return Err(SyncError::PreconditionNotMet(missing_fields_message(&missing)));
        }
        let request = SyncRequest::from_form(&self.form, token)?;

        if !(self.state == SyncState::Ready || self.state.is_terminal()) {
            return Err(SyncError::PreconditionNotMet(format!(
                "not ready ({})",
                self.state
            )));
        }

        tracing::info!(
            venue_id = %request.venue_id(),
            backend = self.backend.name(),
            "Starting sync"
        );

        let (chunk_tx, chunk_rx) = mpsc::channel(self.config.channel_capacity);
        let cancel = CancellationToken::new();
        tokio::spawn(read_stream(
            Arc::clone(&self.backend),
            request,
            chunk_tx,
            cancel.clone(),
        ));

        self.active = Some(ActiveSync {
            rx: chunk_rx,
            decoder: FrameDecoder::with_limit(self.config.max_frame_bytes),
            summary: SyncSummary::default(),
            started: Instant::now(),
            _reader: cancel.drop_guard(),
        });

        self.set_state(SyncState::Connecting).await;
        self.set_status(CONNECTING_STATUS).await;
        Ok(())
    }

    /// Apply every chunk that has already arrived
    ///
    /// Never waits. Returns true if there was activity.
    pub async fn poll_stream(&mut self) -> bool {
        // Collect first to avoid holding a borrow of the receiver
        let chunks = {
            let Some(active) = self.active.as_mut() else {
                return false;
            };

            let mut collected = Vec::new();
            loop {
                match active.rx.try_recv() {
                    Ok(chunk) => {
                        let is_terminal = chunk.is_terminal();
                        collected.push(chunk);
                        if is_terminal {
                            break;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        collected.push(StreamChunk::reader_stopped());
                        break;
                    }
                }
            }
            collected
        };

        if chunks.is_empty() {
            return false;
        }

        for chunk in chunks {
            self.apply_chunk(chunk).await;
        }
        true
    }

    /// Wait for the next chunk and apply it
    ///
    /// Returns false immediately if no sync is running.
    pub async fn wait_for_stream(&mut self) -> bool {
        let chunk = match self.active.as_mut() {
            Some(active) => active.rx.recv().await,
            None => return false,
        };

        self.apply_chunk(chunk.unwrap_or_else(StreamChunk::reader_stopped))
            .await;
        true
    }

    /// Drive the running sync until it settles and return the final state
    pub async fn run_until_settled(&mut self) -> SyncState {
        while self.wait_for_stream().await {}
        self.state.clone()
    }

    /// Abort the running sync
    ///
    /// Releases the reader and moves to `Failed(Cancelled)`. Returns false if
    /// nothing was running.
    pub async fn cancel(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }

        tracing::info!("Sync cancelled by user");
        self.set_status(CANCELLED_STATUS).await;
        self.finish(SyncState::Failed(SyncError::Cancelled)).await;
        true
    }

    /// Cancel any running sync and tell the surface to exit
    pub async fn shutdown(&mut self) {
        self.cancel().await;
        self.send(SyncMessage::Quit).await;
    }

    /// Re-derive `Ready` / `AwaitingCredential` outside of a sync
    async fn refresh_readiness(&mut self) {
        if self.state.is_active() || self.state.is_terminal() {
            return;
        }

        let next = if self.credential.has_credential() && self.form.is_valid() {
            SyncState::Ready
        } else {
            SyncState::AwaitingCredential
        };
        if next != self.state {
            self.set_state(next).await;
        }
    }

    async fn apply_chunk(&mut self, chunk: StreamChunk) {
        if self.active.is_none() {
            return;
        }

        match chunk {
            StreamChunk::Data(bytes) => {
                if bytes.is_empty() {
                    return;
                }
                if self.state == SyncState::Connecting {
                    self.set_state(SyncState::Syncing(self.status_text.clone()))
                        .await;
                }

                let frames = match self.active.as_mut() {
                    Some(active) => active.decoder.feed(&bytes),
                    None => return,
                };
                for frame in frames {
                    self.apply_frame(frame).await;
                }
            }

            StreamChunk::Failed(error) => {
                tracing::error!(error = %error, "Sync stream failed");
                self.set_status(&format!("Sync failed: {error}")).await;
                self.finish(SyncState::Failed(SyncError::Transport(error)))
                    .await;
            }

            StreamChunk::Closed => {
                if self
                    .active
                    .as_ref()
                    .is_some_and(|active| active.summary.events_applied == 0)
                {
                    self.set_status("Sync finished without status updates")
                        .await;
                }
                self.finish(SyncState::Done).await;
            }
        }
    }

    async fn apply_frame(&mut self, frame: DecodedFrame) {
        match frame {
            DecodedFrame::Status(event) => {
                if let Some(active) = self.active.as_mut() {
                    active.summary.events_applied += 1;
                }
                tracing::debug!(status = %event.status, "Status update");
                self.set_status(&event.status).await;
            }

            DecodedFrame::Malformed(error) => {
                if let Some(active) = self.active.as_mut() {
                    active.summary.decode_errors += 1;
                }
                let error = SyncError::Decode(error);
                tracing::warn!(error = %error, "Skipping malformed status frame");
                self.set_status("Skipped an unreadable status update").await;
                self.notify(NotifyLevel::Warning, &error.to_string()).await;
            }
        }
    }

    /// Tear down the running sync and enter a terminal state
    async fn finish(&mut self, outcome: SyncState) {
        let Some(active) = self.active.take() else {
            return;
        };

        let mut summary = active.summary;
        let frames = active.decoder.frames_seen();
        summary.discarded_bytes = active.decoder.finish();
        let elapsed_ms = u64::try_from(active.started.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::info!(
            outcome = %outcome,
            frames,
            events = summary.events_applied,
            decode_errors = summary.decode_errors,
            discarded_bytes = summary.discarded_bytes,
            elapsed_ms,
            "Sync settled"
        );

        self.set_state(outcome).await;
        self.send(SyncMessage::SyncFinished { summary }).await;
    }

    /// Set status text and notify UI
    async fn set_status(&mut self, text: &str) {
        text.clone_into(&mut self.status_text);
        if let SyncState::Syncing(current) = &mut self.state {
            text.clone_into(current);
        }
        self.send(SyncMessage::Status {
            text: text.to_string(),
        })
        .await;
    }

    /// Set state and notify UI
    async fn set_state(&mut self, state: SyncState) {
        tracing::debug!(from = %self.state, to = %state, "State transition");
        self.state = state;
        self.send(SyncMessage::State {
            state: self.state.clone(),
        })
        .await;
    }

    /// Send notification
    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(SyncMessage::Notify {
            level,
            message: message.to_string(),
        })
        .await;
    }

    /// Send a message to the UI surface
    async fn send(&self, msg: SyncMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}

/// "PIN is required", "Venue ID, PIN are required"
fn missing_fields_message(missing: &[FormField]) -> String {
    let labels: Vec<&str> = missing.iter().map(|field| field.label()).collect();
    let verb = if labels.len() == 1 { "is" } else { "are" };
    format!("{} {verb} required", labels.join(", "))
}

/// Reader task: open the stream and forward raw chunks until it ends
async fn read_stream<B: SyncBackend>(
    backend: Arc<B>,
    request: SyncRequest,
    tx: mpsc::Sender<StreamChunk>,
    cancel: CancellationToken,
) {
    let opened = tokio::select! {
        () = cancel.cancelled() => return,
        opened = backend.open_stream(&request) => opened,
    };

    let mut stream = match opened {
        Ok(stream) => stream,
        Err(e) => {
            let _ = tx.send(StreamChunk::Failed(e)).await;
            return;
        }
    };

    loop {
        let next = tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!("Stream reader cancelled");
                return;
            }
            next = stream.next() => next,
        };

        let chunk = match next {
            Some(Ok(bytes)) => StreamChunk::Data(bytes),
            Some(Err(e)) => StreamChunk::Failed(e),
            None => StreamChunk::Closed,
        };
        let is_terminal = chunk.is_terminal();

        // Receiver gone means the conductor moved on
        if tx.send(chunk).await.is_err() || is_terminal {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use futures::stream;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::backend::ByteStream;
    use crate::presenter::render;

    /// Sets the flag when the stream holding it is dropped
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    // Mock backend for testing
    #[derive(Default)]
    struct MockBackend {
        chunks: Vec<Result<&'static [u8], TransportError>>,
        open_error: Option<TransportError>,
        hold_open: bool,
        opened: Arc<AtomicUsize>,
        last_request: Arc<Mutex<Option<SyncRequest>>>,
        stream_dropped: Arc<AtomicBool>,
    }

    impl MockBackend {
        fn with_chunks(chunks: Vec<Result<&'static [u8], TransportError>>) -> Self {
            Self {
                chunks,
                ..Default::default()
            }
        }

        fn held_open(chunks: Vec<Result<&'static [u8], TransportError>>) -> Self {
            Self {
                chunks,
                hold_open: true,
                ..Default::default()
            }
        }
    }

    #[async_trait::async_trait]
    impl SyncBackend for MockBackend {
        fn name(&self) -> &str {
            "Mock"
        }

        async fn health_check(&self) -> bool {
            true
        }

        async fn open_stream(&self, request: &SyncRequest) -> Result<ByteStream, TransportError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            if let Some(ref e) = self.open_error {
                return Err(e.clone());
            }

            let flag = DropFlag(Arc::clone(&self.stream_dropped));
            let body = stream::iter(
                self.chunks
                    .clone()
                    .into_iter()
                    .map(|chunk| chunk.map(Bytes::from_static)),
            );
            let body = if self.hold_open {
                body.chain(stream::pending()).boxed()
            } else {
                body.boxed()
            };

            Ok(body
                .map(move |chunk| {
                    let _keep = &flag;
                    chunk
                })
                .boxed())
        }
    }

    fn conductor(backend: MockBackend) -> (SyncConductor<MockBackend>, mpsc::Receiver<SyncMessage>) {
        let (tx, rx) = mpsc::channel(100);
        (SyncConductor::new(backend, SyncConfig::default(), tx), rx)
    }

    async fn make_ready(conductor: &mut SyncConductor<MockBackend>) {
        conductor.handle_event(SurfaceEvent::Connected).await;
        conductor.set_credential("ya29.token").await.unwrap();
        conductor.update_field(FormField::VenueId, "SSE").await;
        conductor.update_field(FormField::Username, "U1").await;
        conductor.update_field(FormField::Pin, "1234").await;
        assert_eq!(conductor.state(), &SyncState::Ready);
    }

    fn drain(rx: &mut mpsc::Receiver<SyncMessage>) -> Vec<SyncMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    fn statuses(messages: &[SyncMessage]) -> Vec<String> {
        messages
            .iter()
            .filter_map(|msg| match msg {
                SyncMessage::Status { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    async fn wait_until(flag: &AtomicBool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !flag.load(Ordering::SeqCst) {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("flag was never set");
    }

    #[tokio::test]
    async fn test_conductor_creation() {
        let (conductor, _rx) = conductor(MockBackend::default());

        assert_eq!(conductor.state(), &SyncState::Idle);
        assert_eq!(conductor.current_status_text(), "Ready to Sync");
        assert!(!conductor.has_credential());
    }

    #[tokio::test]
    async fn test_connected_moves_to_awaiting_credential() {
        let (mut conductor, mut rx) = conductor(MockBackend::default());

        conductor.handle_event(SurfaceEvent::Connected).await;

        assert_eq!(conductor.state(), &SyncState::AwaitingCredential);
        let messages = drain(&mut rx);
        assert!(messages.contains(&SyncMessage::State {
            state: SyncState::AwaitingCredential
        }));
    }

    #[tokio::test]
    async fn test_credential_without_valid_form_stays_awaiting() {
        let (mut conductor, _rx) = conductor(MockBackend::default());
        conductor.handle_event(SurfaceEvent::Connected).await;

        conductor.set_credential("ya29.token").await.unwrap();
        assert_eq!(conductor.state(), &SyncState::AwaitingCredential);

        conductor.update_field(FormField::VenueId, "SSE").await;
        conductor.update_field(FormField::Username, "U1").await;
        conductor.update_field(FormField::Pin, "1234").await;
        assert_eq!(conductor.state(), &SyncState::Ready);

        conductor.update_field(FormField::Pin, "   ").await;
        assert_eq!(conductor.state(), &SyncState::AwaitingCredential);
    }

    #[tokio::test]
    async fn test_empty_credential_rejected() {
        let (mut conductor, mut rx) = conductor(MockBackend::default());
        conductor.handle_event(SurfaceEvent::Connected).await;
        drain(&mut rx);

        conductor
            .handle_event(SurfaceEvent::CredentialGranted {
                access_token: "  ".to_string(),
            })
            .await;

        assert!(!conductor.has_credential());
        assert_eq!(conductor.state(), &SyncState::AwaitingCredential);
        assert!(drain(&mut rx)
            .iter()
            .any(|msg| matches!(msg, SyncMessage::Notify { level: NotifyLevel::Error, .. })));
    }

    #[tokio::test]
    async fn test_full_sync_reaches_done() {
        let (mut conductor, mut rx) = conductor(MockBackend::with_chunks(vec![
            Ok(&b"data: {\"status\":\"Logging into ABI...\"}\n\ndata: {\"sta"[..]),
            Ok(&b"tus\":\"Sync Complete!\"}\n\n"[..]),
        ]));
        make_ready(&mut conductor).await;
        drain(&mut rx);

        conductor.request_sync().await.unwrap();
        assert_eq!(conductor.state(), &SyncState::Connecting);
        assert_eq!(conductor.current_status_text(), CONNECTING_STATUS);

        let state = conductor.run_until_settled().await;
        assert_eq!(state, SyncState::Done);
        assert_eq!(conductor.current_status_text(), "Sync Complete!");

        let messages = drain(&mut rx);
        assert_eq!(
            statuses(&messages),
            vec!["Connecting...", "Logging into ABI...", "Sync Complete!"]
        );
        assert!(messages.contains(&SyncMessage::State {
            state: SyncState::Syncing("Connecting...".to_string())
        }));
        assert_eq!(
            messages.last(),
            Some(&SyncMessage::SyncFinished {
                summary: SyncSummary {
                    events_applied: 2,
                    decode_errors: 0,
                    discarded_bytes: 0,
                }
            })
        );
    }

    #[tokio::test]
    async fn test_request_uses_form_and_credential() {
        let backend = MockBackend::with_chunks(vec![]);
        let last_request = Arc::clone(&backend.last_request);
        let (mut conductor, _rx) = conductor(backend);
        make_ready(&mut conductor).await;

        conductor.request_sync().await.unwrap();
        conductor.run_until_settled().await;

        let request = last_request.lock().unwrap().clone().unwrap();
        assert_eq!(
            request,
            SyncRequest::new(
                "SSE",
                "U1",
                "1234",
                crate::credential::AccessToken::new("ya29.token").unwrap()
            )
            .unwrap()
        );
        assert_eq!(
            conductor.current_status_text(),
            "Sync finished without status updates"
        );
    }

    #[tokio::test]
    async fn test_malformed_frame_does_not_fail_sync() {
        let (mut conductor, mut rx) = conductor(MockBackend::with_chunks(vec![Ok(
            &b"data: {not json}\n\ndata: {\"status\":\"Accessing Schedule...\"}\n\n"[..],
        )]));
        make_ready(&mut conductor).await;
        drain(&mut rx);

        conductor.request_sync().await.unwrap();
        assert_eq!(conductor.run_until_settled().await, SyncState::Done);

        let messages = drain(&mut rx);
        assert_eq!(
            statuses(&messages),
            vec![
                "Connecting...",
                "Skipped an unreadable status update",
                "Accessing Schedule..."
            ]
        );
        assert!(messages.iter().any(|msg| matches!(
            msg,
            SyncMessage::SyncFinished {
                summary: SyncSummary {
                    events_applied: 1,
                    decode_errors: 1,
                    ..
                }
            }
        )));
    }

    #[tokio::test]
    async fn test_truncated_stream_discards_partial_frame() {
        let (mut conductor, mut rx) = conductor(MockBackend::with_chunks(vec![
            Ok(&b"data: {\"status\":\"Found 3 shifts. Uploading...\"}\n\n"[..]),
            Ok(&b"data: {\"stat"[..]),
        ]));
        make_ready(&mut conductor).await;
        drain(&mut rx);

        conductor.request_sync().await.unwrap();
        assert_eq!(conductor.run_until_settled().await, SyncState::Done);
        assert_eq!(
            conductor.current_status_text(),
            "Found 3 shifts. Uploading..."
        );

        let messages = drain(&mut rx);
        assert!(messages.contains(&SyncMessage::SyncFinished {
            summary: SyncSummary {
                events_applied: 1,
                decode_errors: 0,
                discarded_bytes: 12,
            }
        }));
    }

    #[tokio::test]
    async fn test_open_failure_moves_to_failed() {
        let backend = MockBackend {
            open_error: Some(TransportError::Status {
                status: 500,
                body: "boom".to_string(),
            }),
            ..Default::default()
        };
        let (mut conductor, _rx) = conductor(backend);
        make_ready(&mut conductor).await;

        conductor.request_sync().await.unwrap();
        let state = conductor.run_until_settled().await;

        assert_eq!(
            state,
            SyncState::Failed(SyncError::Transport(TransportError::Status {
                status: 500,
                body: "boom".to_string(),
            }))
        );
        assert_eq!(
            conductor.current_status_text(),
            "Sync failed: Sync endpoint returned 500: boom"
        );
    }

    #[tokio::test]
    async fn test_read_error_after_data_moves_to_failed() {
        let (mut conductor, _rx) = conductor(MockBackend::with_chunks(vec![
            Ok(&b"data: {\"status\":\"Logging into ABI...\"}\n\n"[..]),
            Err(TransportError::Read("connection reset".to_string())),
        ]));
        make_ready(&mut conductor).await;

        conductor.request_sync().await.unwrap();
        assert!(matches!(
            conductor.run_until_settled().await,
            SyncState::Failed(SyncError::Transport(TransportError::Read(_)))
        ));
    }

    #[tokio::test]
    async fn test_request_while_syncing_is_rejected() {
        let backend = MockBackend::held_open(vec![Ok(&b"data: {\"status\":\"Logging into ABI...\"}\n\n"[..])]);
        let opened = Arc::clone(&backend.opened);
        let (mut conductor, _rx) = conductor(backend);
        make_ready(&mut conductor).await;

        conductor.request_sync().await.unwrap();
        assert!(conductor.wait_for_stream().await);
        assert_eq!(
            conductor.state(),
            &SyncState::Syncing("Logging into ABI...".to_string())
        );

        assert_eq!(
            conductor.request_sync().await,
            Err(SyncError::AlreadyInProgress)
        );
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(
            conductor.state(),
            &SyncState::Syncing("Logging into ABI...".to_string())
        );
    }

    #[tokio::test]
    async fn test_request_with_empty_pin_is_rejected() {
        let backend = MockBackend::default();
        let opened = Arc::clone(&backend.opened);
        let (mut conductor, _rx) = conductor(backend);
        conductor.handle_event(SurfaceEvent::Connected).await;
        conductor.set_credential("ya29.token").await.unwrap();
        conductor.update_field(FormField::VenueId, "SSE").await;
        conductor.update_field(FormField::Username, "U1").await;

        assert_eq!(
            conductor.request_sync().await,
            Err(SyncError::PreconditionNotMet("PIN is required".to_string()))
        );
        tokio::task::yield_now().await;
        assert_eq!(opened.load(Ordering::SeqCst), 0);
        assert_eq!(conductor.state(), &SyncState::AwaitingCredential);
    }

    #[tokio::test]
    async fn test_request_names_every_blank_field() {
        let (mut conductor, _rx) = conductor(MockBackend::default());
        conductor.handle_event(SurfaceEvent::Connected).await;
        conductor.set_credential("ya29.token").await.unwrap();
        conductor.update_field(FormField::Username, "U1").await;

        assert_eq!(
            conductor.request_sync().await,
            Err(SyncError::PreconditionNotMet(
                "Venue ID, PIN are required".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_rendered_view_follows_each_frame() {
        let (mut conductor, _rx) = conductor(MockBackend::with_chunks(vec![
            Ok(&b"data: {\"status\":\"Connecting...\"}\n\n"[..]),
            Ok(&b"data: {\"status\":\"Done\"}\n\n"[..]),
        ]));
        make_ready(&mut conductor).await;

        let view = |conductor: &SyncConductor<MockBackend>| {
            let view = render(&conductor.snapshot());
            (view.text, view.spinner_visible)
        };

        tokio_test::assert_ok!(conductor.request_sync().await);
        let mut views = vec![view(&conductor)];
        while conductor.wait_for_stream().await {
            views.push(view(&conductor));
        }

        assert_eq!(
            views,
            vec![
                ("Connecting...".to_string(), true),
                ("Connecting...".to_string(), true),
                ("Done".to_string(), true),
                ("Done".to_string(), false),
            ]
        );
        assert_eq!(conductor.state(), &SyncState::Done);
        assert!(!conductor.wait_for_stream().await);
    }

    #[tokio::test]
    async fn test_oversized_frame_is_skipped() {
        let mut config = SyncConfig::default();
        config.max_frame_bytes = 32;
        let (tx, mut rx) = mpsc::channel(100);
        let mut conductor = SyncConductor::new(
            MockBackend::with_chunks(vec![
                Ok(&b"data: {\"status\":\"xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx"[..]),
                Ok(&b"\"}\n\ndata: {\"status\":\"Uploading...\"}\n\n"[..]),
            ]),
            config,
            tx,
        );
        make_ready(&mut conductor).await;
        drain(&mut rx);

        conductor.request_sync().await.unwrap();
        assert_eq!(conductor.run_until_settled().await, SyncState::Done);
        assert_eq!(conductor.current_status_text(), "Uploading...");

        let messages = drain(&mut rx);
        assert!(messages.iter().any(|msg| matches!(
            msg,
            SyncMessage::Notify {
                level: NotifyLevel::Warning,
                message,
            } if message.contains("32 bytes")
        )));
        assert!(messages.contains(&SyncMessage::SyncFinished {
            summary: SyncSummary {
                events_applied: 1,
                decode_errors: 1,
                discarded_bytes: 0,
            }
        }));
    }

    #[tokio::test]
    async fn test_request_without_credential_is_rejected() {
        let (mut conductor, mut rx) = conductor(MockBackend::default());
        conductor.handle_event(SurfaceEvent::Connected).await;
        drain(&mut rx);

        conductor.handle_event(SurfaceEvent::SyncRequested).await;

        assert_eq!(conductor.state(), &SyncState::AwaitingCredential);
        assert!(drain(&mut rx)
            .iter()
            .any(|msg| matches!(msg, SyncMessage::Notify { level: NotifyLevel::Warning, .. })));
    }

    #[tokio::test]
    async fn test_cancel_releases_reader() {
        let backend = MockBackend::held_open(vec![Ok(&b"data: {\"status\":\"Logging into ABI...\"}\n\n"[..])]);
        let dropped = Arc::clone(&backend.stream_dropped);
        let (mut conductor, _rx) = conductor(backend);
        make_ready(&mut conductor).await;

        conductor.request_sync().await.unwrap();
        assert!(conductor.wait_for_stream().await);

        assert!(conductor.cancel().await);
        assert_eq!(conductor.state(), &SyncState::Failed(SyncError::Cancelled));
        assert_eq!(conductor.current_status_text(), CANCELLED_STATUS);
        wait_until(&dropped).await;

        // Nothing left to cancel
        assert!(!conductor.cancel().await);
        assert!(!conductor.poll_stream().await);
    }

    #[tokio::test]
    async fn test_dropping_conductor_releases_reader() {
        let backend = MockBackend::held_open(vec![Ok(&b": keep-alive\n\n"[..])]);
        let dropped = Arc::clone(&backend.stream_dropped);
        let (mut conductor, _rx) = conductor(backend);
        make_ready(&mut conductor).await;

        conductor.request_sync().await.unwrap();
        assert!(conductor.wait_for_stream().await);
        drop(conductor);

        wait_until(&dropped).await;
    }

    #[tokio::test]
    async fn test_poll_stream_applies_available_chunks() {
        let (mut conductor, _rx) = conductor(MockBackend::with_chunks(vec![Ok(
            &b"data: {\"status\":\"Done\"}\n\n"[..],
        )]));
        make_ready(&mut conductor).await;
        conductor.request_sync().await.unwrap();

        tokio::time::timeout(Duration::from_secs(2), async {
            while !conductor.state().is_terminal() {
                conductor.poll_stream().await;
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        assert_eq!(conductor.state(), &SyncState::Done);
        assert_eq!(conductor.current_status_text(), "Done");
    }

    #[tokio::test]
    async fn test_clear_credential_mid_sync_keeps_sync_running() {
        let backend = MockBackend::held_open(vec![Ok(&b"data: {\"status\":\"Logging into ABI...\"}\n\n"[..])]);
        let (mut conductor, _rx) = conductor(backend);
        make_ready(&mut conductor).await;
        conductor.request_sync().await.unwrap();
        assert!(conductor.wait_for_stream().await);

        conductor.handle_event(SurfaceEvent::CredentialCleared).await;
        assert!(conductor.state().is_active());

        conductor.cancel().await;
        assert_eq!(
            conductor.request_sync().await,
            Err(SyncError::PreconditionNotMet(
                "sign in with Google first".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_clear_credential_after_done() {
        let (mut conductor, _rx) = conductor(MockBackend::with_chunks(vec![]));
        make_ready(&mut conductor).await;
        conductor.request_sync().await.unwrap();
        assert_eq!(conductor.run_until_settled().await, SyncState::Done);

        conductor.clear_credential().await;
        assert_eq!(conductor.state(), &SyncState::AwaitingCredential);
    }

    #[tokio::test]
    async fn test_retry_after_done() {
        let backend = MockBackend::with_chunks(vec![Ok(&b"data: {\"status\":\"Done\"}\n\n"[..])]);
        let opened = Arc::clone(&backend.opened);
        let (mut conductor, _rx) = conductor(backend);
        make_ready(&mut conductor).await;

        conductor.request_sync().await.unwrap();
        assert_eq!(conductor.run_until_settled().await, SyncState::Done);

        conductor.request_sync().await.unwrap();
        assert_eq!(conductor.state(), &SyncState::Connecting);
        assert_eq!(conductor.current_status_text(), CONNECTING_STATUS);
        assert_eq!(conductor.run_until_settled().await, SyncState::Done);
        assert_eq!(opened.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_quit_sends_quit() {
        let (mut conductor, mut rx) = conductor(MockBackend::default());
        conductor.handle_event(SurfaceEvent::QuitRequested).await;
        assert_eq!(drain(&mut rx), vec![SyncMessage::Quit]);
    }
}
