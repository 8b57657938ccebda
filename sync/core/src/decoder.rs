//! Stream Frame Decoder
//!
//! Turns the chunked body of a sync response into ordered status frames.
//!
//! # Wire Format
//!
//! ```text
//! data: {"status":"Logging into ABI..."}\n
//! \n
//! : keep-alive\n
//! \n
//! data: {"status":"Sync Complete!"}\n
//! \n
//! ```
//!
//! A frame ends at a blank line (`\n\n`). Frames are split on raw bytes, and
//! text decoding happens only once a whole frame is buffered, so a chunk
//! boundary inside a multi-byte character is harmless. Frames with no
//! `data: ` line are dropped. A frame whose payload does not parse yields a
//! [`DecodedFrame::Malformed`] and decoding continues with the next frame.
//! Bytes still buffered when the stream ends are discarded.
//!
//! One decoder serves one response stream. Feeding it chunk by chunk yields
//! frames lazily and in order, as soon as the chunk completing each arrives.
//! A frame that grows past the buffer limit without a terminator is dropped
//! as [`DecodeError::FrameTooLarge`]; the rest of it is skipped up to the
//! next blank line.

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Blank-line frame terminator
pub const FRAME_DELIMITER: &[u8] = b"\n\n";

/// Prefix of a line carrying an event payload
pub const DATA_PREFIX: &[u8] = b"data: ";

/// Default cap on bytes buffered for one unterminated frame
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// One status update from the remote sync job
///
/// Unknown fields are ignored so the job can add fields without breaking
/// older clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Human-readable progress text
    pub status: String,
}

impl StatusEvent {
    /// Create a status event
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

/// Result of decoding one complete frame
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedFrame {
    /// A well-formed status event
    Status(StatusEvent),
    /// A `data: ` frame whose payload could not be decoded
    Malformed(DecodeError),
}

/// Incremental, resumable frame decoder bound to one response stream
#[derive(Debug)]
pub struct FrameDecoder {
    /// Bytes received but not yet part of a complete frame
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to contain no delimiter
    scanned: usize,
    /// Complete frames seen so far, including dropped ones
    frames_seen: u64,
    /// Largest unterminated frame kept in `buffer`
    max_frame_bytes: usize,
    /// Discarding the tail of an oversized frame
    skipping: bool,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl FrameDecoder {
    /// Create a decoder with an empty buffer and the default frame limit
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder that drops frames longer than `max_frame_bytes`
    #[must_use]
    pub fn with_limit(max_frame_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            frames_seen: 0,
            max_frame_bytes: max_frame_bytes.max(1),
            skipping: false,
        }
    }

    /// Feed the next chunk and return every frame it completes, in order
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<DecodedFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut consumed = 0;
        // A delimiter may straddle the previous chunk's last byte
        let mut search_from = self.scanned.saturating_sub(FRAME_DELIMITER.len() - 1);

        while let Some(offset) = find_delimiter(&self.buffer[search_from..]) {
            let end = search_from + offset;
            if self.skipping {
                // End of an oversized frame that was already reported
                self.skipping = false;
            } else {
                self.frames_seen += 1;
                if let Some(frame) = decode_frame(&self.buffer[consumed..end]) {
                    frames.push(frame);
                }
            }
            consumed = end + FRAME_DELIMITER.len();
            search_from = consumed;
        }

        self.buffer.drain(..consumed);

        if self.buffer.len() > self.max_frame_bytes {
            if !self.skipping {
                self.frames_seen += 1;
                self.skipping = true;
                tracing::warn!(
                    buffered = self.buffer.len(),
                    limit = self.max_frame_bytes,
                    "Dropping oversized frame"
                );
                frames.push(DecodedFrame::Malformed(DecodeError::FrameTooLarge {
                    limit: self.max_frame_bytes,
                }));
            }
            // Keep enough to find a delimiter split across chunks
            let keep = FRAME_DELIMITER.len() - 1;
            let cut = self.buffer.len() - keep;
            self.buffer.drain(..cut);
        }

        self.scanned = self.buffer.len();
        frames
    }

    /// Number of complete frames seen, including dropped ones
    #[must_use]
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// End of stream: discard any partial frame and return its size in bytes
    pub fn finish(self) -> usize {
        let discarded = self.buffer.len();
        if discarded > 0 {
            tracing::debug!(bytes = discarded, "Discarding unterminated trailing frame");
        }
        discarded
    }
}

fn find_delimiter(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(FRAME_DELIMITER.len())
        .position(|window| window == FRAME_DELIMITER)
}

/// Decode one complete frame (delimiter excluded)
///
/// Returns `None` for frames with no `data: ` line.
fn decode_frame(frame: &[u8]) -> Option<DecodedFrame> {
    let data_lines: Vec<&[u8]> = frame
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter_map(|line| line.strip_prefix(DATA_PREFIX))
        .collect();

    if data_lines.is_empty() {
        tracing::trace!(len = frame.len(), "Dropping frame without data prefix");
        return None;
    }

    let payload = data_lines.join(&b'\n');
    let Ok(payload) = String::from_utf8(payload) else {
        return Some(DecodedFrame::Malformed(DecodeError::InvalidUtf8));
    };

    Some(match serde_json::from_str::<StatusEvent>(&payload) {
        Ok(event) => DecodedFrame::Status(event),
        Err(e) => DecodedFrame::Malformed(DecodeError::InvalidPayload {
            payload,
            message: e.to_string(),
        }),
    })
}
