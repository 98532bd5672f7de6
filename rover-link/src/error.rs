//! Domain-specific error types for the rover link.
//!
//! All fallible operations return `Result<T, LinkError>`.
//! No panics on invalid input — every error is typed.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the rover link.
#[derive(Debug, Error)]
pub enum LinkError {
    // ── Connection Errors ────────────────────────────────────────
    /// Establishing the TCP connection failed. There is no built-in
    /// retry; the caller decides whether to reconnect.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The peer closed the connection: a receive returned zero bytes.
    #[error("peer closed the connection")]
    PeerClosed,

    /// The link was closed locally via `ShutdownHandle::close`.
    #[error("link closed locally")]
    Closed,

    /// The TCP/IO layer reported an error mid-stream.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A receive exceeded its configured stall deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    // ── Framing Errors ───────────────────────────────────────────
    /// Inbound bytes did not form a valid frame. The accumulator may
    /// sit at an arbitrary offset relative to true frame boundaries
    /// afterwards, so this is fatal to the read loop.
    #[error("frame parse error: {0}")]
    FrameParse(&'static str),

    /// An inbound length prefix exceeds the configured ceiling.
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    // ── Send Errors ──────────────────────────────────────────────
    /// `send_all` failed before every byte was accepted by the socket.
    #[error("send failed: {0}")]
    Send(std::io::Error),

    // ── Task Errors ──────────────────────────────────────────────
    /// A frame loop task aborted before reporting a result.
    #[error("{0} loop aborted before reporting a result")]
    LoopAborted(&'static str),
}

impl LinkError {
    /// Whether the read loop may keep going after this error.
    ///
    /// Only a receive stall qualifies: the accumulator is still aligned
    /// with the stream, so retrying the receive cannot corrupt framing.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Whether this error means frame alignment was lost, as opposed to
    /// the connection itself dying.
    pub fn is_desync(&self) -> bool {
        matches!(self, Self::FrameParse(_) | Self::PayloadTooLarge { .. })
    }
}
