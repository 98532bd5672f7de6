//! Link health reporting.
//!
//! A stalled or corrupted stream must not fail silently: the frame
//! loops publish their health and traffic counters over a watch
//! channel, and any number of observers may subscribe. Consuming the
//! signal is the embedder's concern.

use std::sync::Arc;

use tokio::sync::watch;

use crate::wire::{LEN_PREFIX_SIZE, TelemetryFrame};

// ── LinkHealth ───────────────────────────────────────────────────

/// The externally visible health of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkHealth {
    /// TCP connection not yet established.
    #[default]
    Connecting,

    /// Both loops running, stream aligned.
    Healthy,

    /// Frame alignment was lost; nothing read after this point can be
    /// trusted. Terminal — the embedder should reconnect.
    Desynced,

    /// The connection is gone: peer close, I/O failure, or local close.
    Disconnected,
}

impl std::fmt::Display for LinkHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Healthy => write!(f, "healthy"),
            Self::Desynced => write!(f, "desynced"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

impl LinkHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Whether the link is past recovery on this connection.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Desynced | Self::Disconnected)
    }
}

// ── LinkStatus ───────────────────────────────────────────────────

/// Health plus traffic counters, published as one snapshot.
#[derive(Debug, Clone, Default)]
pub struct LinkStatus {
    pub health: LinkHealth,
    /// Complete inbound cycles segmented so far.
    pub cycles_received: u64,
    /// Inbound bytes consumed, framing included.
    pub bytes_received: u64,
    /// Outbound cycles transmitted so far.
    pub frames_sent: u64,
    /// Outbound bytes transmitted, framing included.
    pub bytes_sent: u64,
}

// ── StatusSender ─────────────────────────────────────────────────

/// Shared publishing handle used by both frame loops.
#[derive(Debug, Clone)]
pub struct StatusSender {
    tx: Arc<watch::Sender<LinkStatus>>,
}

impl StatusSender {
    pub fn new() -> (Self, watch::Receiver<LinkStatus>) {
        let (tx, rx) = watch::channel(LinkStatus::default());
        (Self { tx: Arc::new(tx) }, rx)
    }

    /// Publish a health transition. No-op (and no wakeup) when the
    /// health is unchanged.
    pub fn set_health(&self, health: LinkHealth) {
        self.tx.send_if_modified(|status| {
            if status.health == health {
                return false;
            }
            status.health = health;
            true
        });
    }

    /// Record one segmented inbound cycle carrying `payload_len` bytes.
    pub fn record_cycle(&self, payload_len: usize) {
        self.tx.send_modify(|status| {
            status.cycles_received += 1;
            status.bytes_received +=
                (TelemetryFrame::SIZE + LEN_PREFIX_SIZE + payload_len) as u64;
        });
    }

    /// Record one transmitted outbound cycle of `frame_len` bytes.
    pub fn record_send(&self, frame_len: usize) {
        self.tx.send_modify(|status| {
            status.frames_sent += 1;
            status.bytes_sent += frame_len as u64;
        });
    }
}

// ── Tests ────────────────────────────────────────────────────────
