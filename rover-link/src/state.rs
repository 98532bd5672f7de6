//! Shared mutable state between the frame loops and the application.
//!
//! Nothing here takes a lock on the hot path. Safety rests on a strict
//! single-writer-per-field discipline: the read loop is the only writer
//! of telemetry fields and the incoming video slot; the application is
//! the only writer of command fields and the outgoing video slot. Every
//! field may have any number of readers.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use bytes::Bytes;
use tokio::sync::watch;

use crate::wire::{CommandFrame, TelemetryFrame};

/// Hard ceiling the drivetrain accepts for `speed`.
pub const MAX_SPEED: i32 = 60;

/// Ultrasonic range ceiling in centimetres; doubles as the
/// "nothing in range" reading the sensors report at rest.
pub const US_MAX_DIST: i32 = 200;

// ── RobotState ───────────────────────────────────────────────────

/// The live robot record: telemetry written by the read loop, command
/// fields written by the application, both read from anywhere.
///
/// All accesses are relaxed atomic loads/stores — each field is owned
/// by exactly one writer and no cross-field consistency is promised.
#[derive(Debug)]
pub struct RobotState {
    gyro: AtomicI32,
    us: [AtomicI32; 6],

    speed: AtomicI32,
    direction: AtomicI32,
    turn_speed: AtomicI32,
}

impl RobotState {
    pub fn new() -> Self {
        Self {
            gyro: AtomicI32::new(0),
            us: std::array::from_fn(|_| AtomicI32::new(US_MAX_DIST)),
            speed: AtomicI32::new(0),
            direction: AtomicI32::new(0),
            turn_speed: AtomicI32::new(0),
        }
    }

    // ── Telemetry (written by the read loop) ─────────────────────

    /// Store a freshly decoded telemetry frame. Sole caller: the read
    /// loop.
    pub fn store_telemetry(&self, frame: &TelemetryFrame) {
        self.gyro.store(frame.gyro, Ordering::Relaxed);
        for (slot, v) in self.us.iter().zip(frame.us) {
            slot.store(v, Ordering::Relaxed);
        }
    }

    /// Snapshot of the latest telemetry.
    pub fn telemetry(&self) -> TelemetryFrame {
        TelemetryFrame {
            gyro: self.gyro.load(Ordering::Relaxed),
            us: std::array::from_fn(|i| self.us[i].load(Ordering::Relaxed)),
        }
    }

    pub fn gyro(&self) -> i32 {
        self.gyro.load(Ordering::Relaxed)
    }

    /// Distance reported by ultrasonic sensor `idx` (0..6).
    pub fn us(&self, idx: usize) -> i32 {
        self.us[idx].load(Ordering::Relaxed)
    }

    // ── Commands (written by the application) ────────────────────

    pub fn set_speed(&self, v: i32) {
        self.speed.store(v, Ordering::Relaxed);
    }

    pub fn set_direction(&self, v: i32) {
        self.direction.store(v, Ordering::Relaxed);
    }

    pub fn set_turn_speed(&self, v: i32) {
        self.turn_speed.store(v, Ordering::Relaxed);
    }

    /// Snapshot of the current drive command, as the write loop sends
    /// it.
    pub fn command(&self) -> CommandFrame {
        CommandFrame {
            speed: self.speed.load(Ordering::Relaxed),
            direction: self.direction.load(Ordering::Relaxed),
            turn_speed: self.turn_speed.load(Ordering::Relaxed),
        }
    }
}

impl Default for RobotState {
    fn default() -> Self {
        Self::new()
    }
}

// ── VideoBuffer ──────────────────────────────────────────────────

/// One direction's video slot: the latest opaque payload plus its
/// new-data signal.
///
/// Backed by a `tokio::sync::watch` channel so publishing swaps the
/// buffer reference atomically and wakes every subscriber — no lock is
/// held across I/O and consumers never poll.
#[derive(Debug, Clone)]
pub struct VideoBuffer {
    tx: Arc<watch::Sender<Bytes>>,
}

impl VideoBuffer {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Bytes::new());
        Self { tx: Arc::new(tx) }
    }

    /// Store fresh payload bytes and raise the new-data signal for
    /// every subscriber.
    pub fn publish(&self, payload: Bytes) {
        self.tx.send_replace(payload);
    }

    /// Subscribe to the new-data signal. The returned consumer starts
    /// with the signal clear; only payloads published afterwards wake
    /// it.
    pub fn subscribe(&self) -> VideoFrames {
        VideoFrames {
            rx: self.tx.subscribe(),
        }
    }

    /// The latest payload, without touching any consumer's signal.
    pub fn latest(&self) -> Bytes {
        self.tx.borrow().clone()
    }
}

impl Default for VideoBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer half of a [`VideoBuffer`].
#[derive(Debug)]
pub struct VideoFrames {
    rx: watch::Receiver<Bytes>,
}

impl VideoFrames {
    /// Wait for the next new-data signal, then take the payload and
    /// clear the signal.
    ///
    /// Returns `None` once every producer handle is gone.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Whether a payload has been published since the last take.
    pub fn has_new_data(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Take the latest payload and clear the signal, without waiting.
    pub fn take(&mut self) -> Bytes {
        self.rx.borrow_and_update().clone()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn robot_state_defaults() {
        let state = RobotState::new();
        assert_eq!(state.gyro(), 0);
        for i in 0..6 {
            assert_eq!(state.us(i), US_MAX_DIST);
        }
        assert_eq!(state.command(), CommandFrame::default());
    }

    #[test]
    fn telemetry_store_visible() {
        let state = RobotState::new();
        let frame = TelemetryFrame {
            gyro: -90,
            us: [1, 2, 3, 4, 5, 6],
        };
        state.store_telemetry(&frame);
        assert_eq!(state.telemetry(), frame);
        assert_eq!(state.us(3), 4);
    }

    #[test]
    fn command_snapshot_reflects_setters() {
        let state = RobotState::new();
        state.set_speed(MAX_SPEED);
        state.set_direction(-45);
        state.set_turn_speed(30);
        assert_eq!(
            state.command(),
            CommandFrame {
                speed: 60,
                direction: -45,
                turn_speed: 30,
            }
        );
    }

    #[test]
    fn video_buffer_observe_and_clear() {
        let buf = VideoBuffer::new();
        let mut frames = buf.subscribe();

        // Fresh subscription starts with the signal clear.
        assert!(!frames.has_new_data());

        buf.publish(Bytes::from_static(b"frame-1"));
        assert!(frames.has_new_data());

        assert_eq!(frames.take(), Bytes::from_static(b"frame-1"));
        assert!(!frames.has_new_data());

        // `latest` does not consume the signal.
        buf.publish(Bytes::from_static(b"frame-2"));
        assert_eq!(buf.latest(), Bytes::from_static(b"frame-2"));
        assert!(frames.has_new_data());
    }

    #[tokio::test]
    async fn video_buffer_recv_wakes_on_publish() {
        let buf = VideoBuffer::new();
        let mut frames = buf.subscribe();

        let producer = buf.clone();
        tokio::spawn(async move {
            producer.publish(Bytes::from_static(b"payload"));
        });

        let got = frames.recv().await.unwrap();
        assert_eq!(got, Bytes::from_static(b"payload"));
    }

    #[tokio::test]
    async fn video_buffer_recv_ends_when_producers_gone() {
        let buf = VideoBuffer::new();
        let mut frames = buf.subscribe();
        drop(buf);
        assert!(frames.recv().await.is_none());
    }
}
