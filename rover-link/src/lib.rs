//! # rover-link
//!
//! Protocol core for driving a remote rover over one persistent TCP
//! connection: continuous sensor telemetry and video in, drive
//! commands and video out, on independent read and write loops.
//!
//! This crate contains:
//! - **Wire types**: `TelemetryFrame`, `CommandFrame`, length-prefixed payload framing
//! - **Connection**: `Connection` with cancellation-aware receive/send halves
//! - **Frame loops**: `FrameReader` / `FrameWriter`
//! - **Shared state**: `RobotState`, `VideoBuffer` — lock-free, single writer per field
//! - **Status**: `LinkHealth` / `LinkStatus` health reporting
//! - **Client**: `LinkClient`, the embedding-facing orchestrator
//! - **Error**: `LinkError` — typed, `thiserror`-based error hierarchy

pub mod client;
pub mod connection;
pub mod error;
pub mod reader;
pub mod state;
pub mod status;
pub mod wire;
pub mod writer;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use client::{LinkClient, LinkConfig};
pub use connection::{
    Connection, ConnectionInfo, ConnectionReader, ConnectionWriter, RECV_CHUNK, ShutdownHandle,
};
pub use error::LinkError;
pub use reader::FrameReader;
pub use state::{MAX_SPEED, RobotState, US_MAX_DIST, VideoBuffer, VideoFrames};
pub use status::{LinkHealth, LinkStatus, StatusSender};
pub use wire::{CommandFrame, LEN_PREFIX_SIZE, TelemetryFrame};
pub use writer::FrameWriter;
