//! Link orchestration.
//!
//! [`LinkClient`] is what the application embeds: it establishes the
//! connection once, spawns the read and write loops as independent
//! Tokio tasks, and hands out the shared handles they coordinate
//! through — robot state, the two video buffers, and the status
//! channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::connection::{Connection, ConnectionInfo, ShutdownHandle};
use crate::error::LinkError;
use crate::reader::FrameReader;
use crate::state::{RobotState, VideoBuffer, VideoFrames};
use crate::status::{LinkHealth, LinkStatus, StatusSender};
use crate::writer::FrameWriter;

// ── LinkConfig ───────────────────────────────────────────────────

/// Tuning knobs for [`LinkClient`].
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Ceiling for inbound payload lengths. The wire format itself
    /// imposes no bound, so the client must.
    pub max_payload: u64,
    /// Optional deadline for establishing the TCP connection.
    pub connect_timeout: Option<Duration>,
    /// Optional stall deadline for a single receive. The read loop
    /// logs and keeps waiting; framing is unaffected.
    pub recv_timeout: Option<Duration>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            max_payload: 64 * 1024 * 1024,
            connect_timeout: None,
            recv_timeout: None,
        }
    }
}

// ── LinkClient ───────────────────────────────────────────────────

/// A running link: one connection, two frame loops, shared state.
pub struct LinkClient {
    robot: Arc<RobotState>,
    outgoing: VideoBuffer,
    incoming: VideoBuffer,
    status_rx: watch::Receiver<LinkStatus>,
    shutdown: ShutdownHandle,
    reader_task: JoinHandle<Result<(), LinkError>>,
    writer_task: JoinHandle<Result<(), LinkError>>,
}

impl LinkClient {
    /// Connect to the robot and start both frame loops.
    pub async fn connect(info: &ConnectionInfo, config: LinkConfig) -> Result<Self, LinkError> {
        let (status, status_rx) = StatusSender::new();

        let conn = match config.connect_timeout {
            Some(deadline) => Connection::connect_timeout(info, deadline).await?,
            None => Connection::connect(info).await?,
        };
        let shutdown = conn.shutdown_handle();
        let (read_half, write_half) = conn.split();

        let robot = Arc::new(RobotState::new());
        let outgoing = VideoBuffer::new();
        let incoming = VideoBuffer::new();

        status.set_health(LinkHealth::Healthy);

        let mut reader = FrameReader::new(
            read_half,
            Arc::clone(&robot),
            incoming.clone(),
            status.clone(),
            &config,
        );
        let mut writer = FrameWriter::new(
            write_half,
            Arc::clone(&robot),
            outgoing.subscribe(),
            shutdown.clone(),
            status,
        );

        let reader_task = tokio::spawn(async move { reader.run().await });
        let writer_task = tokio::spawn(async move { writer.run().await });

        Ok(Self {
            robot,
            outgoing,
            incoming,
            status_rx,
            shutdown,
            reader_task,
            writer_task,
        })
    }

    /// The shared robot record. Telemetry fields are written by the
    /// read loop; command fields belong to the caller.
    pub fn robot(&self) -> Arc<RobotState> {
        Arc::clone(&self.robot)
    }

    /// Producer handle for outgoing video. Publishing wakes the write
    /// loop, which transmits one command+video cycle per payload.
    pub fn outgoing_video(&self) -> VideoBuffer {
        self.outgoing.clone()
    }

    /// Subscribe to incoming video payloads.
    pub fn incoming_video(&self) -> VideoFrames {
        self.incoming.subscribe()
    }

    /// Subscribe to link health and traffic counters.
    pub fn status(&self) -> watch::Receiver<LinkStatus> {
        self.status_rx.clone()
    }

    /// Current health snapshot.
    pub fn health(&self) -> LinkHealth {
        self.status_rx.borrow().health
    }

    /// A cloneable handle that closes the link from anywhere.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Close the link: unblocks both loops even mid-receive/send.
    pub fn close(&self) {
        self.shutdown.close();
    }

    /// Close the link and wait for both loops to finish.
    ///
    /// Returns the first fatal loop error, if any; a link that only
    /// ever stopped through [`close`](Self::close) joins clean.
    pub async fn join(self) -> Result<(), LinkError> {
        self.shutdown.close();
        let reader = self
            .reader_task
            .await
            .map_err(|_| LinkError::LoopAborted("read"))?;
        let writer = self
            .writer_task
            .await
            .map_err(|_| LinkError::LoopAborted("write"))?;
        reader.and(writer)
    }
}
