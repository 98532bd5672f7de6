//! Inbound frame loop.
//!
//! Robot → client traffic is an endless repetition of one 28-byte
//! telemetry frame followed by one length-prefixed video payload. The
//! reader accumulates raw socket bytes in an append-only buffer,
//! consumes whole frames by exact size, and publishes the results:
//! telemetry into [`RobotState`], payload bytes into the incoming
//! [`VideoBuffer`] (which wakes the decode collaborator).
//!
//! There is no marker to re-synchronize against, so any framing error
//! is fatal: the loop reports `Desynced` and terminates rather than
//! guess at an alignment and silently corrupt every following frame.

use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tracing::{error, info, warn};

use crate::client::LinkConfig;
use crate::connection::ConnectionReader;
use crate::error::LinkError;
use crate::state::{RobotState, VideoBuffer};
use crate::status::{LinkHealth, StatusSender};
use crate::wire::{LEN_PREFIX_SIZE, TelemetryFrame, decode_len_prefix};

/// The inbound frame loop.
pub struct FrameReader {
    conn: ConnectionReader,
    robot: Arc<RobotState>,
    incoming: VideoBuffer,
    status: StatusSender,
    accumulator: BytesMut,
    max_payload: u64,
    recv_timeout: Option<Duration>,
}

impl FrameReader {
    pub fn new(
        conn: ConnectionReader,
        robot: Arc<RobotState>,
        incoming: VideoBuffer,
        status: StatusSender,
        config: &LinkConfig,
    ) -> Self {
        Self {
            conn,
            robot,
            incoming,
            status,
            accumulator: BytesMut::with_capacity(crate::connection::RECV_CHUNK),
            max_payload: config.max_payload,
            recv_timeout: config.recv_timeout,
        }
    }

    /// Run the read loop until the link dies.
    ///
    /// Publishes the matching health state before returning: `Desynced`
    /// for framing errors, `Disconnected` otherwise. A local close is a
    /// clean stop, not an error.
    pub async fn run(&mut self) -> Result<(), LinkError> {
        loop {
            if let Err(e) = self.read_cycle().await {
                let health = if e.is_desync() {
                    LinkHealth::Desynced
                } else {
                    LinkHealth::Disconnected
                };
                self.status.set_health(health);

                return match e {
                    LinkError::Closed => {
                        info!("read loop stopped: link closed");
                        Ok(())
                    }
                    e => {
                        error!("read loop terminated: {e}");
                        Err(e)
                    }
                };
            }
        }
    }

    /// Segment one complete inbound cycle out of the stream.
    async fn read_cycle(&mut self) -> Result<(), LinkError> {
        // Fixed-size telemetry frame.
        self.fill(TelemetryFrame::SIZE).await?;
        let head = self.accumulator.split_to(TelemetryFrame::SIZE);
        let telemetry = TelemetryFrame::decode(&head)?;
        self.robot.store_telemetry(&telemetry);

        // Payload length prefix, checked against the ceiling before
        // any payload bytes are buffered.
        self.fill(LEN_PREFIX_SIZE).await?;
        let prefix = self.accumulator.split_to(LEN_PREFIX_SIZE);
        let len = decode_len_prefix(&prefix)?;
        if len > self.max_payload {
            return Err(LinkError::PayloadTooLarge {
                size: len,
                max: self.max_payload,
            });
        }

        // Payload bytes; may span many receives for multi-megabyte
        // frames. Only a fully buffered payload is ever exposed.
        let len = len as usize;
        self.fill(len).await?;
        let payload = self.accumulator.split_to(len).freeze();

        self.status.record_cycle(payload.len());
        // Publishing wakes every decode subscriber.
        self.incoming.publish(payload);
        Ok(())
    }

    /// Grow the accumulator until it holds at least `need` bytes.
    ///
    /// A configured stall deadline only logs and retries: the
    /// accumulator is still aligned with the stream, so waiting longer
    /// cannot corrupt framing.
    async fn fill(&mut self, need: usize) -> Result<(), LinkError> {
        while self.accumulator.len() < need {
            match self.recv_timeout {
                None => {
                    self.conn.receive(&mut self.accumulator).await?;
                }
                Some(deadline) => {
                    let received =
                        tokio::time::timeout(deadline, self.conn.receive(&mut self.accumulator))
                            .await;
                    match received {
                        Ok(result) => {
                            result?;
                        }
                        Err(_) => {
                            warn!(
                                "no data from robot for {deadline:?} \
                                 ({}/{need} bytes buffered); still waiting",
                                self.accumulator.len()
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
