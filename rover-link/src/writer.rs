//! Outbound frame loop.
//!
//! Commands ride along with user video: whenever the outgoing
//! [`VideoBuffer`](crate::state::VideoBuffer) signals new data, the
//! writer snapshots the current command fields, assembles
//! `CommandFrame ++ length ++ payload` and hands the concatenation to
//! one `send_all` call — the cycle reaches the stream as a single
//! contiguous unit.
//!
//! The wait is signal-driven. The loop parks on the buffer's watch
//! notification and on the shutdown token; it never polls a flag in a
//! tight loop.

use std::sync::Arc;

use tracing::{error, info};

use crate::connection::{ConnectionWriter, ShutdownHandle};
use crate::error::LinkError;
use crate::state::{RobotState, VideoFrames};
use crate::status::{LinkHealth, StatusSender};
use crate::wire;

/// The outbound frame loop.
pub struct FrameWriter {
    conn: ConnectionWriter,
    robot: Arc<RobotState>,
    outgoing: VideoFrames,
    shutdown: ShutdownHandle,
    status: StatusSender,
}

impl FrameWriter {
    pub fn new(
        conn: ConnectionWriter,
        robot: Arc<RobotState>,
        outgoing: VideoFrames,
        shutdown: ShutdownHandle,
        status: StatusSender,
    ) -> Self {
        Self {
            conn,
            robot,
            outgoing,
            shutdown,
            status,
        }
    }

    /// Run the write loop until the link closes, the connection dies,
    /// or every producer of outgoing video is gone.
    pub async fn run(&mut self) -> Result<(), LinkError> {
        loop {
            let payload = tokio::select! {
                _ = self.shutdown.closed() => {
                    info!("write loop stopped: link closed");
                    return Ok(());
                }
                next = self.outgoing.recv() => match next {
                    Some(payload) => payload,
                    None => {
                        info!("write loop stopped: outgoing video producers gone");
                        return Ok(());
                    }
                },
            };

            let frame = wire::encode_outbound(&self.robot.command(), &payload);
            match self.conn.send_all(&frame).await {
                Ok(()) => self.status.record_send(frame.len()),
                Err(LinkError::Closed) => {
                    info!("write loop stopped: link closed");
                    return Ok(());
                }
                Err(e) => {
                    // A failed `write_all` on TCP leaves the stream
                    // unusable; there is no recoverable-send case to
                    // retry with stale data.
                    error!("write loop terminated: {e}");
                    self.status.set_health(LinkHealth::Disconnected);
                    return Err(e);
                }
            }
        }
    }
}
