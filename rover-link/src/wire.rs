//! Fixed binary layouts shared with the robot.
//!
//! Every integer is little-endian on the wire, in both directions.
//!
//! **Telemetry frame** (robot → client, 28 bytes):
//! ```text
//! gyro:     i32      (4)
//! us[0..5]: i32 × 6  (24)
//! ```
//!
//! **Command frame** (client → robot, 12 bytes):
//! ```text
//! speed:      i32  (4)
//! direction:  i32  (4)
//! turn_speed: i32  (4)
//! ```
//!
//! Each direction follows its fixed-size frame with a length-prefixed
//! video payload: a `u64` byte count, then exactly that many opaque
//! bytes. The payload's internal encoding is none of this crate's
//! business.

use bytes::{Bytes, BytesMut};

use crate::error::LinkError;

/// Encoded size of the `u64` payload length prefix.
pub const LEN_PREFIX_SIZE: usize = 8;

// ── TelemetryFrame ───────────────────────────────────────────────

/// One fixed-size telemetry record from the robot: the gyroscope
/// reading and the six ultrasonic distance sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TelemetryFrame {
    pub gyro: i32,
    pub us: [i32; 6],
}

impl TelemetryFrame {
    /// Encoded size on the wire.
    pub const SIZE: usize = 28;

    /// Serialize to bytes (little-endian).
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.gyro.to_le_bytes());
        for (i, v) in self.us.iter().enumerate() {
            let at = 4 + i * 4;
            buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
        }
        buf
    }

    /// Deserialize from bytes.
    pub fn decode(data: &[u8]) -> Result<Self, LinkError> {
        if data.len() < Self::SIZE {
            return Err(LinkError::FrameParse("telemetry frame too short"));
        }
        let mut us = [0i32; 6];
        for (i, v) in us.iter_mut().enumerate() {
            let at = 4 + i * 4;
            *v = i32::from_le_bytes(data[at..at + 4].try_into().unwrap());
        }
        Ok(Self {
            gyro: i32::from_le_bytes(data[0..4].try_into().unwrap()),
            us,
        })
    }
}

// ── CommandFrame ─────────────────────────────────────────────────

/// The drive command prepended to every outbound cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandFrame {
    pub speed: i32,
    pub direction: i32,
    pub turn_speed: i32,
}

impl CommandFrame {
    /// Encoded size on the wire.
    pub const SIZE: usize = 12;

    /// Serialize to bytes (little-endian).
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.speed.to_le_bytes());
        buf[4..8].copy_from_slice(&self.direction.to_le_bytes());
        buf[8..12].copy_from_slice(&self.turn_speed.to_le_bytes());
        buf
    }

    /// Deserialize from bytes.
    pub fn decode(data: &[u8]) -> Result<Self, LinkError> {
        if data.len() < Self::SIZE {
            return Err(LinkError::FrameParse("command frame too short"));
        }
        Ok(Self {
            speed: i32::from_le_bytes(data[0..4].try_into().unwrap()),
            direction: i32::from_le_bytes(data[4..8].try_into().unwrap()),
            turn_speed: i32::from_le_bytes(data[8..12].try_into().unwrap()),
        })
    }
}

// ── Length prefix ────────────────────────────────────────────────

/// Decode the `u64` payload length prefix.
pub fn decode_len_prefix(data: &[u8]) -> Result<u64, LinkError> {
    if data.len() < LEN_PREFIX_SIZE {
        return Err(LinkError::FrameParse("length prefix too short"));
    }
    Ok(u64::from_le_bytes(data[0..LEN_PREFIX_SIZE].try_into().unwrap()))
}

// ── Outbound cycle assembly ──────────────────────────────────────

/// Assemble a complete outbound cycle — command frame, length prefix,
/// payload — into one contiguous buffer.
///
/// The wire contract requires the cycle to hit the stream as a single
/// unit, so the caller must hand the result to one `send_all` call.
pub fn encode_outbound(cmd: &CommandFrame, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(CommandFrame::SIZE + LEN_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&cmd.encode());
    buf.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    buf.extend_from_slice(payload);
    buf.freeze()
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn telemetry_roundtrip() {
        let frame = TelemetryFrame {
            gyro: -37,
            us: [200, 0, 17, 150, 42, 199],
        };

        let encoded = frame.encode();
        assert_eq!(encoded.len(), TelemetryFrame::SIZE);
        let decoded = TelemetryFrame::decode(&encoded).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn telemetry_roundtrip_extremes() {
        let frame = TelemetryFrame {
            gyro: i32::MIN,
            us: [i32::MAX, i32::MIN, -1, 0, 1, i32::MAX],
        };

        let decoded = TelemetryFrame::decode(&frame.encode()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn telemetry_too_short() {
        let short = [0u8; 27];
        assert!(matches!(
            TelemetryFrame::decode(&short),
            Err(LinkError::FrameParse(_))
        ));
    }

    #[test]
    fn command_roundtrip() {
        let cmd = CommandFrame {
            speed: 60,
            direction: -180,
            turn_speed: 30,
        };

        let decoded = CommandFrame::decode(&cmd.encode()).unwrap();
        assert_eq!(decoded, cmd);
    }

    #[test]
    fn command_too_short() {
        assert!(CommandFrame::decode(&[0u8; 11]).is_err());
    }

    #[test]
    fn len_prefix_roundtrip() {
        let encoded = 1_000_000u64.to_le_bytes();
        assert_eq!(decode_len_prefix(&encoded).unwrap(), 1_000_000);
        assert!(decode_len_prefix(&encoded[..7]).is_err());
    }

    #[test]
    fn outbound_cycle_exact_bytes() {
        let cmd = CommandFrame {
            speed: 42,
            direction: -10,
            turn_speed: 0,
        };
        let frame = encode_outbound(&cmd, &[0x01, 0x02, 0x03]);

        let mut expected = Vec::new();
        expected.extend_from_slice(&42i32.to_le_bytes());
        expected.extend_from_slice(&(-10i32).to_le_bytes());
        expected.extend_from_slice(&0i32.to_le_bytes());
        expected.extend_from_slice(&3u64.to_le_bytes());
        expected.extend_from_slice(&[0x01, 0x02, 0x03]);

        assert_eq!(frame.len(), 23);
        assert_eq!(&frame[..], &expected[..]);
    }

    #[test]
    fn outbound_cycle_empty_payload() {
        let frame = encode_outbound(&CommandFrame::default(), &[]);
        assert_eq!(frame.len(), CommandFrame::SIZE + LEN_PREFIX_SIZE);
        assert_eq!(&frame[12..20], &0u64.to_le_bytes());
    }
}
