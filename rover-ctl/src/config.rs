//! Control client configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use rover_link::{ConnectionInfo, LinkConfig};

/// Top-level configuration for the control client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CtlConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Protocol tuning.
    pub link: LinkSettings,
    /// Monitoring output.
    pub monitor: MonitorConfig,
    /// Logging.
    pub logging: LoggingConfig,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Robot address as `host:port`.
    pub robot_address: String,
    /// Connect deadline in milliseconds. 0 waits forever.
    pub connect_timeout_ms: u64,
}

/// Protocol tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Ceiling for inbound video payload lengths, in bytes.
    pub max_payload_bytes: u64,
    /// Receive stall warning deadline in milliseconds. 0 disables it.
    pub recv_timeout_ms: u64,
}

/// Monitoring output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// How often to print a telemetry line, in milliseconds.
    pub telemetry_interval_ms: u64,
    /// Outbound command frames per second.
    pub command_rate_hz: u32,
}

/// Logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for CtlConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            link: LinkSettings::default(),
            monitor: MonitorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            robot_address: "127.0.0.1:5050".into(),
            connect_timeout_ms: 5000,
        }
    }
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            max_payload_bytes: 64 * 1024 * 1024,
            recv_timeout_ms: 0,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            telemetry_interval_ms: 1000,
            command_rate_hz: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading and conversion ───────────────────────────────────────

impl CtlConfig {
    /// Load from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// The robot's connection info, parsed from `network.robot_address`.
    pub fn robot_info(&self) -> Result<ConnectionInfo, String> {
        let addr = &self.network.robot_address;
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| format!("invalid robot address {addr:?}: expected host:port"))?;
        let port: u16 = port
            .parse()
            .map_err(|_| format!("invalid port in robot address {addr:?}"))?;
        Ok(ConnectionInfo::new(host, port))
    }

    /// The protocol tuning knobs as `rover-link` wants them.
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            max_payload: self.link.max_payload_bytes,
            connect_timeout: match self.network.connect_timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
            recv_timeout: match self.link.recv_timeout_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
