//! Root configuration struct.

use serde::{Deserialize, Serialize};

use super::defaults::{
    default_cors_origins, default_heartbeat_interval_secs, default_legacy_channel, default_port,
    default_room_code_alphabet, default_room_code_length, default_shutdown_write_deadline_ms,
};
use super::logging::LoggingConfig;

/// Effective server configuration, assembled by [`super::loader::load`] from
/// compiled defaults, an optional `config.json`, and environment overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// TCP port the HTTP/WebSocket listener binds to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Value of the `Access-Control-Allow-Origin` response header; `"*"` is permissive.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,

    /// Channel label stamped on signaling rooms created alongside a lobby.
    #[serde(default = "default_channel")]
    pub default_channel: String,

    /// Channel label used by the legacy `/session/host` endpoint when the caller omits one.
    #[serde(default = "default_legacy_channel")]
    pub legacy_default_channel: String,

    /// Idle interval between server-sent-event heartbeat frames.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,

    /// Number of characters in a generated lobby/room code.
    #[serde(default = "default_room_code_length")]
    pub room_code_length: usize,

    /// Alphabet used to generate lobby/room codes.
    #[serde(default = "default_room_code_alphabet")]
    pub room_code_alphabet: String,

    /// Per-connection write deadline enforced while broadcasting `server_shutdown`.
    #[serde(default = "default_shutdown_write_deadline_ms")]
    pub shutdown_write_deadline_ms: u64,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_channel() -> String {
    super::defaults::default_channel()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_origins: default_cors_origins(),
            default_channel: default_channel(),
            legacy_default_channel: default_legacy_channel(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            room_code_length: default_room_code_length(),
            room_code_alphabet: default_room_code_alphabet(),
            shutdown_write_deadline_ms: default_shutdown_write_deadline_ms(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Basic structural validation, run by `--validate-config` and at startup.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be nonzero");
        }
        if self.room_code_length == 0 {
            anyhow::bail!("room_code_length must be at least 1");
        }
        let alphabet_len = self.room_code_alphabet.chars().count();
        if alphabet_len < 2 {
            anyhow::bail!("room_code_alphabet must contain at least 2 distinct characters");
        }
        if self.heartbeat_interval_secs == 0 {
            anyhow::bail!("heartbeat_interval_secs must be nonzero");
        }
        Ok(())
    }
}
