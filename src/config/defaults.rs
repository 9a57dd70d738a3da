//! Default value functions for configuration fields.
//!
//! Organized by category, following the rest of the configuration system's
//! `#[serde(default = ...)]` convention so every field has a single named
//! source of truth for its compiled-in value.

use super::logging::LogFormat;

// =============================================================================
// Root config
// =============================================================================

pub const fn default_port() -> u16 {
    3000
}

pub fn default_cors_origins() -> String {
    "*".to_string()
}

pub fn default_channel() -> String {
    "default".to_string()
}

pub const fn default_heartbeat_interval_secs() -> u64 {
    15
}

pub const fn default_room_code_length() -> usize {
    4
}

pub fn default_room_code_alphabet() -> String {
    "ABCDEFGHJKLMNPQRSTUVWXYZ23456789".to_string()
}

pub const fn default_shutdown_write_deadline_ms() -> u64 {
    500
}

// =============================================================================
// Legacy host-room defaults
// =============================================================================

pub fn default_legacy_channel() -> String {
    "default".to_string()
}

// =============================================================================
// Logging defaults
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "server.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    false
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
