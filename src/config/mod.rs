//! Configuration module.
//!
//! Supports JSON configuration files, environment variable overrides, stdin
//! input, and sensible compiled-in defaults.
//!
//! # Module structure
//!
//! - [`types`]: Root `Config` struct
//! - [`logging`]: Logging configuration
//! - [`loader`]: Configuration loading functions
//! - [`validation`]: Configuration validation functions
//! - [`defaults`]: Default value functions

pub mod defaults;
pub mod loader;
pub mod logging;
pub mod types;
pub mod validation;

pub use loader::load;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use types::Config;
pub use validation::validate_config_security;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.room_code_length, 4);
        assert_eq!(config.logging.dir, "logs");
        assert_eq!(config.logging.filename, "server.log");
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert_eq!(LogLevel::Error.to_string(), "error");
    }
}
