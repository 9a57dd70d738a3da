#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use lobby_signal_server::app_state::AppState;
use lobby_signal_server::config::{self, Config};
use lobby_signal_server::logging;
use lobby_signal_server::routes::{self, build_router};

/// Lobby and WebRTC signaling server for peer-to-peer multiplayer games.
#[derive(Parser, Debug)]
#[command(name = "lobby-signal-server")]
#[command(about = "An in-memory lobby and WebRTC signaling server")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load();

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let validation_result = config::validate_config_security(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Port: {}", cfg.port);
                println!("  CORS origins: {}", cfg.cors_origins);
                println!("  Room code: {} chars from \"{}\"", cfg.room_code_length, cfg.room_code_alphabet);
                println!("  Heartbeat interval: {}s", cfg.heartbeat_interval_secs);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    validation_result?;

    logging::init_with_config(&cfg.logging);

    let port = cfg.port;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let cors_origins = cfg.cors_origins.clone();

    let state = AppState::new(cfg);
    let router = build_router(&cors_origins, state.clone());

    tracing::info!(%addr, "starting lobby/signaling server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    Ok(())
}

/// Waits for Ctrl-C (or SIGTERM on unix), then notifies every connected peer
/// before letting `axum::serve` finish draining in-flight connections.
async fn shutdown_signal(state: AppState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        else {
            std::future::pending::<()>().await;
            return;
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received, notifying peers");
    tokio::time::timeout(Duration::from_secs(2), routes::broadcast_shutdown(&state))
        .await
        .ok();
}

#[cfg(test)]
mod cli_tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn test_cli_default_no_flags() {
        let cli = Cli::try_parse_from(["lobby-signal-server"]).unwrap();
        assert!(!cli.validate_config);
        assert!(!cli.print_config);
    }

    #[test]
    fn test_cli_validate_config_long() {
        let cli = Cli::try_parse_from(["lobby-signal-server", "--validate-config"]).unwrap();
        assert!(cli.validate_config);
        assert!(!cli.print_config);
    }

    #[test]
    fn test_cli_validate_config_short() {
        let cli = Cli::try_parse_from(["lobby-signal-server", "-c"]).unwrap();
        assert!(cli.validate_config);
    }

    #[test]
    fn test_cli_print_config() {
        let cli = Cli::try_parse_from(["lobby-signal-server", "--print-config"]).unwrap();
        assert!(cli.print_config);
    }

    #[test]
    fn test_cli_validate_and_print_config_conflict() {
        let result = Cli::try_parse_from([
            "lobby-signal-server",
            "--validate-config",
            "--print-config",
        ]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("cannot be used with"));
    }

    #[test]
    fn test_cli_help_contains_flags() {
        let result = Cli::try_parse_from(["lobby-signal-server", "--help"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        let help_text = err.to_string();
        assert!(help_text.contains("--validate-config"));
        assert!(help_text.contains("--print-config"));
        assert!(help_text.contains("-c"));
    }

    #[test]
    fn test_cli_version() {
        let result = Cli::try_parse_from(["lobby-signal-server", "--version"]);
        assert!(result.is_err());
    }
}
