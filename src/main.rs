// Sieve - Privacy and transformation pipeline engine
// Copyright (c) 2025 Sieve Contributors
// Licensed under the MIT License

use clap::Parser;
use sieve::cli::commands::{load_config_or_default, EXIT_FATAL};
use sieve::cli::{Cli, Commands};
use sieve::config::LoggingConfig;
use sieve::logging::init_logging;
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // An invalid job file is reported by the command itself; logging falls
    // back to console-only defaults here.
    let config = load_config_or_default(&cli.config).ok();
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().map(|c| c.application.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let logging_config = config
        .map(|c| c.logging)
        .unwrap_or_else(LoggingConfig::default);

    let log_guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_FATAL);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Sieve - Privacy and transformation pipeline engine"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(wait_for_shutdown(shutdown_tx));

    let exit_code = match execute_command(&cli, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e:#}");
            EXIT_FATAL
        }
    };

    drop(log_guard);
    process::exit(exit_code);
}

/// Flip the shutdown signal on ctrl-c or SIGTERM
async fn wait_for_shutdown(shutdown_tx: watch::Sender<bool>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create SIGTERM handler, listening for Ctrl+C only");
                if tokio::signal::ctrl_c().await.is_ok() {
                    notify_shutdown(&shutdown_tx, "SIGINT");
                }
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => notify_shutdown(&shutdown_tx, "SIGINT"),
            _ = sigterm.recv() => notify_shutdown(&shutdown_tx, "SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        } else {
            notify_shutdown(&shutdown_tx, "SIGINT");
        }
    }
}

fn notify_shutdown(shutdown_tx: &watch::Sender<bool>, signal: &str) {
    tracing::info!(signal, "Shutdown signal received");
    eprintln!("\n⚠️  Shutdown signal received, stopping at the next checkpoint...");
    let _ = shutdown_tx.send(true);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Detect(args) => args.execute().await,
        Commands::Suggest(args) => args.execute().await,
        Commands::Anonymize(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::Transform(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
