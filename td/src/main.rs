//! taskd - line-protocol task processing server
//!
//! Binds the listener, serves clients until SIGINT/SIGTERM, then reports
//! what was processed.

use std::fs;
use std::future::Future;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use taskd::cli::Cli;
use taskd::config::{Config, LoggingConfig};
use taskd::server::Server;

fn log_level(verbose: bool) -> tracing::Level {
    if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}

fn env_filter(verbose: bool) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level(verbose).into())
}

/// Load config while a stderr subscriber is active, so fallback warnings show
fn load_config(cli: &Cli) -> Result<Config> {
    let bootstrap = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(cli.verbose))
        .finish();
    tracing::subscriber::with_default(bootstrap, || Config::load(cli.config.as_ref()))
}

fn setup_logging(verbose: bool, logging: &LoggingConfig) -> Result<()> {
    let level = log_level(verbose);
    let filter = env_filter(verbose);

    match &logging.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).context("Failed to create log directory")?;
            }
            let log_file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .context(format!("Failed to open log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_writer(log_file)
                .with_ansi(false)
                .with_env_filter(filter)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
    }

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => debug!("shutdown_signal: SIGINT received"),
            _ = sigterm.recv() => debug!("shutdown_signal: SIGTERM received"),
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to wait for ctrl_c");
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli).context("Failed to load configuration")?;
    config.apply_overrides(cli.host, cli.port);

    setup_logging(cli.verbose, &config.logging).context("Failed to setup logging")?;
    debug!(?config, "main: configuration resolved");

    let shutdown = shutdown_signal()?;
    let server = Server::start(&config).await?;
    let addr = server.local_addr()?;
    let registry = server.registry().clone();

    info!(%addr, concurrency = config.executor.workers(), "Server listening");
    println!("Serving on {}. Hit CTRL-C to stop.", addr);

    server.run(shutdown).await?;

    match registry.stats().await {
        Ok(stats) => info!("Processed {}", stats),
        Err(e) => warn!(error = %e, "Failed to read registry statistics"),
    }
    if let Err(e) = registry.shutdown().await {
        debug!(error = %e, "main: registry already stopped");
    }

    println!("Server shut down.");
    Ok(())
}
