//! Prometheus exporter for ecobee thermostats via the beestat API.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use beestat_exporter_prometheus::{
    BeestatClient, ExporterConfig, Exposition, ExpositionSettings, HttpServer,
};

/// Prometheus exporter for ecobee thermostats.
#[derive(Parser, Debug)]
#[command(name = "beestat-exporter-prometheus")]
#[command(about = "Export ecobee thermostat telemetry from beestat as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// Beestat API key (overrides config).
    #[arg(long, env = "BEESTAT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Port to serve metrics on (overrides the port of the listen address).
    #[arg(long, env = "METRIC_PORT")]
    port: Option<u16>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    // CLI and environment overrides
    if let Some(api_key) = args.api_key {
        config.beestat.api_key = api_key;
    }
    if let Some(listen) = args.listen {
        config.prometheus.listen = listen;
    }
    if let Some(port) = args.port {
        config.prometheus.set_port(port)?;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    beestat_common::init_tracing(&config.logging)?;
    config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting beestat Prometheus exporter"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let client = Arc::new(BeestatClient::new(&config.beestat)?);
    let exposition = Arc::new(Exposition::new(ExpositionSettings::from_config(
        &config.prometheus,
    )));

    let listen_addr = config
        .prometheus
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    let http_server = HttpServer::new(
        client,
        exposition,
        listen_addr,
        config.prometheus.path.clone(),
    );

    let mut http_task = tokio::spawn(async move {
        if let Err(e) = http_server.run(shutdown_rx).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Wait for shutdown signal, or for the server to stop on its own
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate_signal() => {
            info!("Received SIGTERM, shutting down...");
        }
        _ = &mut http_task => {
            anyhow::bail!("HTTP server exited unexpectedly");
        }
    }

    shutdown_tx.send(true)?;

    let _ = tokio::time::timeout(Duration::from_secs(5), http_task).await;

    info!("Exporter stopped");
    Ok(())
}

async fn terminate_signal() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        std::future::pending::<()>().await;
    }
}
