//! expressway server binary.
//!
//! Loads configuration, initializes logging and metrics, builds the example
//! application and serves it until Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use expressway::config::{load_config, AppConfig};
use expressway::demo::{build_dispatcher, Services};
use expressway::observability::{logging, metrics};
use expressway::HttpServer;

#[derive(Debug, Parser)]
#[command(name = "expressway", version, about = "Express-style routing and middleware server")]
struct Cli {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "expressway starting");
    tracing::info!(
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        max_body_size = config.server.max_body_size,
        rate_limit = config.rate_limit.enabled,
        static_files = config.static_files.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let services = Services::from_config(&config);
    let dispatcher = Arc::new(build_dispatcher(&config, &services)?);
    spawn_maintenance(&config, &services);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    HttpServer::new(dispatcher, &config.server).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Periodically drop expired rate-limit windows and sessions.
fn spawn_maintenance(config: &AppConfig, services: &Services) {
    if let Some(limiter) = services.rate_limiter.clone() {
        let period = Duration::from_secs(config.rate_limit.purge_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                limiter.purge_expired();
            }
        });
    }

    let sessions = Arc::clone(&services.sessions);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            let removed = sessions.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "Purged expired sessions");
            }
        }
    });
}
