//! Sticky-session reverse proxy binary.
//!
//! Loads and validates configuration, starts the metrics exporter and the
//! config watcher, then serves until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use sticky_proxy::config::{load_config, ConfigWatcher, ProxyConfig};
use sticky_proxy::http::HttpServer;
use sticky_proxy::lifecycle::Shutdown;
use sticky_proxy::observability::{logging, metrics};
use sticky_proxy::session::SessionStateRegistry;

#[derive(Parser)]
#[command(name = "sticky-proxy")]
#[command(about = "Reverse proxy with cookie-based session affinity", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load and validate the configuration, then exit.
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let registry = Arc::new(SessionStateRegistry::with_builtin());

    let config = match &cli.config {
        Some(path) => load_config(path, &registry)?,
        None => ProxyConfig::default(),
    };

    if cli.validate {
        println!("{}", serde_json::to_string_pretty(&config)?);
        eprintln!("configuration OK");
        return Ok(());
    }

    logging::init(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        backends = config.backends.len(),
        session_filter = config.session.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Hot reload only makes sense with a config file to watch.
    let (config_updates, _watcher_handle) = match &cli.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            let handle = watcher.run(registry.clone())?;
            (rx, Some(handle))
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (rx, None)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown.trigger();
        }
    });

    let server = HttpServer::with_registry(config, registry)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
