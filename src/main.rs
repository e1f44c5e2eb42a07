//! route-tree server.
//!
//! Serves the routes declared in a TOML file, each answered by the echo
//! handler, and swaps in a freshly built route table whenever the file
//! changes.
//!
//! ```text
//!     Client Request ──▶ tower layers ──▶ axum fallback ──▶ Router (per-method trees)
//!                        (trace, timeout,                       │
//!                         request id)                           ▼
//!     Client Response ◀──────────────────────────────── handler chain / 404 / 405
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::ArcSwap;
use clap::Parser;
use tokio::net::TcpListener;

use route_tree::config::{load_config, watcher::ConfigWatcher, RouterConfig};
use route_tree::http::{self, Server};
use route_tree::lifecycle::{signals::shutdown_signal, Shutdown};
use route_tree::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "route-tree")]
#[command(about = "Radix-tree HTTP router serving configured routes", long_about = None)]
struct Args {
    /// Route configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!("route-tree v{} starting", env!("CARGO_PKG_VERSION"));

    let bind_address = args
        .bind
        .clone()
        .unwrap_or_else(|| config.listener.bind_address.clone());

    let server = match Server::from_config(&config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Invalid route table");
            return Err(e.into());
        }
    };

    tracing::info!(
        bind_address = %bind_address,
        routes = server.router().route_count(),
        request_timeout_secs = config.listener.request_timeout_secs,
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

    let timeout = server.request_timeout();
    let table: http::SharedServer = Arc::new(ArcSwap::from_pointee(server));

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on(shutdown_signal());

    // Kept alive for the lifetime of the server.
    let _watcher = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            tokio::spawn(http::apply_reloads(table.clone(), updates, shutdown.subscribe()));
            Some(handle)
        }
        None => None,
    };

    let receiver = shutdown.subscribe();
    http::serve(listener, http::app(table, timeout), receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
