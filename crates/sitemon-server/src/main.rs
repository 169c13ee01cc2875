use anyhow::Result;
use sitemon_common::clock::{Clock, SystemClock};
use sitemon_server::app;
use sitemon_server::config::ServerConfig;
use sitemon_server::state::AppState;
use sitemon_storage::engine::SqliteStore;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  sitemon-server [config.toml]    Start the alert evaluation server");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sitemon=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(|s| s.as_str()) {
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        other => run_server(other.unwrap_or("config/server.toml")).await,
    }
}

async fn run_server(config_path: &str) -> Result<()> {
    let config = ServerConfig::load_or_default(config_path)?;

    tracing::info!(
        http_port = config.http_port,
        database = %config.database_path,
        latency_threshold_ms = config.rules.latency_threshold_ms,
        consecutive_failures = config.rules.consecutive_failures,
        "sitemon-server starting"
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(SqliteStore::open(
        Path::new(&config.database_path),
        clock.clone(),
    )?);

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.http_port).parse()?;
    let state = AppState::new(store, clock, config);
    let app = app::build_http_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
            tracing::info!("Shutting down gracefully");
        })
        .await?;

    Ok(())
}
