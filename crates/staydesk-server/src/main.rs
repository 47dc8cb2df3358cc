//! StayDesk booking server
//!
//! This server provides:
//! - Booking intake with room conflict detection on `/sync/bookings`
//! - Confirmation, check-in, check-out and cancellation
//! - Payment recording against existing bookings
//! - Generic CRUD over rooms, guests and the other resource kinds
//! - `/healthz`, `/readyz` and Prometheus `/metrics`
//!
//! Usage:
//! ```bash
//! # With config file
//! staydesk-server --config staydesk.yaml
//!
//! # In-memory store, no config file
//! STAYDESK_DB_BACKEND=memory staydesk-server
//!
//! # Create the database and exit
//! staydesk-server --config staydesk.yaml init-db
//! ```
//!
//! Test with:
//! ```bash
//! curl -X POST http://localhost:3000/rooms \
//!   -H "Content-Type: application/json" \
//!   -d '{"id": "101", "number": "101"}'
//!
//! curl -X POST http://localhost:3000/sync/bookings \
//!   -H "Content-Type: application/json" \
//!   -d '{"room_id": "101", "check_in": "2025-12-01", "check_out": "2025-12-05"}'
//! ```

mod app;
mod config;
mod store_factory;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use config::{ServerConfig, StoreBackend};
use staydesk_observability::Metrics;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// StayDesk Server - hotel booking service
#[derive(Parser)]
#[command(name = "staydesk-server")]
#[command(about = "StayDesk booking service with room conflict detection", long_about = None)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("STAYDESK_BUILD_SHA"), ")"))]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (YAML or TOML)
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "STAYDESK_CONFIG",
        global = true
    )]
    config: Option<String>,

    /// Port to listen on (overrides config and STAYDESK_PORT)
    #[arg(short, long, value_name = "PORT", global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the booking server (default if no command specified)
    Serve,
    /// Create the SQLite database and schema, then exit
    InitDb,
    /// Load and validate the configuration, print it, then exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(config_path) => ServerConfig::from_file(config_path)
            .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", config_path, e))?,
        None => ServerConfig::default(),
    };

    // Environment overrides the file; CLI flags override both
    config.merge_env();
    if let Some(port) = cli.port {
        config.port = port;
    }

    if let Err(e) = config.validate() {
        bail!("Invalid configuration: {}", e);
    }

    init_tracing(&config)?;

    match cli.command {
        Some(Commands::CheckConfig) => check_config(&config),
        Some(Commands::InitDb) => init_db(&config).await,
        Some(Commands::Serve) | None => serve(config).await,
    }
}

fn init_tracing(config: &ServerConfig) -> anyhow::Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::new(format!("{}", log_level));

    // sqlx logs every statement at INFO; keep it quiet unless asked
    if !config.logging.log_sql_queries {
        match "sqlx=warn".parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("Warning: Failed to set sqlx log filter: {}", e),
        }
    }

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

fn check_config(config: &ServerConfig) -> anyhow::Result<()> {
    let rendered = serde_yaml::to_string(config).context("Failed to render configuration")?;
    println!("{}", rendered);
    if config.database.backend == StoreBackend::Sqlite {
        println!(
            "# database file: {}",
            shellexpand::tilde(&config.database.path)
        );
    }
    info!("Configuration is valid");
    Ok(())
}

async fn init_db(config: &ServerConfig) -> anyhow::Result<()> {
    if config.database.backend != StoreBackend::Sqlite {
        bail!(
            "init-db needs the sqlite backend (configured: {})",
            config.database.backend.as_str()
        );
    }
    let store = store_factory::create_booking_store(&config.database)
        .await
        .context("Failed to initialize database")?;
    store.ping().await.context("Database is not reachable")?;
    info!(path = %config.database.path, "Database ready");
    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    info!("Initializing StayDesk booking server");

    let store = store_factory::create_booking_store(&config.database)
        .await
        .context("Failed to open booking store")?;

    info!("Initializing observability (metrics, health endpoints)");
    let metrics = Arc::new(Metrics::new().context("Failed to register metrics")?);

    if config.notifications.enabled {
        info!(sender = %config.notifications.sender, "Guest notifications enabled (log delivery)");
    } else {
        info!("Guest notifications disabled");
    }
    if config.tenancy.require_tenant {
        info!("Requests must carry ?company_id=");
    }

    let app = app::build_app(&config, store, metrics);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("StayDesk listening on http://{}", addr);
    info!("   Booking intake: http://{}/sync/bookings", addr);
    info!("   Health:         http://{}/healthz", addr);
    info!("   Metrics:        http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["staydesk-server", "--config", "desk.yaml", "init-db"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("desk.yaml"));
        assert!(matches!(cli.command, Some(Commands::InitDb)));

        let cli = Cli::try_parse_from(["staydesk-server", "check-config", "--port", "8080"]).unwrap();
        assert_eq!(cli.port, Some(8080));
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
    }

    #[test]
    fn test_cli_defaults_to_serve() {
        let cli = Cli::try_parse_from(["staydesk-server"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[tokio::test]
    async fn test_init_db_rejects_memory_backend() {
        let mut config = ServerConfig::default();
        config.database.backend = StoreBackend::Memory;
        assert!(init_db(&config).await.is_err());
    }
}
