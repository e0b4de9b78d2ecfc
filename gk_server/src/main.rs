//! Authentication server.
//!
//! Serves the gatekeeper session core over HTTP, backed by PostgreSQL when a
//! database URL is configured and by in-memory stores otherwise.

use std::net::SocketAddr;

use anyhow::{Context, Error};
use gatekeeper::db::Database;
use gk_server::{
    api::{self, AppState},
    config::ServerConfig,
    logging, metrics,
};
use pico_args::Arguments;

const HELP: &str = "\
Run the gatekeeper authentication server

USAGE:
  gk_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL, in-memory if unset]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                  Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL                 PostgreSQL connection string
  JWT_SECRET                   Access token signing secret (required, >= 32 chars)
  PASSWORD_PEPPER              Password hashing pepper
  JWT_ACCESS_EXPIRES_MINUTES   Access token lifetime [default: 15]
  JWT_REFRESH_EXPIRES_DAYS     Refresh token lifetime [default: 7]
  METRICS_BIND                 Prometheus exporter address (disabled if unset)
  RUST_LOG                     Log filter [default: info,sqlx=warn,hyper=warn]
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url)?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        tracing::info!("Prometheus exporter listening on {}", addr);
    }

    let state = match &config.database {
        Some(db_config) => {
            tracing::info!("Connecting to database");
            let db = Database::new(db_config)
                .await
                .context("Failed to connect to database")?;
            db.migrate().await.context("Failed to apply schema")?;
            tracing::info!("Database connected successfully");
            AppState::with_database(db, &config.auth)?
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores, sessions will not survive a restart");
            AppState::in_memory(&config.auth)?
        }
    };
    let database = state.database.clone();

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    tracing::info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down server...");
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
