//! Truco server: one actor per live match behind an HTTP/WebSocket API.

use std::sync::Arc;

use anyhow::Error;
use log::info;
use pico_args::Arguments;
use tokio::sync::watch;
use truco::{
    db::{Database, InMemoryMatchRepository, MatchRepository, PgMatchRepository},
    table::MatchManager,
};
use truco_server::{
    api,
    config::{Overrides, ServerConfig, StorageBackend},
    logging, metrics,
};

const HELP: &str = "\
Run a Truco Paulista match server

USAGE:
  truco_server [OPTIONS]

OPTIONS:
  --bind           IP:PORT   Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --storage        KIND      memory or postgres          [default: env STORAGE or memory]
  --db-url         URL       Database connection string  [default: env DATABASE_URL]
  --points-to-win  N         Default match threshold     [default: env POINTS_TO_WIN or 12]

FLAGS:
  -h, --help                 Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  STORAGE                  Match storage backend
  DATABASE_URL             PostgreSQL connection string
  POINTS_TO_WIN            Points needed to win a match
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  RUST_LOG                 Log filter (default: info,sqlx=warn,hyper=warn)
";

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

    let overrides = Overrides {
        bind: pargs.opt_value_from_str("--bind")?,
        storage: pargs.opt_value_from_str("--storage")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        points_to_win: pargs.opt_value_from_str("--points-to-win")?,
    };

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    logging::init();
    info!(
        "Starting Truco server at {} with {} storage",
        config.bind, config.storage
    );

    // Ctrl+C and SIGTERM both trigger a graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(true);
    })?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics exported at http://{addr}/metrics");
    }

    let (repository, database): (Arc<dyn MatchRepository>, Option<Database>) =
        match (config.storage, &config.database) {
            (StorageBackend::Postgres, Some(db_config)) => {
                let db = Database::new(db_config)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
                let repository = PgMatchRepository::new(db.pool().clone());
                repository.ensure_schema().await?;
                info!("Database connected successfully");
                let repository: Arc<dyn MatchRepository> = Arc::new(repository);
                (repository, Some(db))
            }
            (StorageBackend::Postgres, None) => {
                return Err(anyhow::anyhow!("PostgreSQL storage needs DATABASE_URL"));
            }
            (StorageBackend::Memory, _) => {
                let repository: Arc<dyn MatchRepository> = Arc::new(InMemoryMatchRepository::new());
                (repository, None)
            }
        };

    let manager = MatchManager::new(repository);
    let state = api::AppState::new(manager.clone(), database.clone(), config.default_points_to_win);
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_rx))
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    manager.shutdown().await;
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Resolves once the signal handler fired.
async fn shutdown_signal(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}
