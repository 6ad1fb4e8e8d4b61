//! Pac-Man arcade backend server.
//!
//! Serves the account, token and score API over HTTP, backed by PostgreSQL
//! or, with `--in-memory`, by a throwaway in-process store.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Error};
use log::{info, warn};
use pa_server::{
    api::{self, AppState},
    config::ServerConfig,
    logging, metrics,
};
use pacman_arcade::{
    auth::{AuthManager, TokenService},
    db::{Database, MemoryStore, Repositories},
    game::GameManager,
};
use pico_args::Arguments;

const HELP: &str = "\
Run the Pac-Man arcade backend

USAGE:
  pa_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/pacman_arcade]

FLAGS:
  --in-memory              Keep all data in process memory (lost on exit)
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8000)
  DATABASE_URL             PostgreSQL connection string
  JWT_SECRET               JWT signing secret (required, at least 32 characters)
  PASSWORD_PEPPER          Password hashing pepper (required, at least 16 characters)
  ACCESS_TOKEN_TTL_MINUTES Access token lifetime [default: 60]
  REFRESH_TOKEN_TTL_HOURS  Refresh token lifetime [default: 24]
  REQUEST_TIMEOUT_SECS     Per-request timeout [default: 30]
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  (See .env file for all configuration options)
";

/// How often revoked-but-expired tokens are dropped from the blacklist
const BLACKLIST_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let in_memory = pargs.contains("--in-memory");
    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind, database_url, in_memory)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics exported on http://{}/metrics", addr);
    }

    let (repositories, database) = match &config.database {
        Some(db_config) => {
            info!("Connecting to database: {}", db_config.database_url);
            let db = Database::new(db_config)
                .await
                .context("Failed to connect to database")?;
            db.migrate().await.context("Failed to apply migrations")?;
            info!("Database connected and migrated");
            (db.repositories(), Some(db))
        }
        None => {
            warn!("Running with the in-memory store; all data is lost on exit");
            (Repositories::in_memory(MemoryStore::new()), None)
        }
    };

    let tokens = TokenService::with_lifetimes(
        &config.security.jwt_secret,
        config.tokens.access_ttl()?,
        config.tokens.refresh_ttl()?,
    );
    let game_manager = Arc::new(GameManager::new(repositories.sessions.clone()));
    let auth_manager = Arc::new(AuthManager::new(
        repositories,
        config.security.password_pepper.clone(),
        tokens,
    ));

    let purge_task = tokio::spawn(purge_blacklist(auth_manager.clone()));

    let app = api::create_router(
        AppState {
            auth_manager,
            game_manager,
        },
        config.request_timeout(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    purge_task.abort();
    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

/// Periodically drop blacklist entries whose tokens have expired anyway
async fn purge_blacklist(auth_manager: Arc<AuthManager>) {
    let mut interval = tokio::time::interval(BLACKLIST_PURGE_INTERVAL);
    loop {
        interval.tick().await;
        match auth_manager.purge_expired_tokens().await {
            Ok(purged) => metrics::blacklist_purged_total(purged),
            Err(e) => log::error!("Failed to purge token blacklist: {}", e),
        }
    }
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
}
