//! Vocalis Server: trust and access-control backend.
//!
//! Main entry point that wires all crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use vocalis_api::{AppState, build_app};
use vocalis_auth::IdentityService;
use vocalis_core::config::AppConfig;
use vocalis_database::{DatabasePool, SessionRepository, UserRepository};
use vocalis_storage::FileCipher;

/// Vocalis authentication and access-control server
#[derive(Debug, Parser)]
#[command(name = "vocalis-server", version, about, long_about = None)]
struct Cli {
    /// Configuration overlay to load from `config/<env>.toml`
    /// (defaults to `$VOCALIS_ENV`, then `development`)
    #[arg(long)]
    env: Option<String>,

    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Run migrations and start the HTTP server
    Serve,
    /// Run database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env = cli
        .env
        .or_else(|| std::env::var("VOCALIS_ENV").ok())
        .unwrap_or_else(|| "development".to_string());
    let config = AppConfig::load(&env).context("Failed to load configuration")?;

    init_logging(&config);
    info!(env = %env, "Configuration loaded");

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Migrate => migrate(config).await,
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "pretty" => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
        _ => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
    }
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
    let db = DatabasePool::connect(&config.database).await?;
    vocalis_database::migration::run_migrations(db.pool()).await?;
    db.close().await;
    Ok(())
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting Vocalis v{}", env!("CARGO_PKG_VERSION"));

    // ── Database ─────────────────────────────────────────────────
    let db = DatabasePool::connect(&config.database).await?;
    vocalis_database::migration::run_migrations(db.pool()).await?;

    let users = Arc::new(UserRepository::new(db.pool().clone()));
    let sessions = Arc::new(SessionRepository::new(db.pool().clone()));

    // ── Default administrator ────────────────────────────────────
    let identity = IdentityService::from_config(users.clone(), &config.auth)?;
    if let Some(password) = identity.ensure_default_admin(&config.bootstrap).await? {
        println!(
            "\nDefault administrator '{}' created with password: {password}\n",
            config.bootstrap.admin_username
        );
    }

    // ── Encryption ───────────────────────────────────────────────
    let cipher = FileCipher::open(&config.encryption).await?;

    // ── HTTP server ──────────────────────────────────────────────
    let cleanup_interval = config.auth.session_cleanup_interval_seconds;
    let bind_address = config.server.bind_address();
    let state = AppState::new(config, users, sessions, cipher)?;
    let cleanup = spawn_cleanup(&state, cleanup_interval);
    let throttle_pruning = spawn_throttle_pruning(&state);

    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!(address = %bind_address, "Vocalis server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    cleanup.abort();
    throttle_pruning.abort();
    db.close().await;
    info!("Vocalis server stopped");
    Ok(())
}

/// Periodically purges expired sessions and idle throttle state.
fn spawn_cleanup(state: &AppState, interval_seconds: u64) -> JoinHandle<()> {
    let cleanup = state.session_cleanup();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds.max(1)));
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = cleanup.run_cleanup().await {
                error!(error = %e, "Session cleanup failed");
            }
        }
    })
}

/// Drops idle per-address throttle entries once per throttle window.
fn spawn_throttle_pruning(state: &AppState) -> JoinHandle<()> {
    let cleanup = state.session_cleanup();
    let period = cleanup.throttle_prune_interval().max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            cleanup.prune_throttles().await;
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
