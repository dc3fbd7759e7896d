//! custodial_wallet - Custodial Wallet Backend API
//!
//! Users, per-currency wallets and deposit/withdraw/balance operations over
//! a ledger that serializes writes to each wallet.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use custodial_wallet::audit::{PgAuditSink, TracingAuditSink};
use custodial_wallet::storage::{MemoryStore, PgStore};
use custodial_wallet::{api, db, Config, Ledger};

/// Initialize tracing/logging
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "custodial_wallet=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Connect to PostgreSQL and verify the schema
async fn connect(config: &Config, database_url: &str) -> anyhow::Result<PgPool> {
    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await?;

    db::verify_connection(&pool).await?;

    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    tracing::info!("Database connected successfully");
    Ok(pool)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;
    init_tracing(config.is_production());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let settings = config.ledger_settings();

    tracing::info!(
        concurrency = ?settings.concurrency,
        currencies = ?settings.allowed_currencies,
        "Starting custodial wallet server"
    );

    let (ledger, pool) = match config.database_url.as_deref() {
        Some(url) => {
            let pool = connect(&config, url).await?;
            let ledger = Ledger::new(
                Arc::new(PgStore::new(pool.clone())),
                Arc::new(PgAuditSink::new(pool.clone())),
                settings,
            );
            (ledger, Some(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store");
            let ledger = Ledger::new(
                Arc::new(MemoryStore::new()),
                Arc::new(TracingAuditSink),
                settings,
            );
            (ledger, None)
        }
    };

    let app = api::build_router(ledger);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Cleanup
    tracing::info!("Server shutting down...");
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database connections closed.");
    }
    tracing::info!("Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
