//! StoreRate API server binary.

use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::info;

use storerate_api::config::ApiConfig;
use storerate_core::auth::registry::{InMemoryRegistry, spawn_sweeper};
use storerate_core::auth::token::TokenService;
use storerate_core::store::postgres::PgCredentialStore;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "storerate_server", about = "StoreRate API server")]
struct Args {
    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/storerate"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,storerate_api=debug,storerate_core=debug".parse().unwrap()
            }),
        )
        .init();

    let args = Args::parse();

    // Secret validation happens here; refusing to start beats minting
    // tokens nobody can verify.
    let config = ApiConfig::from_env()?;
    let tokens = Arc::new(TokenService::new(config.token_config())?);

    info!(bind_addr = %config.bind_addr, "starting storerate_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    storerate_api::migrate(&pool).await?;

    // Single-process deployment: the in-memory registry is the default.
    // PgRefreshTokenRegistry backs the same trait for multi-process setups.
    let registry = Arc::new(InMemoryRegistry::new());

    let shutdown = CancellationToken::new();
    let sweeper = spawn_sweeper(registry.clone(), config.sweep_interval, shutdown.clone());

    let state = storerate_api::AppState {
        store: Arc::new(PgCredentialStore::new(pool)),
        registry,
        tokens,
        config: config.clone(),
    };

    let app = storerate_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    let serve_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = serve_shutdown.cancelled() => {}
            }
        })
        .await?;

    shutdown.cancel();
    let _ = sweeper.await;

    Ok(())
}
