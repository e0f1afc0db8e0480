//! Tollgate authentication server binary.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use tollgate_api::config::ApiConfig;
use tollgate_core::store::{MemoryUserStore, PgUserStore, UserStore};
use tracing::{info, warn};

/// Where user records live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    /// PostgreSQL via `DATABASE_URL`.
    Postgres,
    /// Process memory; contents are lost on exit.
    Memory,
}

/// CLI arguments for the server.
#[derive(Parser, Debug)]
#[command(name = "tollgate_server", about = "Tollgate authentication server")]
struct Args {
    /// Interface to bind.
    #[arg(long, env = "BIND_HOST", default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on (0 = ephemeral).
    #[arg(long, env = "PORT", default_value_t = 3100)]
    port: u16,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/tollgate"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// User store backend.
    #[arg(long, env = "TOLLGATE_STORE", value_enum, default_value_t = StoreKind::Postgres)]
    store: StoreKind,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,tollgate_api=debug,tollgate_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let config = ApiConfig {
        bind_addr: format!("{}:{}", args.bind, args.port),
        database_url: args.database_url.clone(),
        ..ApiConfig::from_env()
    };
    info!(
        version = tollgate_core::version(),
        bind_addr = %config.bind_addr,
        store = ?args.store,
        token_lifetime_secs = config.token_lifetime_secs,
        "starting tollgate_server"
    );

    let store: Arc<dyn UserStore> = match args.store {
        StoreKind::Postgres => {
            info!(max_connections = args.max_connections, "configuring connection pool");
            let pool = PgPoolOptions::new()
                .max_connections(args.max_connections)
                .acquire_timeout(std::time::Duration::from_secs(30))
                .connect(&config.database_url)
                .await?;

            info!("running database migrations");
            tollgate_api::migrate(&pool).await?;
            Arc::new(PgUserStore::new(pool))
        }
        StoreKind::Memory => {
            warn!("using in-memory user store; accounts will not survive a restart");
            Arc::new(MemoryUserStore::new())
        }
    };

    let state = tollgate_api::AppState::new(&config, store)?;
    let app = tollgate_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
