//! Pocket Miner server: reads config from env, prepares the store, serves the API.
//!
//! Run from repo root: `cargo run -p pocket-miner-server`
//! Without PostgreSQL: `POCKET_MINER_STORE=memory cargo run -p pocket-miner-server`

use pocket_miner::{
    app, apply_migrations, ensure_database_exists, AppState, MemoryStore, PgStore, ServerConfig,
    StoreBackend,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pocket_miner=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let state = match config.store {
        StoreBackend::Postgres => {
            ensure_database_exists(&config.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(&config.database_url)
                .await?;
            apply_migrations(&pool).await?;
            AppState::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on exit");
            AppState::new(MemoryStore::new())
        }
    };

    let router = app(state, config.body_limit);
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}
