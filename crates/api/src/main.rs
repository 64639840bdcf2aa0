//! CodeClash streak API server

use api::AppState;
use common::config::StoreKind;
use db::{MemoryStreakStore, PostgresStreakStore, StreakStore};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api=debug".parse()?)
                .add_directive("engine=debug".parse()?)
                .add_directive("db=debug".parse()?),
        )
        .init();

    info!("Starting CodeClash streak API");

    // Load configuration
    let config = common::Config::from_env();

    // Pick the storage backend
    let store: Arc<dyn StreakStore> = match config.store {
        StoreKind::Postgres => {
            let pool = db::create_pool(&config.database_url).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PostgresStreakStore::new(pool))
        }
        StoreKind::Memory => {
            info!("Using in-memory store (STREAK_STORE=memory); data is not persisted");
            Arc::new(MemoryStreakStore::new())
        }
    };

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), store));
    let app = api::app(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
