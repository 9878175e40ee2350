use std::net::SocketAddr;

use mimalloc::MiMalloc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vulnwatch::config::AppConfig;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vulnwatch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration");

    let pool = vulnwatch::db::create_pool(&config.database_url, config.database_max_connections)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(host = %addr, "Starting vulnwatch API server");

    let state = vulnwatch::AppState {
        db: pool,
        config: config.clone(),
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, vulnwatch::router(state)).await?;

    Ok(())
}
