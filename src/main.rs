use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kanban::{
    config::Config,
    db::connection::Database,
    routes::{build_router, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kanban=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    info!(
        "Using database {} (pool size {})",
        config.database.url, config.database.pool_size
    );

    let db = Database::connect(&config.database)?;
    db.migrate()?;

    let app = build_router(AppState::new(db));
    let app_url = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&app_url).await?;

    info!("Kanban service listening on {}", app_url);
    axum::serve(listener, app).await?;

    Ok(())
}
