use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth_service::{
    config::Config,
    db,
    routes,
    services::clock::SystemClock,
    AppState, Stores,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let stores = match &config.database {
        Some(database) => {
            let pool = db::create_pool(database).await?;
            db::run_migrations(&pool).await?;
            info!("Database connected and migrations applied");
            Stores::postgres(pool)
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory stores; data is lost on restart");
            Stores::in_memory()
        }
    };

    let state = AppState::new(&config, stores, Arc::new(SystemClock));
    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("auth service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
