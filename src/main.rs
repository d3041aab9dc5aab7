use anyhow::Context;
use dotenvy::dotenv;
use tokio::{
    net::TcpListener,
    signal::ctrl_c,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use blog_server::{config::Config, connect, create_router, AppState, MIGRATOR};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let db_pool = connect(&config.database_url, config.max_db_connections)
        .await
        .context("Failed to create database pool")?;
    info!("Database connection pool established.");

    MIGRATOR.run(&db_pool).await.context("Failed to run migrations")?;
    info!("Database migrations completed");

    tokio::fs::create_dir_all(&config.media_root)
        .await
        .with_context(|| format!("Failed to create media root {}", config.media_root))?;

    let address = format!("0.0.0.0:{}", config.http_port);
    let app = create_router(AppState::new(db_pool, config));

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
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
}
