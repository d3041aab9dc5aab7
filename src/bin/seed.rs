use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use blog_server::{config::Config, connect, seeder::seed_database, MIGRATOR};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Starting database seeding...");

    let pool = connect(&config.database_url, 1)
        .await
        .context("Failed to connect to database")?;
    MIGRATOR.run(&pool).await.context("Failed to run migrations")?;

    seed_database(&pool).await.context("Failed to seed database")?;
    Ok(())
}
