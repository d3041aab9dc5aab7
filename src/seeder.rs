use sqlx::SqlitePool;
use tracing::info;

use crate::repositories::group_repository::{self, CreateGroupData};

/// Seed the database with the initial post groups.
///
/// Idempotent: existing slugs are left untouched, so it can run on every deploy.
pub async fn seed_database(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Seeding groups...");

    let groups = [
        ("Cats", "cats", "Everything about cats."),
        ("Travel", "travel", "Trips, routes and places worth visiting."),
        ("Programming", "programming", "Code, tools and war stories."),
        ("Books", "books", "What we read and what we think of it."),
    ];

    for (title, slug, description) in groups {
        let data = CreateGroupData {
            title: title.to_string(),
            slug: slug.to_string(),
            description: description.to_string(),
        };
        let created = group_repository::ensure_group(pool, &data).await?;
        info!(slug, created, "Ensured group");
    }

    info!("Database seeding completed successfully.");
    Ok(())
}
