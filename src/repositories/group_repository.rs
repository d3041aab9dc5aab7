use sqlx::SqlitePool;

use crate::models::Group;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CreateGroupData {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Inserts a group and returns it.
pub async fn create_group(pool: &SqlitePool, data: CreateGroupData) -> Result<Group, sqlx::Error> {
    let result = sqlx::query("INSERT INTO post_groups (title, slug, description) VALUES (?, ?, ?)")
        .bind(&data.title)
        .bind(&data.slug)
        .bind(&data.description)
        .execute(pool)
        .await?;

    Ok(Group {
        id: result.last_insert_rowid(),
        title: data.title,
        slug: data.slug,
        description: data.description,
    })
}

/// Inserts the group unless its slug is taken. Returns true when a row was added.
pub async fn ensure_group(pool: &SqlitePool, data: &CreateGroupData) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO post_groups (title, slug, description)
        VALUES (?, ?, ?)
        ON CONFLICT (slug) DO NOTHING
        "#,
    )
    .bind(&data.title)
    .bind(&data.slug)
    .bind(&data.description)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn get_group_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Group>, sqlx::Error> {
    sqlx::query_as::<_, Group>(
        "SELECT id, title, slug, description FROM post_groups WHERE slug = ?",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
}

/// All groups, ordered by title, for the post form's group selector.
pub async fn list_groups(pool: &SqlitePool) -> Result<Vec<Group>, sqlx::Error> {
    sqlx::query_as::<_, Group>(
        "SELECT id, title, slug, description FROM post_groups ORDER BY title ASC, id ASC",
    )
    .fetch_all(pool)
    .await
}

/// Deletes a group; its posts stay, ungrouped.
pub async fn delete_group(pool: &SqlitePool, group_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM post_groups WHERE id = ?")
        .bind(group_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
