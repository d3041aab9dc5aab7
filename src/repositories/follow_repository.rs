use sqlx::SqlitePool;

use crate::models::Follow;

/// Get-or-create of the (user, author) relation.
/// Returns true if a new relation was inserted.
pub async fn follow(pool: &SqlitePool, user_id: i64, author_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO follows (user_id, author_id)
        VALUES (?, ?)
        ON CONFLICT (user_id, author_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Removes the relation. Returns the number of rows affected (0 or 1).
pub async fn unfollow(pool: &SqlitePool, user_id: i64, author_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn get_follow(
    pool: &SqlitePool,
    user_id: i64,
    author_id: i64,
) -> Result<Option<Follow>, sqlx::Error> {
    sqlx::query_as::<_, Follow>(
        "SELECT id, user_id, author_id FROM follows WHERE user_id = ? AND author_id = ?",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await
}

pub async fn is_following(pool: &SqlitePool, user_id: i64, author_id: i64) -> Result<bool, sqlx::Error> {
    Ok(get_follow(pool, user_id, author_id).await?.is_some())
}

/// How many authors the user follows.
pub async fn count_following(pool: &SqlitePool, user_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
}
