use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::User;

/// Stored credentials of a user, only read by the login flow.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub password_salt: String,
}

/// Input data for registering a new user. The password is already hashed.
pub struct CreateUserData {
    pub username: String,
    pub password_hash: String,
    pub password_salt: String,
}

/// Inserts a new user and returns it.
pub async fn create_user(pool: &SqlitePool, data: CreateUserData) -> Result<User, sqlx::Error> {
    let created_at = Utc::now();
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, password_salt, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&data.username)
    .bind(&data.password_hash)
    .bind(&data.password_salt)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(User {
        id: result.last_insert_rowid(),
        username: data.username,
        created_at,
    })
}

pub async fn get_user_by_id(pool: &SqlitePool, user_id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, username, created_at FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_user_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, username, created_at FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn get_credentials(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<UserCredentials>, sqlx::Error> {
    sqlx::query_as::<_, UserCredentials>(
        r#"
        SELECT id, username, password_hash, password_salt
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn username_exists(pool: &SqlitePool, username: &str) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Number of posts written by the user, shown on profile and detail pages.
pub async fn count_posts_by_author(pool: &SqlitePool, author_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = ?")
        .bind(author_id)
        .fetch_one(pool)
        .await
}

/// Deletes a user. Posts keep existing without an author; comments and
/// follow relations go with the user.
pub async fn delete_user(pool: &SqlitePool, user_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
