use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::{Post, PostRow};
use crate::utils::{Page, PageWindow, POSTS_PER_PAGE};

const POST_SELECT: &str = r#"
    SELECT p.id, p.text, p.pub_date, p.image,
           p.author_id, u.username AS author_username,
           p.group_id, g.title AS group_title, g.slug AS group_slug,
           g.description AS group_description
    FROM posts p
    LEFT JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

// Newest first; id breaks ties between posts created in the same instant.
const POST_ORDER: &str = "ORDER BY p.pub_date DESC, p.id DESC";

/// Which posts a list view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author the given user follows.
    FollowedBy(i64),
}

impl PostFilter {
    fn where_clause(&self) -> &'static str {
        match self {
            PostFilter::All => "",
            PostFilter::Group(_) => "WHERE p.group_id = ?",
            PostFilter::Author(_) => "WHERE p.author_id = ?",
            PostFilter::FollowedBy(_) => {
                "WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ?)"
            }
        }
    }

    fn bind_value(&self) -> Option<i64> {
        match *self {
            PostFilter::All => None,
            PostFilter::Group(id) | PostFilter::Author(id) | PostFilter::FollowedBy(id) => Some(id),
        }
    }
}

/// Input data for creating a new post. The author comes from the session.
#[derive(Debug, Clone)]
pub struct CreatePostData {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Replacement values for an edited post. `image: None` keeps the current one.
#[derive(Debug, Clone)]
pub struct UpdatePostData {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Outcome of resolving a post for editing by a given user.
#[derive(Debug, Clone, PartialEq)]
pub enum EditAccess {
    Authorized(Post),
    Forbidden,
    NotFound,
}

pub async fn count_posts(pool: &SqlitePool, filter: PostFilter) -> Result<i64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM posts p {}", filter.where_clause());
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    if let Some(value) = filter.bind_value() {
        query = query.bind(value);
    }
    query.fetch_one(pool).await
}

/// Fetches one page of posts matching `filter`, newest first. The requested
/// page number is clamped into the valid range.
pub async fn list_posts(
    pool: &SqlitePool,
    filter: PostFilter,
    requested_page: i64,
) -> Result<Page<Post>, sqlx::Error> {
    let count = count_posts(pool, filter).await?;
    let window = PageWindow::new(requested_page, count, POSTS_PER_PAGE);

    let sql = format!(
        "{} {} {} LIMIT ? OFFSET ?",
        POST_SELECT,
        filter.where_clause(),
        POST_ORDER
    );
    let mut query = sqlx::query_as::<_, PostRow>(&sql);
    if let Some(value) = filter.bind_value() {
        query = query.bind(value);
    }
    let rows = query
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(pool)
        .await?;

    Ok(Page::new(rows.into_iter().map(Post::from).collect(), window))
}

pub async fn get_post_by_id(pool: &SqlitePool, post_id: i64) -> Result<Option<Post>, sqlx::Error> {
    let sql = format!("{} WHERE p.id = ?", POST_SELECT);
    let row = sqlx::query_as::<_, PostRow>(&sql)
        .bind(post_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Post::from))
}

/// Resolves the post scoped to its author.
pub async fn resolve_edit_access(
    pool: &SqlitePool,
    post_id: i64,
    user_id: i64,
) -> Result<EditAccess, sqlx::Error> {
    Ok(match get_post_by_id(pool, post_id).await? {
        None => EditAccess::NotFound,
        Some(post) if post.author_id() == Some(user_id) => EditAccess::Authorized(post),
        Some(_) => EditAccess::Forbidden,
    })
}

/// Inserts a new post and returns its id.
pub async fn create_post(conn: &mut SqliteConnection, data: CreatePostData) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO posts (text, pub_date, image, author_id, group_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&data.text)
    .bind(Utc::now())
    .bind(&data.image)
    .bind(data.author_id)
    .bind(data.group_id)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Updates text, group and optionally the image of a post in place.
/// Returns the number of rows affected.
pub async fn update_post(
    conn: &mut SqliteConnection,
    post_id: i64,
    data: UpdatePostData,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE posts
        SET text = ?, group_id = ?, image = COALESCE(?, image)
        WHERE id = ?
        "#,
    )
    .bind(&data.text)
    .bind(data.group_id)
    .bind(&data.image)
    .bind(post_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Deletes a post by its ID. Its comments stay, detached.
/// Returns the number of rows affected.
pub async fn delete_post(pool: &SqlitePool, post_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(post_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
