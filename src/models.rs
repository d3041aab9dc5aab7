use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered author. Credentials never leave the repository layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A named category posts can optionally belong to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// The author as embedded in posts and comments.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AuthorRef {
    pub id: i64,
    pub username: String,
}

/// A post together with its author and group, as every list view needs them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    /// Storage-relative path of the uploaded image, e.g. `posts/<uuid>.gif`.
    pub image: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub author: Option<AuthorRef>, // None once the author is deleted
    pub group: Option<Group>,
}

/// Flat row shape of the posts/users/groups join.
#[derive(Debug, FromRow)]
pub(crate) struct PostRow {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub author_id: Option<i64>,
    pub author_username: Option<String>,
    pub group_id: Option<i64>,
    pub group_title: Option<String>,
    pub group_slug: Option<String>,
    pub group_description: Option<String>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let author = match (row.author_id, row.author_username) {
            (Some(id), Some(username)) => Some(AuthorRef { id, username }),
            _ => None,
        };
        let group = match (row.group_id, row.group_title, row.group_slug) {
            (Some(id), Some(title), Some(slug)) => Some(Group {
                id,
                title,
                slug,
                description: row.group_description.unwrap_or_default(),
            }),
            _ => None,
        };
        Post {
            id: row.id,
            text: row.text,
            pub_date: row.pub_date,
            image: row.image,
            image_url: None,
            author,
            group,
        }
    }
}

impl Post {
    pub fn author_id(&self) -> Option<i64> {
        self.author.as_ref().map(|a| a.id)
    }

    pub fn group_id(&self) -> Option<i64> {
        self.group.as_ref().map(|g| g.id)
    }
}

/// A reply attached to a post.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub post_id: Option<i64>, // None once the post is deleted
    pub author: AuthorRef,
    pub text: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub(crate) struct CommentRow {
    pub id: i64,
    pub post_id: Option<i64>,
    pub author_id: i64,
    pub author_username: String,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            author: AuthorRef {
                id: row.author_id,
                username: row.author_username,
            },
            text: row.text,
            created: row.created,
        }
    }
}

/// A directed subscription: `user_id` follows `author_id`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
}
