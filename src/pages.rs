//! Response models, one per route. Handlers build these and serialize them
//! as the response body.

use serde::{Deserialize, Serialize};

use crate::{
    forms::{CommentFormView, FieldErrors, PostFormView},
    models::{Comment, Group, Post},
    utils::Page,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexPage {
    pub page_obj: Page<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupPage {
    pub group: Group,
    pub page_obj: Page<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: i64,
    pub username: String,
    pub posts_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfilePage {
    pub author: AuthorSummary,
    /// Whether the current viewer follows this author.
    pub following: bool,
    pub page_obj: Page<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostDetailPage {
    pub post: Post,
    pub author_posts_count: i64,
    pub comments: Vec<Comment>,
    pub form: CommentFormView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostFormPage {
    pub form: PostFormView,
    pub groups: Vec<Group>,
    pub is_edit: bool,
    pub post: Option<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FollowPage {
    pub page_obj: Page<Post>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SignupPage {
    pub username: String,
    pub errors: FieldErrors,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginPage {
    pub username: String,
    pub next: Option<String>,
    pub errors: FieldErrors,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoggedOutPage {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AboutPage {
    pub site_name: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorPage {
    pub error: String,
    pub path: String,
}
