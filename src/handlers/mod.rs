pub mod about_handlers;
pub mod auth_handlers;
pub mod comment_handlers;
pub mod follow_handlers;
pub mod group_handlers;
pub mod post_handlers;
pub mod user_handlers;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequestParts, Path},
    http::{header, request::Parts, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};

use crate::{errors::AppError, pages::ErrorPage};

/// `302 Found` pointing at `location`.
pub fn found(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}

pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

pub fn post_detail_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

/// A pre-serialized JSON body, as served from the page cache.
pub fn json_bytes(body: Bytes) -> Response {
    (
        [(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())],
        body,
    )
        .into_response()
}

/// The `:post_id` path segment. A segment that is not a valid id names no
/// post, so it is rejected as not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for PostId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::not_found("Post"))?;
        raw.parse::<i64>()
            .map(PostId)
            .map_err(|_| AppError::not_found("Post"))
    }
}

pub const INDEX_URL: &str = "/";
pub const FOLLOW_INDEX_URL: &str = "/follow/";

/// Fallback for every unknown path.
pub async fn page_not_found(uri: Uri) -> Response {
    let body = ErrorPage {
        error: "Page not found".to_string(),
        path: uri.path().to_string(),
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
