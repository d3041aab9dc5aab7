use axum::{
    extract::State,
    response::Response,
    Form,
};
use tracing::{debug, info};

use crate::{
    auth::AuthenticatedUser,
    errors::AppError,
    forms::CommentForm,
    handlers::{found, post_detail_url, PostId},
    repositories::{comment_repository, post_repository},
    AppState,
};

/// Handler to comment on a post. Always redirects back to the post; an
/// empty comment is silently dropped.
pub async fn add_comment_handler(
    State(state): State<AppState>,
    PostId(post_id): PostId,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    if post_repository::get_post_by_id(&state.db_pool, post_id).await?.is_none() {
        return Err(AppError::not_found("Post"));
    }

    match form.cleaned_text() {
        Some(text) => {
            let comment_id = comment_repository::create_comment(&state.db_pool, post_id, user.id, text).await?;
            info!(comment_id, post_id, author_id = user.id, "Successfully created comment");
        }
        None => debug!(post_id, user_id = user.id, "Ignoring empty comment"),
    }

    Ok(found(post_detail_url(post_id)))
}
