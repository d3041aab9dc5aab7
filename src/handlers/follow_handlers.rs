use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use tracing::{info, warn};

use crate::{
    auth::AuthenticatedUser,
    errors::AppError,
    handlers::{found, FOLLOW_INDEX_URL},
    pages::FollowPage,
    repositories::{
        follow_repository,
        post_repository::{self, PostFilter},
        user_repository,
    },
    utils::PageParams,
    AppState,
};

/// Handler for the personal feed: posts by every followed author.
pub async fn follow_index_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    params: PageParams,
) -> Result<Json<FollowPage>, AppError> {
    let page = post_repository::list_posts(&state.db_pool, PostFilter::FollowedBy(user.id), params.requested()).await?;
    Ok(Json(FollowPage {
        page_obj: page.map(|p| state.image_storage.attach_url(p)),
    }))
}

/// Handler to follow an author. Following yourself is a no-op, following
/// twice keeps a single relation.
pub async fn profile_follow_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, AppError> {
    let author = user_repository::get_user_by_username(&state.db_pool, &username)
        .await?
        .ok_or(AppError::not_found("User"))?;

    if author.id != user.id {
        let created = follow_repository::follow(&state.db_pool, user.id, author.id).await?;
        if created {
            info!(user_id = user.id, author_id = author.id, "User followed author");
        }
    }

    Ok(found(FOLLOW_INDEX_URL))
}

/// Handler to unfollow an author. Fails with 404 when no relation exists.
pub async fn profile_unfollow_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, AppError> {
    let author = user_repository::get_user_by_username(&state.db_pool, &username)
        .await?
        .ok_or(AppError::not_found("User"))?;

    match follow_repository::unfollow(&state.db_pool, user.id, author.id).await? {
        0 => {
            warn!(user_id = user.id, author_id = author.id, "Attempted to unfollow an author that is not followed");
            Err(AppError::not_found("Follow"))
        }
        _ => {
            info!(user_id = user.id, author_id = author.id, "User unfollowed author");
            Ok(found(FOLLOW_INDEX_URL))
        }
    }
}
