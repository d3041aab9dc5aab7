use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::MaybeUser,
    errors::AppError,
    pages::{AuthorSummary, ProfilePage},
    repositories::{
        follow_repository,
        post_repository::{self, PostFilter},
        user_repository,
    },
    utils::PageParams,
    AppState,
};

/// Handler for an author's profile: their posts and whether the viewer
/// follows them.
pub async fn profile_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    MaybeUser(viewer): MaybeUser,
    params: PageParams,
) -> Result<Json<ProfilePage>, AppError> {
    let author = user_repository::get_user_by_username(&state.db_pool, &username)
        .await?
        .ok_or(AppError::not_found("User"))?;

    let page = post_repository::list_posts(&state.db_pool, PostFilter::Author(author.id), params.requested()).await?;

    let following = match viewer {
        Some(viewer) => follow_repository::is_following(&state.db_pool, viewer.id, author.id).await?,
        None => false,
    };

    Ok(Json(ProfilePage {
        author: AuthorSummary {
            id: author.id,
            username: author.username,
            posts_count: page.count,
        },
        following,
        page_obj: page.map(|p| state.image_storage.attach_url(p)),
    }))
}
