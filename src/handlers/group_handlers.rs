use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    errors::AppError,
    pages::GroupPage,
    repositories::{
        group_repository,
        post_repository::{self, PostFilter},
    },
    utils::PageParams,
    AppState,
};

/// Handler to list the posts of one group, newest first.
pub async fn group_posts_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    params: PageParams,
) -> Result<Json<GroupPage>, AppError> {
    let group = group_repository::get_group_by_slug(&state.db_pool, &slug)
        .await?
        .ok_or(AppError::not_found("Group"))?;

    let page = post_repository::list_posts(&state.db_pool, PostFilter::Group(group.id), params.requested()).await?;

    Ok(Json(GroupPage {
        group,
        page_obj: page.map(|p| state.image_storage.attach_url(p)),
    }))
}
