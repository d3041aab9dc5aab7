use axum::{
    body::Bytes,
    extract::{Multipart, RawQuery, State},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error, info, warn};

use crate::{
    auth::AuthenticatedUser,
    errors::AppError,
    forms::{CommentFormView, PostFormView, PostSubmission, UploadedImage},
    handlers::{found, json_bytes, post_detail_url, profile_url, PostId},
    pages::{IndexPage, PostDetailPage, PostFormPage},
    repositories::{
        comment_repository, group_repository,
        post_repository::{self, CreatePostData, EditAccess, PostFilter, UpdatePostData},
        user_repository,
    },
    utils::PageParams,
    AppState,
};

/// Handler for the front page: every post, newest first, paginated.
/// Responses are served from the index cache while it holds them.
pub async fn index_handler(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
    params: PageParams,
) -> Result<Response, AppError> {
    let cache_key = raw_query.unwrap_or_default();
    if let Some(body) = state.index_cache.get(&cache_key) {
        debug!(query = %cache_key, "Serving index from cache");
        return Ok(json_bytes(body));
    }

    let page = post_repository::list_posts(&state.db_pool, PostFilter::All, params.requested()).await?;
    let page = IndexPage {
        page_obj: page.map(|p| state.image_storage.attach_url(p)),
    };

    let body = Bytes::from(serde_json::to_vec(&page)?);
    state.index_cache.insert(cache_key, body.clone());
    Ok(json_bytes(body))
}

/// Handler to show a single post with its comments.
pub async fn post_detail_handler(
    State(state): State<AppState>,
    PostId(post_id): PostId,
) -> Result<Json<PostDetailPage>, AppError> {
    let post = post_repository::get_post_by_id(&state.db_pool, post_id)
        .await?
        .ok_or(AppError::not_found("Post"))?;

    let author_posts_count = match post.author_id() {
        Some(author_id) => user_repository::count_posts_by_author(&state.db_pool, author_id).await?,
        None => 0,
    };
    let comments = comment_repository::get_comments_by_post(&state.db_pool, post_id).await?;

    Ok(Json(PostDetailPage {
        post: state.image_storage.attach_url(post),
        author_posts_count,
        comments,
        form: CommentFormView::default(),
    }))
}

/// Handler rendering the empty create form.
pub async fn create_post_form_handler(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<PostFormPage>, AppError> {
    let groups = group_repository::list_groups(&state.db_pool).await?;
    Ok(Json(PostFormPage {
        form: PostFormView::default(),
        groups,
        is_edit: false,
        post: None,
    }))
}

/// Handler to create a new post with an optional group and image.
pub async fn create_post_handler(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let submission = PostSubmission::from_multipart(multipart).await?;
    let groups = group_repository::list_groups(&state.db_pool).await?;

    let valid = match submission.validate(&groups) {
        Ok(valid) => valid,
        Err(form) => {
            debug!(user_id = user.id, errors = ?form.errors, "Post form rejected");
            return Ok(Json(PostFormPage {
                form,
                groups,
                is_edit: false,
                post: None,
            })
            .into_response());
        }
    };

    let image = match valid.image {
        Some(image) => Some(store_image(&state, image).await?),
        None => None,
    };

    let data = CreatePostData {
        author_id: user.id,
        text: valid.text,
        group_id: valid.group_id,
        image: image.clone(),
    };

    let post_id = match insert_post(&state, data).await {
        Ok(post_id) => post_id,
        Err(e) => {
            discard_image(&state, image.as_deref()).await;
            return Err(e.into());
        }
    };

    info!(post_id, author_id = user.id, "Successfully created post");
    Ok(found(profile_url(&user.username)))
}

/// Handler rendering the edit form pre-filled with the post's data.
/// Non-authors are sent back to their own profile.
pub async fn edit_post_form_handler(
    State(state): State<AppState>,
    PostId(post_id): PostId,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, AppError> {
    let post = match post_repository::resolve_edit_access(&state.db_pool, post_id, user.id).await? {
        EditAccess::Authorized(post) => post,
        EditAccess::Forbidden => {
            warn!(post_id, user_id = user.id, "User attempted to edit a post they did not write");
            return Ok(found(profile_url(&user.username)));
        }
        EditAccess::NotFound => return Err(AppError::not_found("Post")),
    };

    let groups = group_repository::list_groups(&state.db_pool).await?;
    Ok(Json(PostFormPage {
        form: PostFormView::from_post(&post),
        groups,
        is_edit: true,
        post: Some(state.image_storage.attach_url(post)),
    })
    .into_response())
}

/// Handler to update a post in place. Only its author may do so.
pub async fn edit_post_handler(
    State(state): State<AppState>,
    PostId(post_id): PostId,
    AuthenticatedUser(user): AuthenticatedUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let post = match post_repository::resolve_edit_access(&state.db_pool, post_id, user.id).await? {
        EditAccess::Authorized(post) => post,
        EditAccess::Forbidden => {
            warn!(post_id, user_id = user.id, "User attempted to update a post they did not write");
            return Ok(found(profile_url(&user.username)));
        }
        EditAccess::NotFound => return Err(AppError::not_found("Post")),
    };

    let submission = PostSubmission::from_multipart(multipart).await?;
    let groups = group_repository::list_groups(&state.db_pool).await?;

    let valid = match submission.validate(&groups) {
        Ok(valid) => valid,
        Err(mut form) => {
            form.image = post.image.clone();
            return Ok(Json(PostFormPage {
                form,
                groups,
                is_edit: true,
                post: Some(state.image_storage.attach_url(post)),
            })
            .into_response());
        }
    };

    let new_image = match valid.image {
        Some(image) => Some(store_image(&state, image).await?),
        None => None,
    };

    let data = UpdatePostData {
        text: valid.text,
        group_id: valid.group_id,
        image: new_image.clone(),
    };

    let updated = match apply_post_update(&state, post_id, data).await {
        Ok(rows) => rows,
        Err(e) => {
            discard_image(&state, new_image.as_deref()).await;
            return Err(e.into());
        }
    };

    if updated == 0 {
        warn!(post_id, user_id = user.id, "Post disappeared during update");
        discard_image(&state, new_image.as_deref()).await;
        return Err(AppError::not_found("Post"));
    }

    // The replaced file is no longer referenced
    if new_image.is_some() {
        discard_image(&state, post.image.as_deref()).await;
    }

    info!(post_id, user_id = user.id, "Successfully updated post");
    Ok(found(post_detail_url(post_id)))
}

async fn insert_post(state: &AppState, data: CreatePostData) -> Result<i64, sqlx::Error> {
    let mut tx = state.db_pool.begin().await?;
    let post_id = post_repository::create_post(&mut *tx, data).await?;
    tx.commit().await?;
    Ok(post_id)
}

async fn apply_post_update(state: &AppState, post_id: i64, data: UpdatePostData) -> Result<u64, sqlx::Error> {
    let mut tx = state.db_pool.begin().await?;
    let rows = post_repository::update_post(&mut *tx, post_id, data).await?;
    tx.commit().await?;
    Ok(rows)
}

async fn store_image(state: &AppState, image: UploadedImage) -> Result<String, AppError> {
    let filename = image.filename.clone();
    state
        .image_storage
        .save_image(image.data, filename.as_deref())
        .await
        .map_err(|e| {
            error!(error = %e, filename = ?filename, "Failed to save post image");
            AppError::from(e)
        })
}

// Best-effort removal; a leftover file is only logged.
async fn discard_image(state: &AppState, image: Option<&str>) {
    if let Some(path) = image {
        if let Err(e) = state.image_storage.delete_image(path).await {
            warn!(error = %e, path, "Failed to remove image file");
        }
    }
}
