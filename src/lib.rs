use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::{str::FromStr, sync::Arc, time::Duration};
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};

pub mod auth;
pub mod cache;
pub mod config;
pub mod errors;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod pages;
pub mod repositories;
pub mod seeder;
pub mod storage;
pub mod utils;

use handlers::{
    about_handlers::{about_author_handler, about_tech_handler},
    auth_handlers::{login_form_handler, login_handler, logout_handler, signup_form_handler, signup_handler},
    comment_handlers::add_comment_handler,
    follow_handlers::{follow_index_handler, profile_follow_handler, profile_unfollow_handler},
    group_handlers::group_posts_handler,
    page_not_found,
    post_handlers::{
        create_post_form_handler, create_post_handler, edit_post_form_handler, edit_post_handler,
        index_handler, post_detail_handler,
    },
    user_handlers::profile_handler,
};

use auth::SessionStore;
use cache::PageCache;
use config::Config;
use storage::LocalImageStorage;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

// Uploads carry images, so the limit sits well above the per-image cap.
const MAX_BODY_SIZE: usize = 20 * 1024 * 1024;

/// Shared handles every handler can reach.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub image_storage: LocalImageStorage,
    pub sessions: SessionStore,
    pub index_cache: PageCache,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db_pool: SqlitePool, config: Config) -> Self {
        Self {
            db_pool,
            image_storage: LocalImageStorage::new(config.media_root.clone(), config.media_url.clone()),
            sessions: SessionStore::new(Duration::from_secs(config.session_ttl_seconds)),
            index_cache: PageCache::new(Duration::from_secs(config.index_cache_seconds)),
            config: Arc::new(config),
        }
    }
}

/// Opens the SQLite pool with foreign keys enforced on every connection.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

pub fn create_router(app_state: AppState) -> Router {
    let media_url = app_state.image_storage.base_url.clone();
    let media_service = ServeDir::new(app_state.image_storage.upload_dir.clone());

    Router::new()
        .route("/", get(index_handler))
        .route("/group/:slug/", get(group_posts_handler))
        .route("/profile/:username/", get(profile_handler))
        .route("/profile/:username/follow/", get(profile_follow_handler))
        .route("/profile/:username/unfollow/", get(profile_unfollow_handler))
        .route("/posts/:post_id/", get(post_detail_handler))
        .route("/posts/:post_id/edit/", get(edit_post_form_handler).post(edit_post_handler))
        .route("/posts/:post_id/comment/", post(add_comment_handler))
        .route("/create/", get(create_post_form_handler).post(create_post_handler))
        .route("/follow/", get(follow_index_handler))
        .route("/auth/signup/", get(signup_form_handler).post(signup_handler))
        .route("/auth/login/", get(login_form_handler).post(login_handler))
        .route("/auth/logout/", get(logout_handler))
        .route("/about/author/", get(about_author_handler))
        .route("/about/tech/", get(about_tech_handler))
        .nest_service(&media_url, media_service)
        .fallback(page_not_found)
        .with_state(app_state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
}
