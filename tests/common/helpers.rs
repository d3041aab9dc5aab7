// tests/common/helpers.rs
//! Shared helper functions for integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{self, HeaderMap, Request, StatusCode},
    Router,
};
use blog_server::{
    auth::{self, SESSION_COOKIE},
    config::Config,
    create_router,
    models::{Group, User},
    repositories::{
        group_repository::{self, CreateGroupData},
        post_repository::{self, CreatePostData},
    },
    AppState, MIGRATOR,
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "very-secret-pass";

/// A 1x1 transparent GIF.
pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x21, 0xf9, 0x04,
    0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02,
    0x01, 0x00, 0x00,
];

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub pool: SqlitePool,
}

/// What a request produced, with the body already collected.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "Failed to deserialize body ({}): {}",
                e,
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn location(&self) -> &str {
        self.headers
            .get(http::header::LOCATION)
            .expect("response has no Location header")
            .to_str()
            .unwrap()
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(http::header::SET_COOKIE)
            .map(|v| v.to_str().unwrap())
    }
}

// Function to generate a random boundary string
pub fn generate_boundary() -> String {
    format!("----WebKitFormBoundary{}", Uuid::new_v4().simple())
}

// A single in-memory database per test; one connection keeps it alive.
pub async fn create_test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database");
    MIGRATOR.run(&pool).await.expect("Failed to run migrations");
    pool
}

pub fn test_config(index_cache_seconds: u64) -> Config {
    let media_root = std::env::temp_dir().join(format!("blog-test-media-{}", Uuid::new_v4()));
    Config {
        database_url: "sqlite::memory:".to_string(),
        http_port: 0,
        max_db_connections: 1,
        media_root: media_root.to_string_lossy().into_owned(),
        media_url: "/media".to_string(),
        index_cache_seconds,
        session_ttl_seconds: 3600,
        site_name: "Test Blog".to_string(),
    }
}

/// App with the index cache disabled.
pub async fn create_test_app() -> TestApp {
    create_test_app_with_cache(0).await
}

pub async fn create_test_app_with_cache(index_cache_seconds: u64) -> TestApp {
    let pool = create_test_pool().await;
    let state = AppState::new(pool.clone(), test_config(index_cache_seconds));
    TestApp {
        router: create_router(state.clone()),
        state,
        pool,
    }
}

impl TestApp {
    pub async fn create_user(&self, username: &str) -> User {
        auth::register_user(&self.pool, username, TEST_PASSWORD)
            .await
            .expect("Failed to create user in helper")
    }

    /// Cookie header value of a fresh session for the user.
    pub fn login(&self, user: &User) -> String {
        let token = self.state.sessions.create(user.id);
        format!("{}={}", SESSION_COOKIE, token)
    }

    pub async fn create_group(&self, title: &str, slug: &str) -> Group {
        group_repository::create_group(
            &self.pool,
            CreateGroupData {
                title: title.to_string(),
                slug: slug.to_string(),
                description: format!("About {}", title),
            },
        )
        .await
        .expect("Failed to create group in helper")
    }

    pub async fn create_post(&self, author: &User, text: &str, group: Option<&Group>) -> i64 {
        let mut conn = self.pool.acquire().await.unwrap();
        post_repository::create_post(
            &mut *conn,
            CreatePostData {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            },
        )
        .await
        .expect("Failed to create post in helper")
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(http::Method::GET).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(http::header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)], cookie: Option<&str>) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let mut builder = Request::builder()
            .method(http::Method::POST)
            .uri(uri)
            .header(
                http::header::CONTENT_TYPE,
                mime::APPLICATION_WWW_FORM_URLENCODED.as_ref(),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(http::header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        image: Option<(&str, &str, &[u8])>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let boundary = generate_boundary();
        let body = multipart_body(&boundary, fields, image);
        let mut builder = Request::builder()
            .method(http::Method::POST)
            .uri(uri)
            .header(
                http::header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(http::header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }
}

/// Builds a multipart body; `image` is `(filename, content type, bytes)`.
pub fn multipart_body(boundary: &str, fields: &[(&str, &str)], image: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    if let Some((filename, content_type, data)) = image {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\n",
                filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    // Add closing boundary
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}
