use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    RequestPartsExt,
};
use axum_extra::{extract::TypedHeader, headers::Cookie};
use constant_time_eq::constant_time_eq;
use dashmap::DashMap;
use hmac_sha256::HMAC;
use rand::{thread_rng, RngCore};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::User,
    repositories::user_repository::{self, CreateUserData},
    AppState,
};

pub const SESSION_COOKIE: &str = "sessionid";
pub const LOGIN_PATH: &str = "/auth/login/";

const SALT_LENGTH: usize = 16;
const MAX_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

// --- Session Storage ---

#[derive(Debug, Clone)]
struct Session {
    user_id: i64,
    expires_at: Instant,
}

/// In-memory session table: cookie token -> user id, with a TTL.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        let store = Self {
            sessions: Arc::new(DashMap::new()),
            ttl,
        };
        // Start a background task to purge expired sessions periodically
        let store_clone = store.clone();
        tokio::spawn(async move {
            store_clone.purge_expired_periodically().await;
        });
        store
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Starts a session for the user and returns its token.
    pub fn create(&self, user_id: i64) -> Uuid {
        let token = Uuid::new_v4();
        self.sessions.insert(
            token,
            Session {
                user_id,
                expires_at: Instant::now() + self.ttl,
            },
        );
        token
    }

    /// Returns the user id behind a live session. Expired sessions are
    /// removed on the way.
    pub fn resolve(&self, token: Uuid) -> Option<i64> {
        let user_id = self
            .sessions
            .get(&token)
            .filter(|s| s.expires_at > Instant::now())
            .map(|s| s.user_id);
        if user_id.is_none() {
            self.sessions.remove(&token);
        }
        user_id
    }

    pub fn destroy(&self, token: Uuid) -> bool {
        self.sessions.remove(&token).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn purge_expired(&self) {
        let now = Instant::now();
        let before = self.len();
        self.sessions.retain(|_, session| session.expires_at > now);
        let remaining = self.len();
        if remaining < before {
            tracing::debug!(purged = before - remaining, remaining, "Purged expired sessions");
        }
    }

    async fn purge_expired_periodically(&self) {
        let period = self.ttl.clamp(Duration::from_secs(1), MAX_PURGE_INTERVAL);
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            self.purge_expired();
        }
    }
}

// --- Passwords ---

/// Returns `(hash, salt)`, both base64.
pub fn hash_password(password: &str) -> (String, String) {
    let mut salt = [0u8; SALT_LENGTH];
    thread_rng().fill_bytes(&mut salt);
    let digest = HMAC::mac(password.as_bytes(), salt);
    (base64::encode(digest), base64::encode(salt))
}

pub fn verify_password(password: &str, hash_b64: &str, salt_b64: &str) -> bool {
    let (Ok(expected), Ok(salt)) = (base64::decode(hash_b64), base64::decode(salt_b64)) else {
        return false;
    };
    let digest = HMAC::mac(password.as_bytes(), &salt);
    constant_time_eq(&digest, &expected)
}

/// Creates a user with a freshly salted password hash.
pub async fn register_user(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<User, sqlx::Error> {
    let (password_hash, password_salt) = hash_password(password);
    user_repository::create_user(
        pool,
        CreateUserData {
            username: username.to_string(),
            password_hash,
            password_salt,
        },
    )
    .await
}

/// Checks a username/password pair.
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<CurrentUser>, sqlx::Error> {
    let Some(credentials) = user_repository::get_credentials(pool, username).await? else {
        return Ok(None);
    };
    if verify_password(password, &credentials.password_hash, &credentials.password_salt) {
        Ok(Some(CurrentUser {
            id: credentials.id,
            username: credentials.username,
        }))
    } else {
        Ok(None)
    }
}

// --- Cookies ---

pub fn session_cookie(token: Uuid, ttl: Duration) -> HeaderValue {
    let cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.as_secs()
    );
    // A uuid and digits are always valid header characters
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

pub fn cleared_session_cookie() -> HeaderValue {
    HeaderValue::from_static("sessionid=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}

/// Session token carried by the request, if any.
pub async fn session_token(parts: &mut Parts) -> Option<Uuid> {
    let TypedHeader(cookie) = parts.extract::<TypedHeader<Cookie>>().await.ok()?;
    cookie
        .get(SESSION_COOKIE)
        .and_then(|value| Uuid::parse_str(value).ok())
}

/// `/auth/login/?next=<path>`, with `next` url-encoded.
pub fn login_url(next: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("next", next)
        .finish();
    format!("{}?{}", LOGIN_PATH, query)
}

// --- Error Types ---

#[derive(Debug, Error, Clone)]
pub enum AuthError {
    #[error("Login required")]
    LoginRequired { next: String },

    #[error("Internal server error during authentication")]
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::LoginRequired { next } => {
                (StatusCode::FOUND, [(header::LOCATION, login_url(&next))]).into_response()
            }
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}

// --- User Extractors ---

/// The user a request's session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

// Per-request cache so several extractors share one lookup.
#[derive(Debug, Clone)]
struct ResolvedSession(Option<CurrentUser>);

async fn resolve_current_user(
    parts: &mut Parts,
    app_state: &AppState,
) -> Result<Option<CurrentUser>, AuthError> {
    if let Some(ResolvedSession(cached)) = parts.extensions.get::<ResolvedSession>() {
        return Ok(cached.clone());
    }

    let user = match session_token(parts).await.and_then(|t| app_state.sessions.resolve(t)) {
        Some(user_id) => user_repository::get_user_by_id(&app_state.db_pool, user_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id, "Failed to load session user");
                AuthError::InternalError
            })?
            .map(|u| CurrentUser {
                id: u.id,
                username: u.username,
            }),
        None => None,
    };

    tracing::debug!(authenticated = user.is_some(), "Resolved request session");
    parts.extensions.insert(ResolvedSession(user.clone()));
    Ok(user)
}

/// Extracted only for logged-in users; anyone else is redirected to the
/// login page with a `next` parameter pointing back at the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub CurrentUser);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        match resolve_current_user(parts, &app_state).await? {
            Some(user) => Ok(AuthenticatedUser(user)),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| parts.uri.path().to_string());
                Err(AuthError::LoginRequired { next })
            }
        }
    }
}

/// The viewer, logged in or not.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        Ok(MaybeUser(resolve_current_user(parts, &app_state).await?))
    }
}
