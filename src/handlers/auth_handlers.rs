use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};
use axum_extra::{extract::TypedHeader, headers::Cookie};
use serde::Deserialize;
use uuid::Uuid;
use tracing::{info, warn};

use crate::{
    auth::{self, cleared_session_cookie, session_cookie, SESSION_COOKIE},
    errors::AppError,
    forms::FieldErrors,
    handlers::{found, INDEX_URL},
    pages::{LoggedOutPage, LoginPage, SignupPage},
    repositories::user_repository,
    AppState,
};

const MAX_USERNAME_LENGTH: usize = 150;
const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl SignupForm {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let username = self.username.trim();

        if username.is_empty() {
            errors.entry("username".into()).or_default().push("This field is required.".into());
        } else if username.chars().count() > MAX_USERNAME_LENGTH {
            errors.entry("username".into()).or_default().push(format!(
                "Ensure this value has at most {} characters.",
                MAX_USERNAME_LENGTH
            ));
        } else if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            errors.entry("username".into()).or_default().push(
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                    .into(),
            );
        }

        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.entry("password".into()).or_default().push(format!(
                "This password is too short. It must contain at least {} characters.",
                MIN_PASSWORD_LENGTH
            ));
        }
        if self.password != self.password_confirm {
            errors
                .entry("password_confirm".into())
                .or_default()
                .push("The two password fields didn't match.".into());
        }
        errors
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextParams {
    #[serde(default)]
    pub next: Option<String>,
}

// Only same-site paths are followed after login.
fn safe_next(next: Option<&str>) -> Option<String> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//"))
        .map(str::to_owned)
}

fn logged_in_response(state: &AppState, user_id: i64, location: String) -> Response {
    let token = state.sessions.create(user_id);
    let mut response = found(location);
    response
        .headers_mut()
        .insert(header::SET_COOKIE, session_cookie(token, state.sessions.ttl()));
    response
}

pub async fn signup_form_handler() -> Json<SignupPage> {
    Json(SignupPage::default())
}

/// Handler to register a new user and log them in.
pub async fn signup_handler(
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let mut errors = form.validate();
    let username = form.username.trim().to_string();

    if !errors.contains_key("username") && user_repository::username_exists(&state.db_pool, &username).await? {
        errors
            .entry("username".into())
            .or_default()
            .push("A user with that username already exists.".into());
    }

    if !errors.is_empty() {
        return Ok(Json(SignupPage { username, errors }).into_response());
    }

    let user = auth::register_user(&state.db_pool, &username, &form.password).await?;
    info!(user_id = user.id, username = %user.username, "Registered new user");
    Ok(logged_in_response(&state, user.id, INDEX_URL.to_string()))
}

pub async fn login_form_handler(Query(params): Query<NextParams>) -> Json<LoginPage> {
    Json(LoginPage {
        next: safe_next(params.next.as_deref()),
        ..LoginPage::default()
    })
}

/// Handler to log a user in and send them back where they came from.
pub async fn login_handler(
    State(state): State<AppState>,
    Query(params): Query<NextParams>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = safe_next(form.next.as_deref().or(params.next.as_deref()));
    let username = form.username.trim().to_string();

    match auth::authenticate(&state.db_pool, &username, &form.password).await? {
        Some(user) => {
            info!(user_id = user.id, "User logged in");
            Ok(logged_in_response(&state, user.id, next.unwrap_or_else(|| INDEX_URL.to_string())))
        }
        None => {
            warn!(username = %username, "Failed login attempt");
            let mut errors = FieldErrors::new();
            errors.entry("__all__".into()).or_default().push(
                "Please enter a correct username and password. Note that both fields may be case-sensitive."
                    .into(),
            );
            Ok(Json(LoginPage { username, next, errors }).into_response())
        }
    }
}

/// Handler to end the current session, if any.
pub async fn logout_handler(
    State(state): State<AppState>,
    cookie: Option<TypedHeader<Cookie>>,
) -> Response {
    let token = cookie
        .as_ref()
        .and_then(|TypedHeader(c)| c.get(SESSION_COOKIE))
        .and_then(|value| Uuid::parse_str(value).ok());
    if let Some(token) = token {
        if state.sessions.destroy(token) {
            info!("User logged out");
        }
    }

    let mut response = Json(LoggedOutPage {
        message: "You have been logged out.".to_string(),
    })
    .into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, cleared_session_cookie());
    response
}
