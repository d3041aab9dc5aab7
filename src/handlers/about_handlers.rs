use axum::{extract::State, Json};

use crate::{pages::AboutPage, AppState};

pub async fn about_author_handler(State(state): State<AppState>) -> Json<AboutPage> {
    Json(AboutPage {
        site_name: state.config.site_name.clone(),
        title: "About the author".to_string(),
        body: "A small blogging platform for writing posts, grouping them and following other authors."
            .to_string(),
    })
}

pub async fn about_tech_handler(State(state): State<AppState>) -> Json<AboutPage> {
    Json(AboutPage {
        site_name: state.config.site_name.clone(),
        title: "Technologies".to_string(),
        body: "Rust, axum, sqlx over SQLite, tokio and tracing.".to_string(),
    })
}
