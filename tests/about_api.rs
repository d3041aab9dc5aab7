// tests/about_api.rs

mod common;

use axum::http::StatusCode;
use blog_server::pages::{AboutPage, ErrorPage};

use common::helpers::create_test_app;

#[tokio::test]
async fn test_static_pages_are_public() {
    let app = create_test_app().await;

    for uri in ["/about/author/", "/about/tech/"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status, StatusCode::OK, "{} should be reachable", uri);
        let page: AboutPage = response.json();
        assert_eq!(page.site_name, "Test Blog");
        assert!(!page.title.is_empty());
    }
}

#[tokio::test]
async fn test_unknown_path_returns_404_page() {
    let app = create_test_app().await;

    let response = app.get("/unexisting_page/", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    let page: ErrorPage = response.json();
    assert_eq!(page.path, "/unexisting_page/");
}
