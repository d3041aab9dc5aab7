// tests/follow_api.rs

mod common;

use axum::http::StatusCode;
use blog_server::{
    pages::{FollowPage, ProfilePage},
    repositories::follow_repository,
};

use common::helpers::create_test_app;

#[tokio::test]
async fn test_follow_creates_single_relation() {
    let app = create_test_app().await;
    let reader = app.create_user("ann").await;
    let author = app.create_user("leo").await;
    let cookie = app.login(&reader);

    let response = app.get("/profile/leo/follow/", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), "/follow/");
    assert!(follow_repository::is_following(&app.pool, reader.id, author.id).await.unwrap());

    // Following again keeps one relation
    let response = app.get("/profile/leo/follow/", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(follow_repository::count_following(&app.pool, reader.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_cannot_follow_yourself() {
    let app = create_test_app().await;
    let user = app.create_user("leo").await;
    let cookie = app.login(&user);

    let response = app.get("/profile/leo/follow/", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(follow_repository::count_following(&app.pool, user.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_follow_requires_login() {
    let app = create_test_app().await;
    app.create_user("leo").await;

    let response = app.get("/profile/leo/follow/", None).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), "/auth/login/?next=%2Fprofile%2Fleo%2Ffollow%2F");

    let response = app.get("/follow/", None).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), "/auth/login/?next=%2Ffollow%2F");
}

#[tokio::test]
async fn test_follow_unknown_author_is_not_found() {
    let app = create_test_app().await;
    let reader = app.create_user("ann").await;
    let cookie = app.login(&reader);

    let response = app.get("/profile/ghost/follow/", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unfollow_removes_relation() {
    let app = create_test_app().await;
    let reader = app.create_user("ann").await;
    let author = app.create_user("leo").await;
    let cookie = app.login(&reader);
    follow_repository::follow(&app.pool, reader.id, author.id).await.unwrap();

    let response = app.get("/profile/leo/unfollow/", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), "/follow/");
    assert!(!follow_repository::is_following(&app.pool, reader.id, author.id).await.unwrap());
}

#[tokio::test]
async fn test_unfollow_without_relation_is_not_found() {
    let app = create_test_app().await;
    let reader = app.create_user("ann").await;
    app.create_user("leo").await;
    let cookie = app.login(&reader);

    let response = app.get("/profile/leo/unfollow/", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feed_shows_only_followed_authors() {
    let app = create_test_app().await;
    let reader = app.create_user("ann").await;
    let bystander = app.create_user("bob").await;
    let author = app.create_user("leo").await;
    let other = app.create_user("max").await;
    let followed_post = app.create_post(&author, "Followed", None).await;
    app.create_post(&other, "Not followed", None).await;

    let reader_cookie = app.login(&reader);
    app.get("/profile/leo/follow/", Some(&reader_cookie)).await;

    let feed: FollowPage = app.get("/follow/", Some(&reader_cookie)).await.json();
    assert_eq!(feed.page_obj.count, 1);
    assert_eq!(feed.page_obj.object_list[0].id, followed_post);

    let bystander_cookie = app.login(&bystander);
    let feed: FollowPage = app.get("/follow/", Some(&bystander_cookie)).await.json();
    assert!(feed.page_obj.is_empty());

    // New posts by the followed author appear straight away
    let fresh_post = app.create_post(&author, "Fresh", None).await;
    let feed: FollowPage = app.get("/follow/", Some(&reader_cookie)).await.json();
    assert_eq!(feed.page_obj.object_list[0].id, fresh_post);
}

#[tokio::test]
async fn test_profile_reports_viewer_following() {
    let app = create_test_app().await;
    let reader = app.create_user("ann").await;
    let author = app.create_user("leo").await;
    app.create_post(&author, "One", None).await;
    app.create_post(&author, "Two", None).await;
    let cookie = app.login(&reader);

    let page: ProfilePage = app.get("/profile/leo/", Some(&cookie)).await.json();
    assert!(!page.following);
    assert_eq!(page.author.posts_count, 2);
    assert_eq!(page.author.id, author.id);

    follow_repository::follow(&app.pool, reader.id, author.id).await.unwrap();
    let page: ProfilePage = app.get("/profile/leo/", Some(&cookie)).await.json();
    assert!(page.following);

    let anonymous: ProfilePage = app.get("/profile/leo/", None).await.json();
    assert!(!anonymous.following);
}

#[tokio::test]
async fn test_unknown_profile_is_not_found() {
    let app = create_test_app().await;
    let response = app.get("/profile/ghost/", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
