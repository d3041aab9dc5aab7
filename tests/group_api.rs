// tests/group_api.rs

mod common;

use axum::http::StatusCode;
use blog_server::{
    pages::{GroupPage, IndexPage, ProfilePage},
    seeder::seed_database,
    repositories::group_repository,
};

use common::helpers::create_test_app;

#[tokio::test]
async fn test_group_page_lists_only_its_posts() {
    let app = create_test_app().await;
    let user = app.create_user("leo").await;
    let cats = app.create_group("Cats", "cats").await;
    let dogs = app.create_group("Dogs", "dogs").await;
    let cat_post = app.create_post(&user, "Meow", Some(&cats)).await;
    app.create_post(&user, "Woof", Some(&dogs)).await;
    app.create_post(&user, "Nothing in particular", None).await;

    let response = app.get("/group/cats/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    let page: GroupPage = response.json();
    assert_eq!(page.group, cats);
    assert_eq!(page.page_obj.count, 1);
    assert_eq!(page.page_obj.object_list[0].id, cat_post);

    // The same post shows up on the index and the author's profile too
    let index: IndexPage = app.get("/", None).await.json();
    assert!(index.page_obj.object_list.iter().any(|p| p.id == cat_post));

    let profile: ProfilePage = app.get("/profile/leo/", None).await.json();
    assert!(profile.page_obj.object_list.iter().any(|p| p.id == cat_post));

    // ...but not in another group
    let dogs_page: GroupPage = app.get("/group/dogs/", None).await.json();
    assert_eq!(dogs_page.page_obj.count, 1);
    assert!(dogs_page.page_obj.object_list.iter().all(|p| p.id != cat_post));
}

#[tokio::test]
async fn test_group_page_paginates() {
    let app = create_test_app().await;
    let user = app.create_user("leo").await;
    let cats = app.create_group("Cats", "cats").await;
    for i in 0..13 {
        app.create_post(&user, &format!("Cat post {}", i), Some(&cats)).await;
    }

    let first: GroupPage = app.get("/group/cats/", None).await.json();
    assert_eq!(first.page_obj.len(), 10);

    let second: GroupPage = app.get("/group/cats/?page=2", None).await.json();
    assert_eq!(second.page_obj.len(), 3);
}

#[tokio::test]
async fn test_unknown_group_is_not_found() {
    let app = create_test_app().await;
    let response = app.get("/group/nope/", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_group_renders() {
    let app = create_test_app().await;
    app.create_group("Cats", "cats").await;

    let page: GroupPage = app.get("/group/cats/", None).await.json();
    assert!(page.page_obj.is_empty());
    assert_eq!(page.page_obj.number, 1);
}

#[tokio::test]
async fn test_seeder_is_idempotent() {
    let app = create_test_app().await;

    seed_database(&app.pool).await.unwrap();
    let seeded = group_repository::list_groups(&app.pool).await.unwrap();
    assert!(!seeded.is_empty());

    seed_database(&app.pool).await.unwrap();
    let again = group_repository::list_groups(&app.pool).await.unwrap();
    assert_eq!(seeded, again);

    let response = app.get(&format!("/group/{}/", seeded[0].slug), None).await;
    assert_eq!(response.status, StatusCode::OK);
}
