//! Integration tests for the operational endpoints

mod common;

use chirpy::configuration::Platform;
use common::{spawn_app, spawn_app_on};

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app();

    let response = app
        .client
        .get(app.url("/api/healthz"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn metrics_count_file_server_hits() {
    let app = spawn_app();

    for _ in 0..3 {
        app.client
            .get(app.url("/app/"))
            .send()
            .await
            .expect("Failed to execute request");
    }
    // Not under /app, so not counted
    app.client.get(app.url("/api/healthz")).send().await.unwrap();

    let response = app
        .client
        .get(app.url("/admin/metrics"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(200, response.status().as_u16());
    let page = response.text().await.unwrap();
    assert!(page.contains("Welcome, Chirpy Admin"));
    assert!(page.contains("Chirpy has been visited 3 times!"));
}

#[tokio::test]
async fn app_serves_index_page() {
    let app = spawn_app();

    let response = app.client.get(app.url("/app/")).send().await.unwrap();

    assert_eq!(200, response.status().as_u16());
    assert!(response.text().await.unwrap().contains("Welcome to Chirpy"));
}

#[tokio::test]
async fn reset_clears_users_and_hits_on_dev() {
    let app = spawn_app();
    assert_eq!(201, app.register("alice@x.com", "pw1").await.status().as_u16());
    app.client.get(app.url("/app/")).send().await.unwrap();

    let response = app
        .client
        .post(app.url("/admin/reset"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(200, response.status().as_u16());

    let page = app
        .client
        .get(app.url("/admin/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Chirpy has been visited 0 times!"));

    // The email is free again
    assert_eq!(201, app.register("alice@x.com", "pw1").await.status().as_u16());
}

#[tokio::test]
async fn reset_is_forbidden_outside_dev() {
    let app = spawn_app_on(Platform::Production);
    assert_eq!(201, app.register("alice@x.com", "pw1").await.status().as_u16());

    let response = app
        .client
        .post(app.url("/admin/reset"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(403, response.status().as_u16());

    // Nothing was deleted
    assert_eq!(409, app.register("alice@x.com", "pw1").await.status().as_u16());
}
