//! Health probe and admin surface tests.

mod common;

use reqwest::StatusCode;
use sdk_rust::{PageView, SubscribeRequest, WaitlistClient};
use serde_json::{json, Value};

fn admin_config() -> waitlist_api::config::ApiConfig {
    let mut config = common::test_config();
    config.admin.enabled = true;
    config.admin.api_key = "test-admin-key".to_string();
    config
}

#[tokio::test]
async fn test_health_reports_database_connected() {
    let app = common::spawn_app(common::test_config()).await;
    let client = common::http_client();

    let resp = client
        .get(app.url("/health/db"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["message"], "Database connected successfully");
    assert_eq!(body["data"]["hasDatabase"], json!(true));
    assert_eq!(body["data"]["subscriberCount"], json!(0));
    assert_eq!(body["data"]["environment"], "development");
    assert!(body["timestamp"].as_str().is_some_and(|t| !t.is_empty()));

    let api = WaitlistClient::new(&app.base_url());
    assert_eq!(api.health().await.expect("probe"), StatusCode::OK);

    app.shutdown.trigger();
}

#[tokio::test]
async fn test_health_head_answers_without_a_body() {
    let app = common::spawn_app(common::test_config()).await;
    let client = common::http_client();

    let resp = client
        .head(app.url("/health/db"))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("body");
    assert!(body.is_empty());

    app.shutdown.trigger();
}

#[tokio::test]
async fn test_admin_routes_require_the_bearer_key() {
    let app = common::spawn_app(admin_config()).await;
    let client = common::http_client();

    let missing = client
        .get(app.url("/admin/status"))
        .send()
        .await
        .expect("request");
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = client
        .get(app.url("/admin/status"))
        .header("authorization", "Bearer wrong-key")
        .send()
        .await
        .expect("request");
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let authorized = client
        .get(app.url("/admin/status"))
        .header("authorization", "Bearer test-admin-key")
        .send()
        .await
        .expect("request");
    assert_eq!(authorized.status(), StatusCode::OK);

    let body: Value = authorized.json().await.expect("json body");
    assert!(body["version"].as_str().is_some_and(|v| !v.is_empty()));
    assert_eq!(body["environment"], "development");

    app.shutdown.trigger();
}

#[tokio::test]
async fn test_admin_routes_absent_when_disabled() {
    let app = common::spawn_app(common::test_config()).await;
    let client = common::http_client();

    let resp = client
        .get(app.url("/admin/status"))
        .header("authorization", "Bearer test-admin-key")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    app.shutdown.trigger();
}

#[tokio::test]
async fn test_admin_subscriber_overview() {
    let app = common::spawn_app(admin_config()).await;
    let api = WaitlistClient::new(&app.base_url());

    for email in ["one@example.com", "two@example.com"] {
        api.subscribe(&SubscribeRequest {
            email: Some(email.to_string()),
            ..Default::default()
        })
        .await
        .expect("signup");
    }

    let resp = common::http_client()
        .get(app.url("/admin/subscribers"))
        .header("authorization", "Bearer test-admin-key")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["total"], json!(2));
    assert_eq!(body["active"], json!(2));
    assert_eq!(body["unsubscribed"], json!(0));
    let recent = body["recent"].as_array().expect("recent array");
    assert_eq!(recent.len(), 2);
    assert!(recent.iter().all(|r| r["status"] == "active"));

    app.shutdown.trigger();
}

#[tokio::test]
async fn test_admin_analytics_reports_page_views() {
    let app = common::spawn_app(admin_config()).await;
    let api = WaitlistClient::new(&app.base_url());

    api.track_page_view(&PageView {
        page: Some("/hero".to_string()),
        ..Default::default()
    })
    .await
    .expect("track");

    let resp = common::http_client()
        .get(app.url("/admin/analytics"))
        .header("authorization", "Bearer test-admin-key")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["totalViews"], json!(1));
    assert_eq!(body["topPages"][0]["page"], "/hero");

    app.shutdown.trigger();
}
