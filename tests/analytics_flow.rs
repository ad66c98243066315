//! Analytics ingestion and reporting tests.

mod common;

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use sdk_rust::{PageView, SubscribeRequest, WaitlistClient};
use serde_json::{json, Value};
use sqlx::Row;

async fn post_event(app: &common::TestApp, body: Value) -> reqwest::Response {
    common::http_client()
        .post(app.url("/api/analytics"))
        .json(&body)
        .send()
        .await
        .expect("request")
}

async fn fetch_stats(app: &common::TestApp, query: &str) -> Value {
    let resp = common::http_client()
        .get(app.url(&format!("/api/analytics/page-view{query}")))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("json body")
}

#[tokio::test]
async fn test_page_view_beacon_persists_and_reports() {
    let app = common::spawn_app(common::test_config()).await;
    let client = WaitlistClient::new(&app.base_url());

    let receipt = client
        .track_page_view(&PageView {
            page: Some("/pricing".to_string()),
            referrer: Some("https://search.example/".to_string()),
            session_id: Some("sess-1".to_string()),
        })
        .await
        .expect("track");
    assert!(receipt.success);
    assert!(!receipt.page_view_id.is_empty());

    let stats = fetch_stats(&app, "").await;
    assert_eq!(stats["success"], json!(true));
    assert_eq!(stats["data"]["totalViews"], json!(1));
    assert_eq!(stats["data"]["uniqueVisitors"], json!(1));
    assert_eq!(stats["data"]["topPages"][0]["page"], "/pricing");
    assert_eq!(stats["data"]["topPages"][0]["views"], json!(1));
    assert_eq!(stats["data"]["period"], "7 days");

    app.shutdown.trigger();
}

#[tokio::test]
async fn test_stats_can_filter_by_page() {
    let app = common::spawn_app(common::test_config()).await;
    let client = WaitlistClient::new(&app.base_url());

    for page in ["/pricing", "/pricing", "/faq"] {
        client
            .track_page_view(&PageView {
                page: Some(page.to_string()),
                ..Default::default()
            })
            .await
            .expect("track");
    }

    let all = fetch_stats(&app, "").await;
    assert_eq!(all["data"]["totalViews"], json!(3));
    assert_eq!(all["data"]["topPages"][0]["page"], "/pricing");
    assert_eq!(all["data"]["topPages"][0]["views"], json!(2));

    let filtered = fetch_stats(&app, "?page=/pricing").await;
    assert_eq!(filtered["data"]["totalViews"], json!(2));

    app.shutdown.trigger();
}

#[tokio::test]
async fn test_page_view_event_extracts_utm_from_url() {
    let app = common::spawn_app(common::test_config()).await;

    let resp = post_event(
        &app,
        json!({
            "event": "page_view",
            "properties": {
                "url": "https://site.test/courses?utm_source=twitter&utm_medium=social",
                "referrer": "https://t.co/abc",
            }
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["success"], json!(true));

    let pool = common::open_test_db(&app.db_path).await;
    let row = sqlx::query("SELECT page, utm_source, utm_medium, referrer FROM page_views")
        .fetch_one(&pool)
        .await
        .expect("fetch row");
    let page: String = row.get("page");
    let utm_source: Option<String> = row.get("utm_source");
    let utm_medium: Option<String> = row.get("utm_medium");
    let referrer: Option<String> = row.get("referrer");
    assert_eq!(
        page,
        "https://site.test/courses?utm_source=twitter&utm_medium=social"
    );
    assert_eq!(utm_source.as_deref(), Some("twitter"));
    assert_eq!(utm_medium.as_deref(), Some("social"));
    assert_eq!(referrer.as_deref(), Some("https://t.co/abc"));

    app.shutdown.trigger();
}

#[tokio::test]
async fn test_event_name_is_required() {
    let app = common::spawn_app(common::test_config()).await;

    for body in [
        json!({ "properties": { "url": "/x" } }),
        json!({ "event": "" }),
        json!({ "event": 42 }),
    ] {
        let resp = post_event(&app, body).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = resp.json().await.expect("json body");
        assert_eq!(body["error"], "Event name is required");
    }

    app.shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_events_are_swallowed() {
    let app = common::spawn_app(common::test_config()).await;

    let resp = post_event(&app, json!({ "event": "mystery_event" })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["success"], json!(true));

    let stats = fetch_stats(&app, "").await;
    assert_eq!(stats["data"]["totalViews"], json!(0));

    app.shutdown.trigger();
}

#[tokio::test]
async fn test_signup_event_refreshes_subscriber_attribution() {
    let app = common::spawn_app(common::test_config()).await;
    let client = WaitlistClient::new(&app.base_url());

    client
        .subscribe(&SubscribeRequest {
            email: Some("eve@example.com".to_string()),
            ..Default::default()
        })
        .await
        .expect("signup");

    // waitlist_join is the legacy frontend's name for email_signup.
    let resp = post_event(
        &app,
        json!({
            "event": "waitlist_join",
            "properties": {
                "email": "eve@example.com",
                "url": "https://site.test/?utm_source=newsletter&utm_campaign=launch",
            }
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let pool = common::open_test_db(&app.db_path).await;
    let row = sqlx::query(
        "SELECT referral_source, referral_campaign, last_engagement \
         FROM subscribers WHERE email = ?1",
    )
    .bind("eve@example.com")
    .fetch_one(&pool)
    .await
    .expect("fetch row");
    let referral_source: Option<String> = row.get("referral_source");
    let referral_campaign: Option<String> = row.get("referral_campaign");
    let last_engagement: Option<String> = row.get("last_engagement");
    assert_eq!(referral_source.as_deref(), Some("newsletter"));
    assert_eq!(referral_campaign.as_deref(), Some("launch"));
    assert!(last_engagement.is_some());

    // The conversion also counts as a page view.
    let stats = fetch_stats(&app, "").await;
    assert_eq!(stats["data"]["totalViews"], json!(1));

    app.shutdown.trigger();
}

#[tokio::test]
async fn test_interaction_events_land_under_synthetic_pages() {
    let app = common::spawn_app(common::test_config()).await;

    for body in [
        json!({ "event": "chatbot_interaction", "properties": { "action": "open" } }),
        json!({ "event": "section_view", "properties": { "section": "pricing" } }),
        json!({ "event": "section_view", "properties": {} }),
    ] {
        let resp = post_event(&app, body).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let stats = fetch_stats(&app, "").await;
    assert_eq!(stats["data"]["totalViews"], json!(3));
    let pages: Vec<&str> = stats["data"]["topPages"]
        .as_array()
        .expect("top pages")
        .iter()
        .map(|p| p["page"].as_str().unwrap_or_default())
        .collect();
    assert!(pages.contains(&"/chatbot-interaction"));
    assert!(pages.contains(&"/section/pricing"));
    assert!(pages.contains(&"/section/unknown"));

    app.shutdown.trigger();
}

#[tokio::test]
async fn test_event_timestamps_respect_the_stats_window() {
    let app = common::spawn_app(common::test_config()).await;

    let last_month = (Utc::now() - Duration::days(30)).timestamp_millis();
    let resp = post_event(
        &app,
        json!({
            "event": "page_view",
            "properties": { "url": "/archive", "timestamp": last_month }
        }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let recent = fetch_stats(&app, "?days=7").await;
    assert_eq!(recent["data"]["totalViews"], json!(0));

    let wide = fetch_stats(&app, "?days=60").await;
    assert_eq!(wide["data"]["totalViews"], json!(1));

    app.shutdown.trigger();
}
