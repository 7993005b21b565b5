mod test_utils;

use reqwest::StatusCode;
use serde_json::{json, Value};
use test_utils::*;

async fn get_setting(app: &TestApp, key: &str) -> reqwest::Response {
    app.client
        .get(app.url(&format!("/api/v1/settings/{key}")))
        .send()
        .await
        .unwrap()
}

async fn put_setting(app: &TestApp, token: &str, key: &str, body: Value) -> reqwest::Response {
    app.client
        .put(app.url(&format!("/api/v1/admin/settings/{key}")))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[actix_rt::test]
async fn unset_settings_fall_back_to_defaults() {
    let app = TestApp::spawn().await;

    let featured: Value = get_setting(&app, "featured-text").await.json().await.unwrap();
    assert_eq!(featured["key"], "featured-text");
    assert_eq!(featured["title"], "About This Piece");
    assert_eq!(featured["isDefault"], true);
    assert!(featured["contentHtml"].as_str().unwrap().starts_with("<p>"));

    let banner: Value = get_setting(&app, "banner-purchase-url").await.json().await.unwrap();
    assert_eq!(banner["url"], Value::Null);
    assert_eq!(banner["isDefault"], true);
}

#[actix_rt::test]
async fn unknown_setting_is_not_found() {
    let app = TestApp::spawn().await;

    assert_eq!(get_setting(&app, "favicon").await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn featured_text_round_trips_through_put_and_get() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = put_setting(
        &app,
        &token,
        "featured-text",
        json!({ "title": "  Tidewater ", "content": "Oil on **linen**.<script>alert(1)</script>" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored: Value = get_setting(&app, "featured-text").await.json().await.unwrap();
    assert_eq!(stored["title"], "Tidewater");
    assert_eq!(stored["isDefault"], false);
    assert!(stored["updatedAt"].is_string());
    let html = stored["contentHtml"].as_str().unwrap();
    assert!(html.contains("<strong>linen</strong>"));
    assert!(!html.contains("<script>"));
}

#[actix_rt::test]
async fn invalid_documents_are_rejected() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let bad_scheme = put_setting(&app, &token, "banner-purchase-url", json!({ "url": "ftp://shop.example.com" })).await;
    assert_eq!(bad_scheme.status(), StatusCode::BAD_REQUEST);

    let traversal = put_setting(&app, &token, "background-image", json!({ "url": "/assets/../secrets" })).await;
    assert_eq!(traversal.status(), StatusCode::BAD_REQUEST);

    let empty_title = put_setting(&app, &token, "featured-text", json!({ "title": "   ", "content": "x" })).await;
    assert_eq!(empty_title.status(), StatusCode::BAD_REQUEST);

    let wrong_shape = put_setting(&app, &token, "banner-purchase-url", json!({ "href": "https://x.test" })).await;
    assert_eq!(wrong_shape.status(), StatusCode::BAD_REQUEST);

    let banner: Value = get_setting(&app, "banner-purchase-url").await.json().await.unwrap();
    assert_eq!(banner["isDefault"], true);
}

#[actix_rt::test]
async fn links_accept_http_urls_and_site_paths() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let banner = put_setting(&app, &token, "banner-purchase-url", json!({ "url": " https://shop.example.com/print " })).await;
    assert_eq!(banner.status(), StatusCode::OK);
    let banner: Value = banner.json().await.unwrap();
    assert_eq!(banner["url"], "https://shop.example.com/print");

    let background = put_setting(&app, &token, "background-image", json!({ "url": "/assets/about/wall.png" })).await;
    assert_eq!(background.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn clearing_restores_the_default_and_is_idempotent() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    put_setting(&app, &token, "banner-purchase-url", json!({ "url": "https://shop.example.com" })).await;

    for _ in 0..2 {
        let response = app
            .client
            .delete(app.url("/api/v1/admin/settings/banner-purchase-url"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let banner: Value = get_setting(&app, "banner-purchase-url").await.json().await.unwrap();
    assert_eq!(banner["url"], Value::Null);
    assert_eq!(banner["isDefault"], true);
}

#[actix_rt::test]
async fn writing_settings_requires_an_admin() {
    let app = TestApp::spawn().await;

    let response = put_setting(
        &app,
        &app.visitor_token(),
        "featured-text",
        json!({ "title": "Hijacked", "content": "" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
