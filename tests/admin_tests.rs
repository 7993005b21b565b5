mod test_utils;

use std::{sync::Arc, time::Duration};

use artfolio_backend::{
    background_task::start_asset_sweep,
    entities::{
        image::NewImageUpload,
        pending_deletion::{REASON_IMAGE_DELETED, REASON_UPLOAD_ABORTED},
    },
    errors::AppError,
    repositories::{image::ImageRepository, memory::MemoryRepo, pending_deletion::PendingDeletionRepository},
    storage::{local::LocalAssetStorage, AssetStorage},
    use_cases::admin_images::AdminImageHandler,
};
use chrono::Utc;
use reqwest::{
    multipart::{Form, Part},
    StatusCode,
};
use serde_json::{json, Value};
use test_utils::*;
use uuid::Uuid;

#[actix_rt::test]
async fn upload_creates_a_record_with_a_retrievable_asset() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let before = Utc::now().timestamp_millis();

    let record = app.upload_png(&token, "gallery", None, "Sunset Study.png").await;

    let after = Utc::now().timestamp_millis();
    let sort_order = record["sortOrder"].as_i64().unwrap();
    assert!(sort_order >= before && sort_order <= after);
    assert_eq!(record["category"], "gallery");
    assert_eq!(record["subcategory"], Value::Null);
    assert_eq!(record["originalName"], "Sunset Study.png");
    assert_eq!(record["type"], "image/png");
    assert!(record["filename"].as_str().unwrap().ends_with("_Sunset_Study.png"));
    assert!(record.get("storagePath").is_none());

    let list = app.list("gallery", None).await;
    assert_eq!(list["count"], 1);

    let asset = app
        .client
        .get(app.url(record["url"].as_str().unwrap()))
        .send()
        .await
        .unwrap();
    assert_eq!(asset.status(), StatusCode::OK);
    assert_eq!(asset.headers()["content-type"], "image/png");
    assert_eq!(asset.bytes().await.unwrap().to_vec(), png_bytes());
}

#[actix_rt::test]
async fn upload_trims_metadata_and_nests_subcategory_path() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let form = Form::new()
        .text("category", "store")
        .text("subcategory", "  prints ")
        .text("customName", "  Night Market ")
        .text("price", "   ")
        .part("file", Part::bytes(jpeg_bytes()).file_name("market.jpg"));

    let response = app.upload(&token, form).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let record: Value = response.json().await.unwrap();
    assert_eq!(record["subcategory"], "prints");
    assert_eq!(record["customName"], "Night Market");
    assert_eq!(record["price"], Value::Null);
    assert_eq!(record["type"], "image/jpeg");
    assert!(record["url"].as_str().unwrap().starts_with("/assets/store/prints/"));
}

#[actix_rt::test]
async fn upload_rejects_non_images_and_unknown_categories() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let text_file = Form::new()
        .text("category", "gallery")
        .part("file", Part::bytes(b"just some words".to_vec()).file_name("notes.txt"));
    let response = app.upload(&token, text_file).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let bad_category = Form::new()
        .text("category", "basement")
        .part("file", Part::bytes(png_bytes()).file_name("a.png"));
    let response = app.upload(&token, bad_category).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.list("gallery", None).await["count"], 0);
}

#[actix_rt::test]
async fn upload_requires_an_admin() {
    let app = TestApp::spawn().await;
    let form = || {
        Form::new()
            .text("category", "gallery")
            .part("file", Part::bytes(png_bytes()).file_name("a.png"))
    };

    let anonymous = app
        .client
        .post(app.url("/api/v1/admin/images"))
        .multipart(form())
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let visitor = app.upload(&app.visitor_token(), form()).await;
    assert_eq!(visitor.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn update_trims_sets_and_clears_fields() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let record = app.upload_png(&token, "store", Some("prints"), "print.png").await;
    let path = format!("/api/v1/admin/images/{}", record["id"].as_str().unwrap());

    let response = app
        .client
        .patch(app.url(&path))
        .bearer_auth(&token)
        .json(&json!({ "customName": "  Harbor ", "price": "$40", "description": "Giclée print" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["customName"], "Harbor");
    assert_eq!(updated["price"], "$40");

    let response = app
        .client
        .patch(app.url(&path))
        .bearer_auth(&token)
        .json(&json!({ "price": null, "description": "  " }))
        .send()
        .await
        .unwrap();
    let cleared: Value = response.json().await.unwrap();
    assert_eq!(cleared["customName"], "Harbor");
    assert_eq!(cleared["price"], Value::Null);
    assert_eq!(cleared["description"], Value::Null);
    assert_eq!(cleared["sortOrder"], record["sortOrder"]);
}

#[actix_rt::test]
async fn update_unknown_image_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;

    let response = app
        .client
        .patch(app.url(&format!("/api/v1/admin/images/{}", uuid::Uuid::new_v4())))
        .bearer_auth(&token)
        .json(&json!({ "price": "$1" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn delete_needs_confirmation_then_removes_record_and_asset() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let record = app.upload_png(&token, "gallery", None, "gone.png").await;
    let path = format!("/api/v1/admin/images/{}", record["id"].as_str().unwrap());

    let unconfirmed = app
        .client
        .delete(app.url(&path))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(unconfirmed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.list("gallery", None).await["count"], 1);

    let confirmed = app
        .client
        .delete(app.url(&format!("{path}?confirm=true")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(confirmed.status(), StatusCode::OK);
    let body: Value = confirmed.json().await.unwrap();
    assert_eq!(body["assetRemoved"], true);

    assert_eq!(app.list("gallery", None).await["count"], 0);
    let asset = app
        .client
        .get(app.url(record["url"].as_str().unwrap()))
        .send()
        .await
        .unwrap();
    assert_eq!(asset.status(), StatusCode::NOT_FOUND);
    assert!(app.state.admin_images.pending_deletions().await.unwrap().is_empty());
}

#[actix_rt::test]
async fn move_up_then_down_restores_the_original_order() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let first = app.upload_png(&token, "featured", Some("home"), "one.png").await;
    let second = app.upload_png(&token, "featured", Some("home"), "two.png").await;
    let original = TestApp::ids(&app.list("featured", Some("home")).await);
    assert_eq!(original, [first["id"].as_str().unwrap(), second["id"].as_str().unwrap()]);

    let move_second = |direction: &'static str| {
        app.client
            .post(app.url(&format!("/api/v1/admin/images/{}/move", second["id"].as_str().unwrap())))
            .bearer_auth(&token)
            .json(&json!({ "direction": direction }))
            .send()
    };

    let moved: Value = move_second("up").await.unwrap().json().await.unwrap();
    assert_eq!(moved["images"][0]["id"], second["id"]);
    assert_eq!(
        TestApp::ids(&app.list("featured", Some("home")).await),
        [second["id"].as_str().unwrap(), first["id"].as_str().unwrap()]
    );

    let at_top: Value = move_second("up").await.unwrap().json().await.unwrap();
    assert_eq!(at_top["images"][0]["id"], second["id"]);

    move_second("down").await.unwrap();
    let restored = app.list("featured", Some("home")).await;
    assert_eq!(TestApp::ids(&restored), original);
    assert_eq!(restored["images"][0]["sortOrder"], first["sortOrder"]);
    assert_eq!(restored["images"][1]["sortOrder"], second["sortOrder"]);
}

#[actix_rt::test]
async fn move_without_a_filter_swaps_within_the_whole_category() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let a = app.upload_png(&token, "featured", Some("home"), "a.png").await;
    let b = app.upload_png(&token, "featured", Some("hero"), "b.png").await;
    let c = app.upload_png(&token, "featured", Some("home"), "c.png").await;
    let id = |record: &Value| record["id"].as_str().unwrap().to_string();
    assert_eq!(TestApp::ids(&app.list("featured", None).await), [id(&a), id(&b), id(&c)]);

    let moved: Value = app
        .client
        .post(app.url(&format!("/api/v1/admin/images/{}/move", id(&c))))
        .bearer_auth(&token)
        .json(&json!({ "direction": "up" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(TestApp::ids(&moved), [id(&a), id(&c), id(&b)]);
    assert_eq!(TestApp::ids(&app.list("featured", None).await), [id(&a), id(&c), id(&b)]);
}

#[actix_rt::test]
async fn move_with_a_filter_swaps_within_that_subcategory() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let a = app.upload_png(&token, "featured", Some("home"), "a.png").await;
    let b = app.upload_png(&token, "featured", Some("hero"), "b.png").await;
    let c = app.upload_png(&token, "featured", Some("home"), "c.png").await;
    let id = |record: &Value| record["id"].as_str().unwrap().to_string();
    let move_request = |record: &Value, body: Value| {
        app.client
            .post(app.url(&format!("/api/v1/admin/images/{}/move", id(record))))
            .bearer_auth(&token)
            .json(&body)
            .send()
    };

    let moved: Value = move_request(&c, json!({ "direction": "up", "subcategory": "home" }))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(TestApp::ids(&moved), [id(&c), id(&a)]);
    assert_eq!(TestApp::ids(&app.list("featured", None).await), [id(&c), id(&b), id(&a)]);

    let outside = move_request(&b, json!({ "direction": "up", "subcategory": "home" }))
        .await
        .unwrap();
    assert_eq!(outside.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn orphan_view_flags_missing_subcategory_and_profile_names() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.upload_png(&token, "featured", None, "loose.png").await;
    app.upload_png(&token, "featured", Some("hero"), "profile-photo.png").await;
    app.upload_png(&token, "featured", Some("hero"), "banner.png").await;
    app.upload_png(&token, "gallery", None, "elsewhere.png").await;

    let response = app
        .client
        .get(app.url("/api/v1/admin/images/orphans"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();

    assert_eq!(body["count"], 2);
    let mut reasons: Vec<_> = body["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|image| image["reason"].as_str().unwrap().to_string())
        .collect();
    reasons.sort();
    assert_eq!(reasons, ["missing_subcategory", "profile_named"]);

    let gallery: Value = app
        .client
        .get(app.url("/api/v1/admin/images/orphans?category=gallery"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(gallery["count"], 1);
}

#[actix_rt::test]
async fn sweep_removes_queued_assets() {
    let app = TestApp::spawn().await;
    let storage = app.state.storage.clone();
    storage.put("gallery/stray.png", &png_bytes(), "image/png").await.unwrap();
    app.repo
        .queue_deletion("gallery/stray.png", REASON_UPLOAD_ABORTED)
        .await
        .unwrap();

    let report = app.state.admin_images.sweep_pending(10).await.unwrap();

    assert_eq!(report.attempted, 1);
    assert_eq!(report.removed, 1);
    assert!(storage.get("gallery/stray.png").await.is_err());
    assert!(app.repo.list_pending(10).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn public_listing_validates_the_category() {
    let app = TestApp::spawn().await;

    let unknown = app
        .client
        .get(app.url("/api/v1/images?category=basement"))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);

    let missing = app.client.get(app.url("/api/v1/images")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let empty = app.list("collaborations", None).await;
    assert_eq!(empty["count"], 0);
    assert_eq!(empty["images"], json!([]));
}

#[actix_rt::test]
async fn sample_endpoint_returns_at_most_count_records() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    for name in ["a.png", "b.png", "c.png"] {
        app.upload_png(&token, "featured", Some("carousel"), name).await;
    }

    let default: Value = app
        .client
        .get(app.url("/api/v1/images/sample?category=featured&subcategory=carousel"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(default["count"], 1);

    let many: Value = app
        .client
        .get(app.url("/api/v1/images/sample?category=featured&subcategory=carousel&count=10"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(many["count"], 3);

    let too_many = app
        .client
        .get(app.url("/api/v1/images/sample?category=featured&count=51"))
        .send()
        .await
        .unwrap();
    assert_eq!(too_many.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn background_sweep_clears_queued_assets() {
    let app = TestApp::spawn().await;
    let storage = app.state.storage.clone();
    storage.put("gallery/left-behind.png", &png_bytes(), "image/png").await.unwrap();
    app.repo
        .queue_deletion("gallery/left-behind.png", REASON_IMAGE_DELETED)
        .await
        .unwrap();

    let sweep = tokio::spawn(start_asset_sweep(app.state.admin_images.clone(), Duration::from_millis(20)));

    let mut cleared = false;
    for _ in 0..100 {
        if app.repo.list_pending(10).await.unwrap().is_empty() {
            cleared = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    sweep.abort();

    assert!(cleared, "queued deletion was never swept");
    assert!(storage.get("gallery/left-behind.png").await.is_err());
}

fn gallery_upload(name: &str) -> NewImageUpload {
    NewImageUpload {
        bytes: png_bytes(),
        original_name: name.to_string(),
        category: "gallery".to_string(),
        subcategory: None,
        custom_name: None,
        price: None,
        description: None,
    }
}

#[actix_rt::test]
async fn failed_record_write_queues_the_fresh_asset_for_removal() {
    let root = std::env::temp_dir().join(format!("artfolio-abort-{}", Uuid::new_v4()));
    let storage: Arc<dyn AssetStorage> = Arc::new(LocalAssetStorage::new(root.clone(), "/assets"));
    let pending = MemoryRepo::new();
    let mut images = MockImageRepo::new();
    images
        .expect_insert_image()
        .returning(|_| Err(AppError::InternalError("connection reset".into())));
    let handler = AdminImageHandler::new(Arc::new(images), Arc::new(pending), storage.clone(), 1 << 20);

    let result = handler.upload(gallery_upload("lost.png")).await;
    assert!(matches!(result, Err(AppError::InternalError(_))));

    let queued = handler.pending_deletions().await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].reason, REASON_UPLOAD_ABORTED);
    assert!(queued[0].storage_path.starts_with("gallery/"));
    assert!(storage.get(&queued[0].storage_path).await.is_ok());

    let report = handler.sweep_pending(10).await.unwrap();
    assert_eq!(report.removed, 1);
    assert!(storage.get(&queued[0].storage_path).await.is_err());

    let _ = std::fs::remove_dir_all(&root);
}

#[actix_rt::test]
async fn failed_asset_delete_leaves_the_intent_for_the_sweep() {
    let repo = MemoryRepo::new();
    let handler = AdminImageHandler::new(
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(UndeletableStorage::default()),
        1 << 20,
    );
    let record = handler.upload(gallery_upload("kept.png")).await.unwrap();

    let asset_removed = handler.delete(&record.id, true).await.unwrap();

    assert!(!asset_removed);
    assert!(matches!(repo.get_image(&record.id).await, Err(AppError::NotFound(_))));
    let queued = handler.pending_deletions().await.unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].storage_path, record.storage_path);
    assert_eq!(queued[0].reason, REASON_IMAGE_DELETED);
    assert_eq!(queued[0].attempts, 1);
    assert!(queued[0].last_error.as_deref().unwrap().contains("permission denied"));

    let report = handler.sweep_pending(10).await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(handler.pending_deletions().await.unwrap()[0].attempts, 2);
}
