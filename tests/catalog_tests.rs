mod test_utils;

use std::sync::Arc;

use artfolio_backend::{
    entities::image::{Category, ImageInsert, ImageQuery},
    errors::AppError,
    repositories::{image::ImageRepository, memory::MemoryRepo},
    use_cases::catalog::ImageCatalog,
};
use chrono::{Duration, Utc};
use test_utils::MockImageRepo;
use uuid::Uuid;

fn insert(category: Category, subcategory: Option<&str>, name: &str, sort_order: Option<i64>) -> ImageInsert {
    ImageInsert {
        url: format!("/assets/{category}/{name}"),
        storage_path: format!("{category}/{name}"),
        filename: name.to_string(),
        original_name: name.to_string(),
        category,
        subcategory: subcategory.map(str::to_string),
        custom_name: None,
        price: None,
        description: None,
        sort_order,
        uploaded_at: Utc::now() - Duration::minutes(1),
        size: 12,
        content_type: "image/png".to_string(),
    }
}

async fn seeded_catalog() -> ImageCatalog {
    let repo = MemoryRepo::new();
    for image in [
        insert(Category::Store, Some("prints"), "print-b.png", Some(2)),
        insert(Category::Store, Some("prints"), "print-a.png", Some(1)),
        insert(Category::Store, Some("apparel"), "shirt.png", Some(0)),
        insert(Category::Gallery, None, "wall.png", None),
    ] {
        repo.insert_image(&image).await.unwrap();
    }
    ImageCatalog::new(Arc::new(repo))
}

#[tokio::test]
async fn subcategory_query_excludes_siblings() {
    let catalog = seeded_catalog().await;

    let prints = catalog
        .images_for(&ImageQuery::new(Category::Store, Some("prints")))
        .await;

    let names: Vec<_> = prints.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, ["print-a.png", "print-b.png"]);
}

#[tokio::test]
async fn category_query_includes_every_subcategory_in_order() {
    let catalog = seeded_catalog().await;

    let store = catalog.images_for(&ImageQuery::new(Category::Store, None)).await;

    let names: Vec<_> = store.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, ["shirt.png", "print-a.png", "print-b.png"]);
}

#[tokio::test]
async fn empty_category_yields_empty_list() {
    let catalog = seeded_catalog().await;

    assert!(catalog.images_for(&ImageQuery::new(Category::About, None)).await.is_empty());
    assert!(catalog
        .random_images(&ImageQuery::new(Category::Collaborations, None), 3)
        .await
        .is_empty());
}

#[tokio::test]
async fn random_images_respects_count() {
    let catalog = seeded_catalog().await;

    let picked = catalog.random_images(&ImageQuery::new(Category::Store, None), 2).await;

    assert_eq!(picked.len(), 2);
    assert!(picked.iter().all(|r| r.category == Category::Store));
}

#[tokio::test]
async fn failing_store_reads_as_empty_for_visitors() {
    let mut repo = MockImageRepo::new();
    repo.expect_list_images()
        .returning(|_| Err(AppError::InternalError("connection reset".into())));
    let catalog = ImageCatalog::new(Arc::new(repo));
    let query = ImageQuery::new(Category::Gallery, None);

    assert!(catalog.images_for(&query).await.is_empty());
    assert!(catalog.sorted_images(&query).await.is_err());
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let catalog = seeded_catalog().await;

    let result = catalog.image_by_id(&Uuid::new_v4()).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
