#![allow(dead_code)]

use std::{collections::HashMap, net::TcpListener, path::PathBuf, sync::Arc, time::Duration};

use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use artfolio_backend::{
    auth::{jwt::JwtService, password::hash_password},
    entities::{
        image::{Category, ImageInsert, ImageQuery, ImageRecord, MetadataChanges},
        pending_deletion::PendingDeletion,
        token::AuthResponse,
    },
    errors::{AppError, StorageError},
    middlewares::auth::AuthMiddleware,
    ordering::SwapPlan,
    repositories::{image::ImageRepository, memory::MemoryRepo, token::TokenServiceRepository},
    routes::configure_routes,
    settings::{AppConfig, AppEnvironment},
    shared_repos::SharedRepositories,
    storage::{local::LocalAssetStorage, AssetStorage},
    AppState,
};
use async_trait::async_trait;
use mockall::mock;
use parking_lot::Mutex;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde_json::{json, Value};
use uuid::Uuid;

mock! {
    pub ImageRepo {}

    #[async_trait]
    impl ImageRepository for ImageRepo {
        async fn check_connection(&self) -> Result<(), AppError>;
        async fn insert_image(&self, image: &ImageInsert) -> Result<ImageRecord, AppError>;
        async fn get_image(&self, id: &Uuid) -> Result<ImageRecord, AppError>;
        async fn list_images(&self, query: &ImageQuery) -> Result<Vec<ImageRecord>, AppError>;
        async fn update_metadata(&self, id: &Uuid, changes: &MetadataChanges) -> Result<ImageRecord, AppError>;
        async fn swap_sort_orders(&self, plan: &SwapPlan) -> Result<(), AppError>;
        async fn delete_image_with_intent(&self, id: &Uuid) -> Result<PendingDeletion, AppError>;
        async fn list_orphans(&self, category: Category) -> Result<Vec<ImageRecord>, AppError>;
    }
}

/// Stores bytes in memory but refuses every delete.
#[derive(Default)]
pub struct UndeletableStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl AssetStorage for UndeletableStorage {
    async fn put(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<String, StorageError> {
        self.objects.lock().insert(path.to_string(), bytes.to_vec());
        Ok(self.public_url(path))
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        Err(StorageError::DeleteFailed(format!("{path}: permission denied")))
    }

    fn public_url(&self, path: &str) -> String {
        format!("/assets/{path}")
    }
}

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "CorrectHorse42!";

pub struct TestApp {
    pub state: web::Data<AppState>,
    pub repo: MemoryRepo,
    pub address: String,
    pub client: Client,
    pub config: AppConfig,
    pub storage_root: PathBuf,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let storage_root = std::env::temp_dir().join(format!("artfolio-test-{}", Uuid::new_v4()));
        let config = test_config(&storage_root);

        let repo = MemoryRepo::new();
        let storage: Arc<dyn AssetStorage> = Arc::new(LocalAssetStorage::new(
            storage_root.clone(),
            &config.public_asset_base_url,
        ));
        let state = web::Data::new(AppState::new(
            &config,
            SharedRepositories::from_memory(repo.clone()),
            storage,
        ));

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let server_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(server_state.clone())
                .wrap(AuthMiddleware)
                .wrap(NormalizePath::trim())
                .configure(configure_routes)
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(config.worker_count)
        .run();

        tokio::spawn(server);

        let client = Client::new();
        while client.get(format!("{}/health", address)).send().await.is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Self {
            state,
            repo,
            address,
            client,
            config,
            storage_root,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to send login request")
    }

    pub async fn admin_login(&self) -> AuthResponse {
        let response = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            panic!("Login failed: ({}): {}", status, body);
        }

        response.json().await.expect("Failed to parse login response")
    }

    pub async fn admin_token(&self) -> String {
        self.admin_login().await.access_token
    }

    /// Access token for an email outside the admin allow-list.
    pub fn visitor_token(&self) -> String {
        JwtService::new(&self.config)
            .create_jwt("visitor@example.com", false)
            .expect("Failed to create token")
    }

    pub async fn upload(&self, token: &str, form: Form) -> Response {
        self.client
            .post(self.url("/api/v1/admin/images"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("Failed to upload image")
    }

    /// Uploads a PNG and returns the created record as JSON.
    pub async fn upload_png(&self, token: &str, category: &str, subcategory: Option<&str>, name: &str) -> Value {
        let mut form = Form::new().text("category", category.to_string()).part(
            "file",
            Part::bytes(png_bytes())
                .file_name(name.to_string())
                .mime_str("image/png")
                .unwrap(),
        );
        if let Some(subcategory) = subcategory {
            form = form.text("subcategory", subcategory.to_string());
        }

        let response = self.upload(token, form).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        // keeps upload timestamps, and so default sort orders, distinct
        tokio::time::sleep(Duration::from_millis(2)).await;
        response.json().await.expect("Failed to parse upload response")
    }

    pub async fn list(&self, category: &str, subcategory: Option<&str>) -> Value {
        let mut request = self
            .client
            .get(self.url("/api/v1/images"))
            .query(&[("category", category)]);
        if let Some(subcategory) = subcategory {
            request = request.query(&[("subcategory", subcategory)]);
        }

        request
            .send()
            .await
            .expect("Failed to list images")
            .json()
            .await
            .expect("Failed to parse image list")
    }

    pub fn ids(list: &Value) -> Vec<String> {
        list["images"]
            .as_array()
            .expect("images array")
            .iter()
            .map(|image| image["id"].as_str().unwrap().to_string())
            .collect()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.storage_root);
    }
}

fn test_config(storage_root: &PathBuf) -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Artfolio Backend Test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        worker_count: 1,
        database_url: String::new(),
        redis_url: None,
        cors_allowed_origins: vec!["*".to_string()],
        jwt_secret: "test_jwt_secret_that_is_long_enough_for_hs512_1234567890".into(),
        jwt_expiration_minutes: 5,
        refresh_token_secret: "test_refresh_secret_that_is_long_enough_1234567890".into(),
        refresh_token_exp_days: 1,
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        admin_password_hash: hash_password(ADMIN_PASSWORD).expect("Failed to hash password"),
        storage_root: storage_root.to_string_lossy().into_owned(),
        public_asset_base_url: "/assets".to_string(),
        max_upload_bytes: 1024 * 1024,
        asset_sweep_interval_secs: 60,
        trust_x_forwarded_for: false,
    }
}

/// Smallest byte string `infer` recognises as a PNG.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0, 0, 0, 13, b'I', b'H', b'D', b'R', 0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0]);
    bytes
}

pub fn jpeg_bytes() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00]
}
