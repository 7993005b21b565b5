use std::sync::Arc;

use crate::repositories::{
    image::ImageRepository, memory::MemoryRepo, pending_deletion::PendingDeletionRepository,
    settings::SettingsRepository, sqlx_repo::SqlxRepo,
};

/// The record-store handles every use case is built from.
#[derive(Clone)]
pub struct SharedRepositories {
    pub images: Arc<dyn ImageRepository>,
    pub pending_deletions: Arc<dyn PendingDeletionRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub backend: &'static str,
}

impl SharedRepositories {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let repo = Arc::new(SqlxRepo::new(pool));
        SharedRepositories {
            images: repo.clone(),
            pending_deletions: repo.clone(),
            settings: repo,
            backend: "postgres",
        }
    }

    /// No database configured: everything lives in process memory.
    pub fn in_memory() -> Self {
        Self::from_memory(MemoryRepo::new())
    }

    pub fn from_memory(repo: MemoryRepo) -> Self {
        let repo = Arc::new(repo);
        SharedRepositories {
            images: repo.clone(),
            pending_deletions: repo.clone(),
            settings: repo,
            backend: "memory",
        }
    }
}
