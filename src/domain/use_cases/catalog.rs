use std::sync::Arc;

use uuid::Uuid;

use crate::{
    entities::image::{ImageQuery, ImageRecord},
    errors::AppError,
    ordering::{sample, sort_for_display},
    repositories::image::ImageRepository,
};

/// Read side of the image store, shared by every public listing.
pub struct ImageCatalog {
    pub image_repo: Arc<dyn ImageRepository>,
}

impl ImageCatalog {
    pub fn new(image_repo: Arc<dyn ImageRepository>) -> Self {
        ImageCatalog { image_repo }
    }

    /// Matching records in display order, or the repository error.
    pub async fn sorted_images(&self, query: &ImageQuery) -> Result<Vec<ImageRecord>, AppError> {
        let mut images = self.image_repo.list_images(query).await?;
        sort_for_display(&mut images);
        Ok(images)
    }

    /// Visitors never see a load failure: it is logged and reads as empty.
    pub async fn images_for(&self, query: &ImageQuery) -> Vec<ImageRecord> {
        match self.sorted_images(query).await {
            Ok(images) => images,
            Err(e) => {
                tracing::error!(
                    category = %query.category,
                    subcategory = ?query.subcategory,
                    error = %e,
                    "Failed to load images"
                );
                Vec::new()
            }
        }
    }

    pub async fn random_images(&self, query: &ImageQuery, count: usize) -> Vec<ImageRecord> {
        let images = self.images_for(query).await;
        sample(&images, count, &mut rand::thread_rng())
    }

    pub async fn image_by_id(&self, id: &Uuid) -> Result<ImageRecord, AppError> {
        self.image_repo.get_image(id).await
    }
}
