pub mod admin_images;
pub mod auth;
pub mod catalog;
pub mod extractors;
pub mod settings;
