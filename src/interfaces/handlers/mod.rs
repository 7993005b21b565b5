pub mod admin_images;
pub mod assets;
pub mod auth;
pub mod home;
pub mod images;
pub mod json_error;
pub mod settings;
pub mod system;
