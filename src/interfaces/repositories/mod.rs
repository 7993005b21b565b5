pub mod image;
pub mod memory;
pub mod pending_deletion;
pub mod settings;
pub mod sqlx_repo;
pub mod token;
