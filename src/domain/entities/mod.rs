pub mod image;
pub mod option_fields;
pub mod pending_deletion;
pub mod settings;
pub mod token;
