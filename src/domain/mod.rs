pub mod entities;
pub mod ordering;
pub mod use_cases;
