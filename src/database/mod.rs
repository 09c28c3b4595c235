pub mod entity;
pub mod manager;
pub mod models;
pub mod query;
pub mod repository;

pub use entity::Entity;
pub use manager::{Database, DatabaseError};
pub use repository::{by_key, by_keys, to_columns, Repository};
