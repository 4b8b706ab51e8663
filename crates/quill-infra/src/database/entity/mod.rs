//! SeaORM entities, one module per table.

pub mod article;
pub mod comment;
pub mod profile;
pub mod user;
