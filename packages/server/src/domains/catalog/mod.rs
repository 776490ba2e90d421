//! Manufacturers, categories, products and their extracted specifications.

pub mod activities;
pub mod errors;
pub mod jobs;
pub mod models;

pub use errors::CatalogError;
pub use jobs::CatalogJobHandler;
