use thiserror::Error;

use crate::common::{CategoryId, ManufacturerId};

/// Catalog rule violations the API reports to the caller.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),

    #[error("Manufacturer {0} does not exist")]
    UnknownManufacturer(ManufacturerId),

    #[error("Category {0} does not exist")]
    UnknownCategory(CategoryId),

    #[error("A category cannot be moved under itself or one of its descendants")]
    CategoryCycle,

    #[error("Category has {0} subcategories; delete or move them first")]
    CategoryHasChildren(i64),
}

/// Trimmed, non-empty name.
pub fn require_name(raw: &str, what: &str) -> Result<String, CatalogError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CatalogError::Validation(format!("{} name is required", what)));
    }
    Ok(name.to_string())
}
