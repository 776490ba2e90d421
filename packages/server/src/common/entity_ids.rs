//! Id aliases for every persisted entity.

pub use super::id::Id;

pub struct Manufacturer;
pub struct Category;
pub struct Product;
pub struct ExtractionRun;
pub struct Job;

pub type ManufacturerId = Id<Manufacturer>;
pub type CategoryId = Id<Category>;
pub type ProductId = Id<Product>;
pub type ExtractionRunId = Id<ExtractionRun>;
pub type JobId = Id<Job>;
