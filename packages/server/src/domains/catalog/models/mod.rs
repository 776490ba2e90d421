pub mod category;
pub mod extraction_run;
pub mod manufacturer;
pub mod product;
pub mod product_embedding;
pub mod stats;

pub use category::{build_tree, Category, CategoryInput, CategoryNode};
pub use extraction_run::{ConflictReport, ExtractionRun};
pub use manufacturer::{Manufacturer, ManufacturerInput};
pub use product::{ExtractedSpecs, Product, ProductFilter, ProductInput, ScrapedProduct};
pub use product_embedding::{ProductEmbedding, EMBEDDING_DIMENSIONS};
pub use stats::{JobStatusCount, ManufacturerStats, Overview, Totals};
