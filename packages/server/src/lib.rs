// Materials spec pipeline - server core
//
// Scrapes manufacturer catalogues, extracts technical specifications from
// product datasheets and serves the catalog over REST with semantic search.
//
// Business logic is organized per-domain in domains/*/activities/

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
