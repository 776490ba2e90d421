//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod deps;
pub mod extraction;
pub mod jobs;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use test_dependencies::TestDependencies;
pub use traits::*;
