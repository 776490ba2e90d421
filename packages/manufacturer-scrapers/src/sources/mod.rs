pub mod baumit;
pub mod leier;
pub mod rockwool;

pub use baumit::BaumitSource;
pub use leier::{LeierSelectors, LeierSource};
pub use rockwool::RockwoolSource;
