// HTTP routes
pub mod admin;
pub mod categories;
pub mod chat;
pub mod health;
pub mod manufacturers;
pub mod products;

pub use health::*;
