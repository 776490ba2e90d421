// Business domains
pub mod catalog;
pub mod chat;
