//! Natural-language product search over the catalog.

pub mod search;

pub use search::{chat_search, ChatMatch, ChatSearchRequest, ChatSearchResponse, SearchMode};
