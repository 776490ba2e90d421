//! Keyset pagination for list endpoints.
//!
//! Clients pass `first` (page size) and `after` (an opaque cursor taken from
//! the previous page's `page_info.end_cursor`). Ids are v7 UUIDs, so ordering
//! by id is stable and chronological.
//!
//! ```rust,ignore
//! let args = PaginationArgs { first: Some(20), after: None }.validate()?;
//! let rows = Product::find_paginated(&filter, &args, pool).await?;
//! let page = Page::from_rows(rows, &args, |p| p.id.into_uuid());
//! ```

use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i32 = 25;
pub const MAX_PAGE_SIZE: i32 = 100;

/// Opaque cursor (base64 of the row id).
#[derive(Debug, Clone, Copy)]
pub struct Cursor(Uuid);

impl Cursor {
    pub fn encode_uuid(id: Uuid) -> String {
        URL_SAFE_NO_PAD.encode(id.as_bytes())
    }

    pub fn decode(s: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .context("Invalid cursor: not valid base64")?;
        let uuid = Uuid::from_slice(&bytes).context("Invalid cursor: not a valid UUID")?;
        Ok(Cursor(uuid))
    }

    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

/// Raw query-string arguments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationArgs {
    pub first: Option<i32>,
    pub after: Option<String>,
}

impl PaginationArgs {
    /// Apply the default size, clamp it and decode the cursor.
    pub fn validate(&self) -> Result<ValidatedPaginationArgs, &'static str> {
        let limit = self
            .first
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let cursor = match self.after.as_deref() {
            Some(raw) if !raw.is_empty() => Some(
                Cursor::decode(raw)
                    .map_err(|_| "Invalid cursor")?
                    .into_uuid(),
            ),
            _ => None,
        };

        Ok(ValidatedPaginationArgs { limit, cursor })
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedPaginationArgs {
    pub limit: i32,
    pub cursor: Option<Uuid>,
}

impl ValidatedPaginationArgs {
    /// SQL LIMIT: one extra row tells us whether another page exists.
    pub fn fetch_limit(&self) -> i64 {
        (self.limit + 1) as i64
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    /// Build a page from `limit + 1` fetched rows.
    pub fn from_rows(
        rows: Vec<T>,
        args: &ValidatedPaginationArgs,
        id_of: impl Fn(&T) -> Uuid,
    ) -> Self {
        let (items, has_next_page) = trim_results(rows, args.limit);
        let end_cursor = items.last().map(|item| Cursor::encode_uuid(id_of(item)));
        Page {
            items,
            page_info: PageInfo {
                has_next_page,
                end_cursor,
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_info: self.page_info,
        }
    }
}

pub fn trim_results<T>(mut results: Vec<T>, limit: i32) -> (Vec<T>, bool) {
    let limit = limit.max(0) as usize;
    let has_more = results.len() > limit;
    results.truncate(limit);
    (results, has_more)
}
