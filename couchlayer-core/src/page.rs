//! Listing results and cursor-based pagination.
//!
//! This module provides the listing response types ([`AllDocsResponse`],
//! [`AllDocsRow`]) and the [`Pager`] state machine that walks a database in
//! bounded batches.
//!
//! # Paging protocol
//!
//! Every page is requested with `limit = fetch_limit + 1`. The extra row only
//! reveals where the next page starts:
//!
//! - more than `fetch_limit` rows: the last row is dropped from the page and
//!   its id becomes the next `startkey` (the server treats `startkey` as
//!   inclusive, so that row opens the next page);
//! - `fetch_limit` rows or fewer: this is the final page.
//!
//! ```ignore
//! let mut pager = Pager::new(NonZeroUsize::new(2).unwrap());
//!
//! while let Some(query) = pager.next_query() {
//!     let response = database.all_docs(&query).await?;
//!     for row in pager.advance(response.rows) {
//!         println!("{}", row.id);
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::num::NonZeroUsize;

use crate::query::AllDocsQuery;

/// A single row of an `_all_docs` listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AllDocsRow {
    /// The document identifier.
    pub id: String,
    /// The row key (the document identifier for `_all_docs`).
    #[serde(default)]
    pub key: Value,
    /// Row value, usually `{"rev": ...}`.
    #[serde(default)]
    pub value: Value,
    /// Full document body, present when `include_docs=true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Value>,
}

/// The body of an `_all_docs` response.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AllDocsResponse {
    /// Number of documents in the database, regardless of filters.
    #[serde(default)]
    pub total_rows: Option<u64>,
    /// Position of the first returned row in the full listing.
    #[serde(default)]
    pub offset: Option<u64>,
    /// The returned rows, in key order.
    #[serde(default)]
    pub rows: Vec<AllDocsRow>,
}

impl AllDocsResponse {
    /// Returns the document identifiers of all rows, in order.
    pub fn ids(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.id.clone()).collect()
    }
}

/// Where the next page of a remote iteration begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// Before the first key. Sent as JSON `0`, which collates before every string id.
    Beginning,
    /// At the given document id (inclusive).
    At(String),
    /// The previous page was the last one.
    Exhausted,
}

impl Cursor {
    /// Returns the JSON `startkey` for this cursor, or `None` once exhausted.
    pub fn startkey(&self) -> Option<Value> {
        match self {
            Cursor::Beginning => Some(json!(0)),
            Cursor::At(id) => Some(Value::String(id.clone())),
            Cursor::Exhausted => None,
        }
    }
}

/// Explicit state machine for forward-only iteration over `_all_docs`.
///
/// A pager is single-use: once [`Cursor::Exhausted`] is reached it stays
/// there. Start a new pager to iterate again from the beginning.
#[derive(Debug, Clone)]
pub struct Pager {
    fetch_limit: NonZeroUsize,
    cursor: Cursor,
}

impl Pager {
    /// Creates a pager positioned before the first document.
    pub fn new(fetch_limit: NonZeroUsize) -> Self {
        Self { fetch_limit, cursor: Cursor::Beginning }
    }

    pub fn fetch_limit(&self) -> NonZeroUsize {
        self.fetch_limit
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor == Cursor::Exhausted
    }

    /// Returns the listing query for the next page, or `None` when done.
    pub fn next_query(&self) -> Option<AllDocsQuery> {
        let startkey = self.cursor.startkey()?;

        Some(
            AllDocsQuery::builder()
                .limit(self.fetch_limit.get().saturating_add(1))
                .include_docs(true)
                .startkey(startkey)
                .build(),
        )
    }

    /// Consumes the rows of the page fetched with [`Pager::next_query`] and
    /// moves the cursor.
    ///
    /// Returns the rows that belong to this page, i.e. without the boundary
    /// row when there is a next page.
    pub fn advance(&mut self, mut rows: Vec<AllDocsRow>) -> Vec<AllDocsRow> {
        if rows.len() > self.fetch_limit.get() {
            // len > fetch_limit >= 1, so the boundary row sits after the first
            // row and the cursor strictly moves forward.
            if let Some(boundary) = rows.pop() {
                self.cursor = Cursor::At(boundary.id);
            }
        } else {
            self.cursor = Cursor::Exhausted;
        }

        rows
    }
}
