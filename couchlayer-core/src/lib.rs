//! A thin cache-backed client for CouchDB and Cloudant style document databases.
//!
//! This crate is the core of the couchlayer project and provides:
//!
//! - **Transport abstraction** ([`transport`]) - The seam between the client and the wire
//! - **Remote accessor** ([`database`]) - Database and document operations with status handling
//! - **Listing options** ([`query`]) - Typed `_all_docs` parameters
//! - **Pagination** ([`page`]) - Listing rows and the cursor state machine
//! - **Local cache** ([`cache`]) - Insertion-ordered document cache
//! - **Collections** ([`collection`]) - Cache-backed view with lazy paged iteration
//! - **Client** ([`client`]) - Owns a transport and hands out databases
//! - **Documents** ([`document`]) - JSON documents and typed conversions
//! - **Configuration** ([`config`]) - Client settings
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use couchlayer_core::{client::CouchClient, collection::Source};
//! use futures::TryStreamExt;
//!
//! let client = CouchClient::new(transport);
//! let mut db = client.cached_database("inventory");
//!
//! let ids: Vec<String> = db
//!     .iter(Source::Remote)
//!     .map_ok(|row| row.id)
//!     .try_collect()
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as couchlayer_core;

pub mod cache;
pub mod client;
pub mod collection;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod page;
pub mod query;
pub mod transport;

#[cfg(test)]
mod testing;
