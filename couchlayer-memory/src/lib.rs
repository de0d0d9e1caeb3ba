//! In-memory database server for couchlayer.
//!
//! This crate provides [`InMemoryServer`], a thread-safe implementation of the
//! `Transport` trait that behaves like a CouchDB-compatible server without any
//! network. It is intended for development and testing.
//!
//! # Features
//!
//! - **Database lifecycle** - Create, inspect and delete databases
//! - **Listings** - `_all_docs` with key ranges, ordering, paging and bodies
//! - **Revisions** - Conflict detection on document writes
//! - **Test hooks** - Request log and simulated outages
//!
//! # Quick Start
//!
//! ```ignore
//! use couchlayer::{prelude::*, memory::InMemoryServer};
//! use futures::TryStreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = InMemoryServer::builder()
//!         .document("letters", serde_json::json!({ "_id": "a" }))
//!         .build()
//!         .await?;
//!
//!     let client = CouchClient::new(server);
//!     let mut letters = client.cached_database("letters");
//!     let rows: Vec<AllDocsRow> = letters.iter(Source::Remote).try_collect().await?;
//!     assert_eq!(rows.len(), 1);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as couchlayer_memory;

mod collation;
pub mod server;

pub use server::{InMemoryServer, InMemoryServerBuilder};
