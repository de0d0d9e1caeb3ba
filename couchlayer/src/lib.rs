//! Main couchlayer crate providing a cache-backed client for CouchDB and
//! Cloudant style document databases.
//!
//! This crate is the primary entry point for users of couchlayer. It
//! re-exports the core types from the sub-crates and provides access to the
//! available transports.
//!
//! # Features
//!
//! - **Remote accessor** - Database lifecycle, metadata and document operations
//! - **Local cache** - Documents read through a collection are kept locally
//! - **Lazy pagination** - Stream whole databases page by page with a bounded page size
//! - **Pluggable transports** - In-memory server for tests, HTTP for real servers
//!
//! # Quick Start
//!
//! ```ignore
//! use couchlayer::{prelude::*, memory::InMemoryServer};
//! use futures::TryStreamExt;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DatabaseError> {
//!     let client = CouchClient::new(InMemoryServer::builder().build().await?);
//!     let mut users = client.cached_database("users");
//!
//!     users.create().await?;
//!     for name in ["alice", "bob", "carol"] {
//!         let mut data = serde_json::Map::new();
//!         data.insert("_id".into(), json!(name));
//!         users.create_document(data).await?;
//!     }
//!
//!     // Walks the database two documents per request.
//!     let mut users = client.cached_database_with_limit("users", 2.try_into().unwrap());
//!     let ids: Vec<String> = users
//!         .iter(Source::Remote)
//!         .map_ok(|row| row.id)
//!         .try_collect()
//!         .await?;
//!
//!     assert_eq!(ids, ["alice", "bob", "carol"]);
//!     assert_eq!(users.keys(Source::Local).await?.len(), 3);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Transports
//!
//! - [`memory`] - In-process server for development and testing
//! - `http` - CouchDB/Cloudant over HTTP(S) (requires the `http` feature)

pub mod prelude;

pub use couchlayer_core::{cache, client, collection, config, database, document, error, page, query, transport};

// Re-export JSON types for convenience
pub use serde_json;

/// In-memory server transport.
pub mod memory {
    pub use couchlayer_memory::{InMemoryServer, InMemoryServerBuilder};
}

/// HTTP transport.
///
/// This module is only available when the `http` feature is enabled.
#[cfg(feature = "http")]
pub mod http {
    pub use couchlayer_http::{HttpConfig, HttpTransport, HttpTransportBuilder};
}
