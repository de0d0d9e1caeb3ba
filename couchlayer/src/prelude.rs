//! Convenient re-exports of commonly used types from couchlayer.
//!
//! ```ignore
//! use couchlayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - The client and its database views
//! - Documents and creation modes
//! - Listing queries, rows and the pager
//! - Transport traits
//! - Error types

pub use couchlayer_core::{
    cache::DocumentCache,
    client::CouchClient,
    collection::{CachedDatabase, Source},
    config::{ClientConfig, DEFAULT_FETCH_LIMIT},
    database::{Database, DatabaseInfo},
    document::{CreateMode, JsonDocument},
    page::{AllDocsResponse, AllDocsRow, Cursor, Pager},
    query::{AllDocsQuery, AllDocsQueryBuilder},
    transport::{Method, Request, Response, Transport, TransportBuilder},
    error::{DatabaseError, DatabaseResult},
};
