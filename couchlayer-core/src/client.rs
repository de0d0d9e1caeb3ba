//! Entry point for talking to a database server.
//!
//! [`CouchClient`] owns a [`Transport`] and hands out per-database views:
//!
//! - [`Database`] - stateless remote accessor
//! - [`CachedDatabase`] - accessor plus local document cache and paged iteration
//!
//! # Example
//!
//! ```ignore
//! use couchlayer::{prelude::*, memory::InMemoryServer};
//!
//! let client = CouchClient::new(InMemoryServer::builder().build().await?);
//! let mut orders = client.cached_database("orders");
//! orders.create().await?;
//! ```

use std::num::NonZeroUsize;

use crate::{
    collection::CachedDatabase,
    config::ClientConfig,
    database::Database,
    transport::Transport,
};

/// A client bound to a specific transport implementation.
///
/// # Type Parameters
///
/// * `T` - The transport implementation type
#[derive(Debug)]
pub struct CouchClient<T: Transport> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> CouchClient<T> {
    /// Creates a client with the default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns a remote accessor for the database `name`.
    pub fn database<'a>(&'a self, name: &str) -> Database<'a, T> {
        Database::new(name, &self.transport)
    }

    /// Returns a cache-backed collection for the database `name`, paging with
    /// the configured `fetch_limit`.
    pub fn cached_database<'a>(&'a self, name: &str) -> CachedDatabase<'a, T> {
        self.cached_database_with_limit(name, self.config.fetch_limit)
    }

    /// Same as [`CouchClient::cached_database`] with an explicit page size.
    pub fn cached_database_with_limit<'a>(
        &'a self,
        name: &str,
        fetch_limit: NonZeroUsize,
    ) -> CachedDatabase<'a, T> {
        CachedDatabase::new(self.database(name), fetch_limit)
    }

    /// Consumes the client and returns its transport.
    pub fn into_transport(self) -> T {
        self.transport
    }
}
