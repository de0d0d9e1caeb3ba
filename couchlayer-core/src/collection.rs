//! Cache-backed view over a remote database.
//!
//! [`CachedDatabase`] composes a [`Database`] accessor with a
//! [`DocumentCache`]. Every operation states whether it may touch the network:
//!
//! - local-only: [`CachedDatabase::get_cached`], [`CachedDatabase::cached`],
//!   [`CachedDatabase::cached_keys`], [`CachedDatabase::iter_cached`] and
//!   their `Source::Local` counterparts;
//! - remote: everything else. Remote reads populate the cache as described on
//!   each method; nothing here invalidates cached entries implicitly.
//!
//! # Example
//!
//! ```ignore
//! use futures::TryStreamExt;
//!
//! let client = CouchClient::new(transport);
//! let mut users = client.cached_database("users");
//!
//! users.create().await?;
//! users.create_document(json!({ "_id": "alice", "age": 30 }).as_object().cloned().unwrap()).await?;
//!
//! // Walks the database in pages of `fetch_limit` documents.
//! let rows: Vec<AllDocsRow> = users.iter(Source::Remote).try_collect().await?;
//! assert!(users.get_cached("alice").is_some());
//! ```

use futures::{Stream, StreamExt, stream};
use serde_json::{Map, Value, json};
use std::{collections::VecDeque, num::NonZeroUsize};
use tracing::debug;

use crate::{
    cache::DocumentCache,
    database::{Database, DatabaseInfo},
    document::{CreateMode, JsonDocument},
    error::{DatabaseError, DatabaseResult},
    page::{AllDocsRow, Pager},
    query::AllDocsQuery,
    transport::Transport,
};

/// Where a read is answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Source {
    /// Only the local cache. Never touches the network.
    Local,
    /// The remote database.
    #[default]
    Remote,
}

/// A database accessor paired with a local document cache.
///
/// The cache has no internal locking; `&mut self` receivers serialize access.
/// A remote iteration stream mutably borrows the collection until dropped.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the transport reference
/// * `T` - The transport type
#[derive(Debug)]
pub struct CachedDatabase<'a, T: Transport> {
    database: Database<'a, T>,
    cache: DocumentCache,
    fetch_limit: NonZeroUsize,
}

impl<'a, T: Transport> CachedDatabase<'a, T> {
    /// Creates a collection with an empty cache.
    ///
    /// # Arguments
    ///
    /// * `database` - The remote accessor
    /// * `fetch_limit` - Number of documents per page during remote iteration
    pub fn new(database: Database<'a, T>, fetch_limit: NonZeroUsize) -> Self {
        Self { database, cache: DocumentCache::new(), fetch_limit }
    }

    /// Returns the name of the underlying database.
    pub fn name(&self) -> &str {
        self.database.name()
    }

    /// Returns the remote accessor.
    pub fn database(&self) -> &Database<'a, T> {
        &self.database
    }

    /// Returns the local cache.
    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    pub fn fetch_limit(&self) -> NonZeroUsize {
        self.fetch_limit
    }

    /// Checks whether the database exists. Never fails.
    pub async fn exists(&self) -> bool {
        self.database.exists().await
    }

    /// Creates the database if needed and returns the collection for chaining.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DatabaseCreation`] if the server refuses.
    pub async fn create(&mut self) -> DatabaseResult<&mut Self> {
        self.database.create().await?;

        Ok(self)
    }

    /// Deletes the remote database.
    ///
    /// The local cache is left as is; call [`CachedDatabase::clear_cache`]
    /// to drop it as well.
    pub async fn delete(&self) -> DatabaseResult<()> {
        self.database.delete().await
    }

    pub async fn metadata(&self) -> DatabaseResult<DatabaseInfo> {
        self.database.metadata().await
    }

    /// Returns the document count reported by the database metadata.
    pub async fn doc_count(&self) -> DatabaseResult<u64> {
        self.database.doc_count().await
    }

    /// Returns document identifiers.
    ///
    /// With [`Source::Remote`] the ids come from an unfiltered `_all_docs`
    /// listing; the cache is not populated. With [`Source::Local`] they are
    /// the cached ids in cache order, as returned by
    /// [`CachedDatabase::cached_keys`].
    pub async fn keys(&self, source: Source) -> DatabaseResult<Vec<String>> {
        match source {
            Source::Local => Ok(self.cached_keys().map(str::to_owned).collect()),
            Source::Remote => Ok(self
                .database
                .all_docs(&AllDocsQuery::default())
                .await?
                .ids()),
        }
    }

    /// Looks a document up, confirming it against the remote listing first.
    ///
    /// - listed remotely and cached: the cached representation is returned;
    /// - listed remotely but not cached: it is fetched, cached and returned;
    /// - not listed: its existence is probed directly, and if present it is
    ///   fetched, cached and returned.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DocumentNotFound`] when the document is
    /// unknown remotely.
    pub async fn get(&mut self, id: &str) -> DatabaseResult<&JsonDocument> {
        let listed = self
            .keys(Source::Remote)
            .await?
            .iter()
            .any(|key| key == id);

        if !listed && !self.database.document_exists(id).await {
            return Err(self.not_found(id));
        }

        if !listed || !self.cache.contains(id) {
            let document = self.database.fetch_document(id).await?;
            return Ok(self.cache.insert(id, document));
        }

        self.cache.get(id).ok_or_else(|| self.not_found(id))
    }

    fn not_found(&self, id: &str) -> DatabaseError {
        DatabaseError::DocumentNotFound(id.to_string(), self.name().to_string())
    }

    /// Returns the cached ids in cache order without touching the network.
    pub fn cached_keys(&self) -> impl Iterator<Item = &str> {
        self.cache.keys()
    }

    /// Returns a cached document without touching the network.
    pub fn get_cached(&self, id: &str) -> Option<&JsonDocument> {
        self.cache.get(id)
    }

    pub fn contains_cached(&self, id: &str) -> bool {
        self.cache.contains(id)
    }

    /// Drops a single document from the cache. The remote copy is untouched.
    pub fn evict(&mut self, id: &str) -> Option<JsonDocument> {
        self.cache.remove(id)
    }

    /// Drops every cached document. Remote data is untouched.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Creates a document from `data` and caches it.
    ///
    /// The `_id` of `data` is used when present; otherwise the server assigns
    /// one. An already existing document is adopted as stored
    /// ([`CreateMode::IfAbsent`]).
    pub async fn create_document(&mut self, data: Map<String, Value>) -> DatabaseResult<&JsonDocument> {
        self.create_document_with(data, CreateMode::IfAbsent).await
    }

    /// Creates a document from `data` with an explicit conflict policy and caches it.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DocumentAlreadyExists`] when `mode` is
    /// [`CreateMode::Exclusive`] and the id is taken.
    pub async fn create_document_with(
        &mut self,
        data: Map<String, Value>,
        mode: CreateMode,
    ) -> DatabaseResult<&JsonDocument> {
        let document = self.database.create_document_from(data, mode).await?;
        let id = document
            .id()
            .map(str::to_owned)
            .ok_or_else(|| DatabaseError::InvalidDocument("server did not assign an id".to_string()))?;

        Ok(self.cache.insert(id, document))
    }

    /// Creates an empty document with a server-assigned id and caches it.
    pub async fn new_document(&mut self) -> DatabaseResult<&JsonDocument> {
        self.create_document_with(Map::new(), CreateMode::IfAbsent).await
    }

    /// Iterates over cached documents in cache order.
    pub fn cached(&self) -> impl Iterator<Item = (&str, &JsonDocument)> {
        self.cache.iter()
    }

    /// Streams listing rows from the chosen source.
    ///
    /// [`Source::Local`] behaves like [`CachedDatabase::iter_cached`] and
    /// [`Source::Remote`] like [`CachedDatabase::iter_remote`]. The receiver is
    /// `&mut` because remote iteration fills the cache; use `iter_cached`
    /// directly when only a shared borrow is at hand.
    pub fn iter(&mut self, source: Source) -> impl Stream<Item = DatabaseResult<AllDocsRow>> {
        match source {
            Source::Local => self.iter_cached().left_stream(),
            Source::Remote => self.iter_remote().right_stream(),
        }
    }

    /// Replays the cache as listing rows (`key` is the id, `value` holds the
    /// cached revision). Never touches the network.
    pub fn iter_cached(&self) -> impl Stream<Item = DatabaseResult<AllDocsRow>> {
        stream::iter(self.cache.iter().map(|(id, document)| cached_row(id, document)))
    }

    /// Streams every document of the remote database in key order.
    ///
    /// Documents are fetched lazily, `fetch_limit` rows per page, with one
    /// extra row requested to find where the next page starts. Each row's
    /// document is cached before the row is yielded. Every call starts from
    /// the first document; dropping the stream early is always safe.
    ///
    /// # Errors
    ///
    /// The stream yields the first transport or HTTP error and ends. A row
    /// without a document body yields [`DatabaseError::InvalidDocument`].
    pub fn iter_remote(&mut self) -> impl Stream<Item = DatabaseResult<AllDocsRow>> {
        let walk = RemoteWalk {
            database: &self.database,
            cache: &mut self.cache,
            pager: Pager::new(self.fetch_limit),
            pending: VecDeque::new(),
        };

        stream::try_unfold(walk, |walk| walk.next_row())
    }
}

fn cached_row(id: &str, document: &JsonDocument) -> DatabaseResult<AllDocsRow> {
    Ok(AllDocsRow {
        id: id.to_string(),
        key: Value::String(id.to_string()),
        value: document.rev().map_or(Value::Null, |rev| json!({ "rev": rev })),
        doc: Some(document.to_value()?),
    })
}

/// State of one remote iteration: the pager plus the rows of the current
/// page that have not been yielded yet.
struct RemoteWalk<'s, 'a, T: Transport> {
    database: &'s Database<'a, T>,
    cache: &'s mut DocumentCache,
    pager: Pager,
    pending: VecDeque<AllDocsRow>,
}

impl<'s, 'a, T: Transport> RemoteWalk<'s, 'a, T> {
    async fn next_row(mut self) -> DatabaseResult<Option<(AllDocsRow, Self)>> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                let body = row.doc.clone().ok_or_else(|| {
                    DatabaseError::InvalidDocument(format!("row {} carries no document body", row.id))
                })?;
                self.cache.insert(row.id.clone(), JsonDocument::from_value(body)?);

                return Ok(Some((row, self)));
            }

            let Some(query) = self.pager.next_query() else {
                return Ok(None);
            };

            let rows = self.database.all_docs(&query).await?.rows;
            let fetched = rows.len();
            self.pending = self.pager.advance(rows).into();

            debug!(
                database = %self.database.name(),
                startkey = ?query.startkey,
                fetched,
                next = ?self.pager.cursor(),
                "fetched page"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testing::ScriptedTransport,
        transport::{Method, Response},
    };
    use futures::TryStreamExt;

    fn limit(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[tokio::test]
    async fn get_fetches_documents_missing_from_the_listing() {
        let transport = ScriptedTransport::with(vec![
            Ok(Response::new(200, r#"{"rows":[]}"#)),
            Ok(Response::new(200, "")),
            Ok(Response::new(200, r#"{"_id":"x","_rev":"1-a","n":1}"#)),
        ]);
        let mut collection = CachedDatabase::new(Database::new("db", &transport), limit(10));

        let document = collection.get("x").await.unwrap();

        assert_eq!(document.id(), Some("x"));
        assert_eq!(document.rev(), Some("1-a"));
        assert_eq!(document.get("n"), Some(&json!(1)));
        assert!(collection.contains_cached("x"));
        assert_eq!(transport.methods(), [Method::Get, Method::Head, Method::Get]);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].path, ["db", "_all_docs"]);
        assert_eq!(sent[1].path, ["db", "x"]);
        assert_eq!(sent[2].path, ["db", "x"]);
    }

    #[tokio::test]
    async fn get_reports_documents_missing_everywhere() {
        let transport = ScriptedTransport::with(vec![
            Ok(Response::new(200, r#"{"rows":[]}"#)),
            Ok(Response::new(404, "")),
        ]);
        let mut collection = CachedDatabase::new(Database::new("db", &transport), limit(10));

        let err = collection.get("x").await.unwrap_err();

        assert!(matches!(err, DatabaseError::DocumentNotFound(..)));
        assert!(!collection.contains_cached("x"));
        assert_eq!(transport.methods(), [Method::Get, Method::Head]);
    }

    #[tokio::test]
    async fn local_reads_work_through_a_shared_borrow() {
        let transport = ScriptedTransport::with(vec![Ok(Response::new(
            201,
            r#"{"ok":true,"id":"a","rev":"1-a"}"#,
        ))]);
        let mut collection = CachedDatabase::new(Database::new("db", &transport), limit(10));
        collection
            .create_document(json!({ "_id": "a", "n": 1 }).as_object().cloned().unwrap())
            .await
            .unwrap();

        let shared = &collection;
        let keys: Vec<&str> = shared.cached_keys().collect();
        let rows: Vec<AllDocsRow> = shared.iter_cached().try_collect().await.unwrap();

        assert_eq!(keys, ["a"]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, json!("a"));
        assert_eq!(rows[0].value, json!({ "rev": "1-a" }));
        assert_eq!(shared.keys(Source::Local).await.unwrap(), ["a"]);
        assert_eq!(transport.methods(), [Method::Put]);
    }
}
