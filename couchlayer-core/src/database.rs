//! Remote accessor for a single database.
//!
//! [`Database`] turns database-level and document-level operations into
//! [`Request`]s and interprets the status codes of the responses. It holds no
//! state beyond the database name and a reference to the transport.
//!
//! # Example
//!
//! ```ignore
//! let client = CouchClient::new(transport);
//! let database = client.database("users");
//!
//! database.create().await?;
//! assert!(database.exists().await);
//! println!("{} documents", database.doc_count().await?);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    document::{CreateMode, ID_FIELD, JsonDocument},
    error::{DatabaseError, DatabaseResult},
    page::AllDocsResponse,
    query::AllDocsQuery,
    transport::{Method, Request, Response, Transport},
};

/// Sub-resource listing every document of a database.
pub const ALL_DOCS: &str = "_all_docs";

/// Database metadata as returned by `GET /{db}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseInfo {
    #[serde(default)]
    pub db_name: String,
    pub doc_count: u64,
    #[serde(default)]
    pub doc_del_count: u64,
    #[serde(default)]
    pub update_seq: Value,
    /// Any other field reported by the server.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct WriteAck {
    id: String,
    rev: String,
}

/// Remote accessor bound to one database.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the transport reference
/// * `T` - The transport type
#[derive(Debug)]
pub struct Database<'a, T: Transport> {
    name: String,
    transport: &'a T,
}

impl<'a, T: Transport> Database<'a, T> {
    /// Creates a new accessor (see [`crate::client::CouchClient::database`]).
    pub fn new(name: impl Into<String>, transport: &'a T) -> Self {
        Self { name: name.into(), transport }
    }

    /// Returns the name of this database.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the printable URL of this database.
    pub fn url(&self) -> String {
        self.transport.resource_url(&self.path(&[]))
    }

    fn path(&self, sub: &[&str]) -> Vec<String> {
        std::iter::once(self.name.clone())
            .chain(sub.iter().map(|segment| segment.to_string()))
            .collect()
    }

    async fn send(&self, request: Request) -> DatabaseResult<Response> {
        let url = self.transport.resource_url(&request.path);
        let method = request.method;
        let response = self.transport.send(request).await?;

        debug!(%method, %url, status = response.status, "database request");

        Ok(response)
    }

    fn http_error(&self, path: &[String], response: Response) -> DatabaseError {
        DatabaseError::Http {
            url: self.transport.resource_url(path),
            status: response.status,
            reason: response.body,
        }
    }

    /// Checks whether the database exists.
    ///
    /// Returns `true` only for a `200` answer. Any other status and any
    /// transport failure yield `false`; use [`Database::metadata`] to tell
    /// absence and failure apart.
    pub async fn exists(&self) -> bool {
        match self.send(Request::new(Method::Get, self.path(&[]))).await {
            Ok(response) => response.status == 200,
            Err(err) => {
                warn!(database = %self.name, error = %err, "existence check failed, reporting absent");
                false
            }
        }
    }

    /// Retrieves the database metadata.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Http`] on any non-2xx response.
    pub async fn metadata(&self) -> DatabaseResult<DatabaseInfo> {
        let response = self.send(Request::new(Method::Get, self.path(&[]))).await?;

        if !response.is_success() {
            return Err(self.http_error(&self.path(&[]), response));
        }

        response.json()
    }

    /// Returns the number of documents in the database.
    pub async fn doc_count(&self) -> DatabaseResult<u64> {
        Ok(self.metadata().await?.doc_count)
    }

    /// Creates the database unless it already exists.
    ///
    /// No mutating request is sent when the database is already present.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DatabaseCreation`] when the server answers
    /// anything but `201`.
    pub async fn create(&self) -> DatabaseResult<()> {
        if self.exists().await {
            debug!(database = %self.name, "database already exists");
            return Ok(());
        }

        let response = self.send(Request::new(Method::Put, self.path(&[]))).await?;

        if response.status == 201 {
            info!(database = %self.name, "created database");
            return Ok(());
        }

        Err(DatabaseError::DatabaseCreation {
            url: self.url(),
            reason: response.body,
            status: response.status,
        })
    }

    /// Deletes the database and all of its documents.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Http`] on any non-2xx response, e.g. `404`
    /// when the database does not exist.
    pub async fn delete(&self) -> DatabaseResult<()> {
        let response = self.send(Request::new(Method::Delete, self.path(&[]))).await?;

        if !response.is_success() {
            return Err(self.http_error(&self.path(&[]), response));
        }

        info!(database = %self.name, "deleted database");

        Ok(())
    }

    /// Lists documents through the `_all_docs` endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Http`] on any non-2xx response.
    pub async fn all_docs(&self, query: &AllDocsQuery) -> DatabaseResult<AllDocsResponse> {
        let request = Request::new(Method::Get, self.path(&[ALL_DOCS])).with_query(query.to_params()?);
        let response = self.send(request).await?;

        if !response.is_success() {
            return Err(self.http_error(&self.path(&[ALL_DOCS]), response));
        }

        response.json()
    }

    /// Checks whether a document exists. Never fails, like [`Database::exists`].
    pub async fn document_exists(&self, id: &str) -> bool {
        match self.send(Request::new(Method::Head, self.path(&[id]))).await {
            Ok(response) => response.status == 200,
            Err(err) => {
                warn!(database = %self.name, id, error = %err, "document probe failed, reporting absent");
                false
            }
        }
    }

    /// Fetches the current representation of a document.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DocumentNotFound`] on `404` and
    /// [`DatabaseError::Http`] on any other non-2xx response.
    pub async fn fetch_document(&self, id: &str) -> DatabaseResult<JsonDocument> {
        let response = self.send(Request::new(Method::Get, self.path(&[id]))).await?;

        match response.status {
            404 => Err(DatabaseError::DocumentNotFound(id.to_string(), self.name.clone())),
            _ if !response.is_success() => Err(self.http_error(&self.path(&[id]), response)),
            _ => JsonDocument::from_value(response.json()?),
        }
    }

    /// Persists a new document.
    ///
    /// Documents with an id are written with `PUT /{db}/{id}`; documents
    /// without one are posted to `/{db}` and receive a server-assigned id. On
    /// success the id and revision are written back into `document`.
    ///
    /// When the id is already taken, [`CreateMode::IfAbsent`] replaces
    /// `document` with the stored representation and
    /// [`CreateMode::Exclusive`] fails.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::DocumentAlreadyExists`] in exclusive mode and
    /// [`DatabaseError::Http`] on any other non-2xx response.
    pub async fn create_document(
        &self,
        document: &mut JsonDocument,
        mode: CreateMode,
    ) -> DatabaseResult<()> {
        let body = document.to_value()?;
        let id = document.id().map(str::to_owned);

        let request = match &id {
            Some(id) => Request::new(Method::Put, self.path(&[id])),
            None => Request::new(Method::Post, self.path(&[])),
        };
        let path = request.path.clone();
        let response = self.send(request.with_body(body)).await?;

        match (response.status, id) {
            (201 | 202, _) => {
                let ack: WriteAck = response.json()?;
                info!(database = %self.name, id = %ack.id, rev = %ack.rev, "created document");
                document.set_id(ack.id);
                document.set_rev(ack.rev);
                Ok(())
            }
            (409, Some(id)) => match mode {
                CreateMode::Exclusive => Err(DatabaseError::DocumentAlreadyExists(id, self.name.clone())),
                CreateMode::IfAbsent => {
                    debug!(database = %self.name, %id, "document exists, adopting stored version");
                    document.replace_with(self.fetch_document(&id).await?);
                    Ok(())
                }
            },
            _ => Err(self.http_error(&path, response)),
        }
    }

    /// Builds a document from `data` (taking its `_id`, if any) and persists it.
    pub async fn create_document_from(
        &self,
        data: Map<String, Value>,
        mode: CreateMode,
    ) -> DatabaseResult<JsonDocument> {
        let id = data.get(ID_FIELD).and_then(Value::as_str).map(str::to_owned);
        let mut document = JsonDocument::new(id);
        document.update(data);

        self.create_document(&mut document, mode).await?;

        Ok(document)
    }
}
