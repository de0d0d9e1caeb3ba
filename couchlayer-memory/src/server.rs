//! In-memory database server speaking the client's transport protocol.
//!
//! [`InMemoryServer`] answers [`Request`]s the way a CouchDB-compatible server
//! would, keeping every database in process memory behind an async-aware
//! read-write lock. Besides serving as a lightweight backend it records every
//! request it receives and can simulate outages, which makes it the test
//! double of choice for the client layers.

use async_trait::async_trait;
use mea::rwlock::RwLock;
use serde_json::{Map, Value, json};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tracing::debug;
use uuid::Uuid;

use couchlayer_core::{
    database::ALL_DOCS,
    document::{ID_FIELD, REV_FIELD},
    error::{DatabaseError, DatabaseResult},
    query::AllDocsQuery,
    transport::{Method, Request, Response, Transport, TransportBuilder},
};

use crate::collation::compare_id;

#[derive(Debug, Clone)]
struct StoredDocument {
    rev: String,
    /// Document fields without `_id` and `_rev`.
    body: Map<String, Value>,
}

impl StoredDocument {
    fn generation(&self) -> u64 {
        self.rev
            .split_once('-')
            .and_then(|(generation, _)| generation.parse().ok())
            .unwrap_or(0)
    }

    fn to_value(&self, id: &str) -> Value {
        let mut object = Map::new();
        object.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        object.insert(REV_FIELD.to_string(), Value::String(self.rev.clone()));
        object.extend(self.body.clone());

        Value::Object(object)
    }
}

#[derive(Debug, Default)]
struct StoredDatabase {
    /// Documents ordered by id, which is also the listing order.
    documents: BTreeMap<String, StoredDocument>,
    deleted: u64,
    update_seq: u64,
}

impl StoredDatabase {
    fn info(&self, name: &str) -> Value {
        json!({
            "db_name": name,
            "doc_count": self.documents.len(),
            "doc_del_count": self.deleted,
            "update_seq": self.update_seq,
        })
    }

    /// Writes `body` as the next revision of `id`.
    ///
    /// A `_rev` in the body must match the stored revision; a new document
    /// must not carry one.
    fn write(&mut self, id: &str, mut body: Map<String, Value>) -> Response {
        body.remove(ID_FIELD);
        let rev = match body.remove(REV_FIELD) {
            Some(Value::String(rev)) => Some(rev),
            _ => None,
        };

        let generation = match (self.documents.get(id), rev) {
            (None, None) => 1,
            (Some(stored), Some(rev)) if stored.rev == rev => stored.generation() + 1,
            _ => return error_response(409, "conflict", "Document update conflict."),
        };

        let rev = format!("{generation}-{}", Uuid::new_v4().simple());
        self.documents.insert(id.to_string(), StoredDocument { rev: rev.clone(), body });
        self.update_seq += 1;

        json_response(201, json!({ "ok": true, "id": id, "rev": rev }))
    }

    fn all_docs(&self, query: &AllDocsQuery) -> Value {
        let descending = query.descending.unwrap_or(false);
        let skip = query.skip.unwrap_or(0);

        // `key` selects a single key, i.e. an inclusive range on both ends.
        let start_key = query.key.as_ref().or(query.startkey.as_ref());
        let end_key = query.key.as_ref().or(query.endkey.as_ref());
        let inclusive_end = query.key.is_some() || query.inclusive_end.unwrap_or(true);

        let mut ids: Vec<&String> = self.documents.keys().collect();
        if descending {
            ids.reverse();
        }

        let after_start = |id: &str| {
            start_key.is_none_or(|start| {
                let ordering = compare_id(id, start);
                if descending { ordering.is_le() } else { ordering.is_ge() }
            })
        };
        let before_end = |id: &str| {
            end_key.is_none_or(|end| {
                let ordering = compare_id(id, end);
                match (descending, inclusive_end) {
                    (false, true) => ordering.is_le(),
                    (false, false) => ordering.is_lt(),
                    (true, true) => ordering.is_ge(),
                    (true, false) => ordering.is_gt(),
                }
            })
        };

        let start = ids.iter().take_while(|id| !after_start(id.as_str())).count();
        let rows: Vec<Value> = ids[start..]
            .iter()
            .take_while(|id| before_end(id.as_str()))
            .skip(skip)
            .take(query.limit.unwrap_or(usize::MAX))
            .filter_map(|id| self.documents.get(*id).map(|stored| (id, stored)))
            .map(|(id, stored)| {
                let mut row = json!({ "id": id, "key": id, "value": { "rev": stored.rev } });
                if query.include_docs == Some(true) {
                    row["doc"] = stored.to_value(id);
                }
                row
            })
            .collect();

        json!({
            "total_rows": self.documents.len(),
            "offset": (start + skip).min(ids.len()),
            "rows": rows,
        })
    }
}

#[derive(Debug, Default)]
struct ServerState {
    databases: HashMap<String, StoredDatabase>,
    requests: Vec<Request>,
    unavailable: bool,
    disconnected: bool,
}

impl ServerState {
    fn route(&mut self, request: &Request) -> Response {
        match request.path.as_slice() {
            [db] => self.database_request(db, request),
            [db, sub] if sub == ALL_DOCS => self.all_docs_request(db, request),
            [db, id] => self.document_request(db, id, request),
            _ => error_response(400, "bad_request", "Unsupported path."),
        }
    }

    fn database_request(&mut self, db: &str, request: &Request) -> Response {
        match request.method {
            Method::Get | Method::Head => match self.databases.get(db) {
                Some(_) if request.method == Method::Head => Response::new(200, ""),
                Some(database) => json_response(200, database.info(db)),
                None => missing_database(),
            },
            Method::Put => {
                if self.databases.contains_key(db) {
                    return error_response(
                        412,
                        "file_exists",
                        "The database could not be created, the file already exists.",
                    );
                }
                self.databases.insert(db.to_string(), StoredDatabase::default());
                json_response(201, json!({ "ok": true }))
            }
            Method::Delete => match self.databases.remove(db) {
                Some(_) => json_response(200, json!({ "ok": true })),
                None => missing_database(),
            },
            Method::Post => {
                let Some(database) = self.databases.get_mut(db) else {
                    return missing_database();
                };
                let body = match object_body(request) {
                    Ok(body) => body,
                    Err(response) => return response,
                };
                let id = match body.get(ID_FIELD) {
                    Some(Value::String(id)) => id.clone(),
                    _ => Uuid::new_v4().simple().to_string(),
                };
                database.write(&id, body)
            }
        }
    }

    fn all_docs_request(&self, db: &str, request: &Request) -> Response {
        if request.method != Method::Get {
            return method_not_allowed();
        }
        let Some(database) = self.databases.get(db) else {
            return missing_database();
        };

        match AllDocsQuery::from_params(&request.query) {
            Ok(query) => json_response(200, database.all_docs(&query)),
            Err(err) => error_response(400, "query_parse_error", &err.to_string()),
        }
    }

    fn document_request(&mut self, db: &str, id: &str, request: &Request) -> Response {
        let Some(database) = self.databases.get_mut(db) else {
            return missing_database();
        };

        match request.method {
            Method::Head => match database.documents.get(id) {
                Some(_) => Response::new(200, ""),
                None => Response::new(404, ""),
            },
            Method::Get => match database.documents.get(id) {
                Some(stored) => json_response(200, stored.to_value(id)),
                None => error_response(404, "not_found", "missing"),
            },
            Method::Put => match object_body(request) {
                Ok(body) => database.write(id, body),
                Err(response) => response,
            },
            Method::Post | Method::Delete => method_not_allowed(),
        }
    }
}

fn json_response(status: u16, body: Value) -> Response {
    Response::new(status, body.to_string())
}

fn error_response(status: u16, error: &str, reason: &str) -> Response {
    json_response(status, json!({ "error": error, "reason": reason }))
}

fn missing_database() -> Response {
    error_response(404, "not_found", "Database does not exist.")
}

fn method_not_allowed() -> Response {
    error_response(405, "method_not_allowed", "Only GET allowed.")
}

fn object_body(request: &Request) -> Result<Map<String, Value>, Response> {
    match &request.body {
        Some(Value::Object(body)) => Ok(body.clone()),
        _ => Err(error_response(400, "bad_request", "Document must be a JSON object")),
    }
}

/// Thread-safe in-memory database server.
///
/// `InMemoryServer` is cloneable and every clone shares the same databases,
/// request log and outage switches, so a test can hand one clone to a client
/// and keep another for inspection.
///
/// # Example
///
/// ```ignore
/// use couchlayer_memory::InMemoryServer;
/// use couchlayer_core::transport::TransportBuilder;
/// use serde_json::json;
///
/// let server = InMemoryServer::builder()
///     .document("users", json!({ "_id": "alice", "age": 30 }))
///     .build()
///     .await?;
///
/// let client = CouchClient::new(server.clone());
/// assert_eq!(client.database("users").doc_count().await?, 1);
/// assert_eq!(server.requests().await.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryServer {
    state: Arc<RwLock<ServerState>>,
}

impl InMemoryServer {
    /// Creates a server without any database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for a server with seeded databases and documents.
    pub fn builder() -> InMemoryServerBuilder {
        InMemoryServerBuilder::default()
    }

    /// Returns every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<Request> {
        self.state.read().await.requests.clone()
    }

    /// Empties the request log.
    pub async fn clear_requests(&self) {
        self.state.write().await.requests.clear();
    }

    /// While set, every request is answered with `503 Service Unavailable`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.write().await.unavailable = unavailable;
    }

    /// While set, every request fails with [`DatabaseError::Transport`] as if
    /// the connection could not be established.
    pub async fn set_disconnected(&self, disconnected: bool) {
        self.state.write().await.disconnected = disconnected;
    }

    /// Creates database `name` unless present. Not recorded in the request log.
    pub async fn create_database(&self, name: &str) {
        self.state
            .write()
            .await
            .databases
            .entry(name.to_string())
            .or_default();
    }

    /// Stores `document` in database `db`, creating the database if needed.
    ///
    /// The document keeps its `_id` or receives a generated one; any stored
    /// version is overwritten regardless of revisions. Not recorded in the
    /// request log.
    ///
    /// # Returns
    ///
    /// The document id.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidDocument`] if `document` is not an object.
    pub async fn insert_document(&self, db: &str, document: Value) -> DatabaseResult<String> {
        let Value::Object(mut body) = document else {
            return Err(DatabaseError::InvalidDocument(format!(
                "expected a JSON object, got {document}"
            )));
        };

        let id = match body.remove(ID_FIELD) {
            Some(Value::String(id)) => id,
            _ => Uuid::new_v4().simple().to_string(),
        };
        body.remove(REV_FIELD);

        let mut state = self.state.write().await;
        let database = state.databases.entry(db.to_string()).or_default();
        let generation = database.documents.get(&id).map_or(0, StoredDocument::generation) + 1;
        let rev = format!("{generation}-{}", Uuid::new_v4().simple());

        database.documents.insert(id.clone(), StoredDocument { rev, body });
        database.update_seq += 1;

        Ok(id)
    }

    /// Removes a document directly. Not recorded in the request log.
    ///
    /// # Returns
    ///
    /// `true` if the document was present.
    pub async fn remove_document(&self, db: &str, id: &str) -> bool {
        let mut state = self.state.write().await;
        let Some(database) = state.databases.get_mut(db) else {
            return false;
        };

        let removed = database.documents.remove(id).is_some();
        if removed {
            database.deleted += 1;
            database.update_seq += 1;
        }

        removed
    }
}

#[async_trait]
impl Transport for InMemoryServer {
    async fn send(&self, request: Request) -> DatabaseResult<Response> {
        let mut state = self.state.write().await;
        state.requests.push(request.clone());

        if state.disconnected {
            let url = self.resource_url(&request.path);
            return Err(DatabaseError::Transport {
                message: format!("{} {url}: in-memory server is disconnected", request.method),
                source: None,
            });
        }

        let response = if state.unavailable {
            error_response(503, "service_unavailable", "Server is unavailable.")
        } else {
            state.route(&request)
        };

        debug!(
            method = %request.method,
            path = ?request.path,
            status = response.status,
            "in-memory exchange"
        );

        Ok(response)
    }

    fn resource_url(&self, path: &[String]) -> String {
        format!("memory:///{}", path.join("/"))
    }
}

/// Builder for creating an [`InMemoryServer`] with seeded content.
///
/// # Example
///
/// ```ignore
/// let server = InMemoryServer::builder()
///     .database("empty")
///     .document("letters", json!({ "_id": "a" }))
///     .build()
///     .await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryServerBuilder {
    databases: Vec<String>,
    documents: Vec<(String, Value)>,
}

impl InMemoryServerBuilder {
    /// Seeds an empty database.
    pub fn database(mut self, name: impl Into<String>) -> Self {
        self.databases.push(name.into());
        self
    }

    /// Seeds a document, creating its database if needed.
    pub fn document(mut self, db: impl Into<String>, document: Value) -> Self {
        self.documents.push((db.into(), document));
        self
    }
}

#[async_trait]
impl TransportBuilder for InMemoryServerBuilder {
    type Transport = InMemoryServer;

    async fn build(self) -> DatabaseResult<Self::Transport> {
        let server = InMemoryServer::new();

        for name in &self.databases {
            server.create_database(name).await;
        }
        for (db, document) in self.documents {
            server.insert_document(&db, document).await?;
        }

        Ok(server)
    }
}
