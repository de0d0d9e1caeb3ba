//! Listing options for the `_all_docs` endpoint.
//!
//! [`AllDocsQuery`] enumerates every option the listing endpoint understands
//! instead of accepting an open parameter bag. Queries are built with the
//! fluent builder:
//!
//! ```ignore
//! use couchlayer::query::AllDocsQuery;
//! use serde_json::json;
//!
//! let query = AllDocsQuery::builder()
//!     .startkey(json!("b"))
//!     .endkey(json!("d"))
//!     .include_docs(true)
//!     .limit(10)
//!     .build();
//! ```
//!
//! Key bounds are arbitrary JSON values and travel as JSON text, following the
//! server's collation rules (`0` sorts before every string key, so it denotes
//! "from the very first document").

use serde_json::Value;

use crate::error::{DatabaseError, DatabaseResult};

/// Options accepted by the `_all_docs` endpoint.
///
/// Unset options are left to the server defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllDocsQuery {
    /// Return rows in descending key order. Server default: `false`.
    pub descending: Option<bool>,
    /// Stop returning rows once this key is reached.
    pub endkey: Option<Value>,
    /// Include the full document body in each row. Server default: `false`.
    pub include_docs: Option<bool>,
    /// Include rows whose key equals `endkey`. Server default: `true`.
    pub inclusive_end: Option<bool>,
    /// Return only the row matching this key.
    pub key: Option<Value>,
    /// Maximum number of rows to return.
    pub limit: Option<usize>,
    /// Number of rows to skip before returning results. Server default: `0`.
    pub skip: Option<usize>,
    /// Start returning rows from this key (inclusive).
    pub startkey: Option<Value>,
}

impl AllDocsQuery {
    /// Creates a new builder for constructing a listing query.
    pub fn builder() -> AllDocsQueryBuilder {
        AllDocsQueryBuilder::new()
    }

    /// Encodes the query into URL query pairs.
    ///
    /// Keys are encoded as JSON text, booleans as `true`/`false`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidQuery`] if a key cannot be serialized.
    pub fn to_params(&self) -> DatabaseResult<Vec<(String, String)>> {
        let mut params = Vec::new();

        if let Some(descending) = self.descending {
            params.push(("descending".to_string(), descending.to_string()));
        }
        if let Some(endkey) = &self.endkey {
            params.push(("endkey".to_string(), encode_key("endkey", endkey)?));
        }
        if let Some(include_docs) = self.include_docs {
            params.push(("include_docs".to_string(), include_docs.to_string()));
        }
        if let Some(inclusive_end) = self.inclusive_end {
            params.push(("inclusive_end".to_string(), inclusive_end.to_string()));
        }
        if let Some(key) = &self.key {
            params.push(("key".to_string(), encode_key("key", key)?));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(skip) = self.skip {
            params.push(("skip".to_string(), skip.to_string()));
        }
        if let Some(startkey) = &self.startkey {
            params.push(("startkey".to_string(), encode_key("startkey", startkey)?));
        }

        Ok(params)
    }

    /// Decodes URL query pairs back into a query.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidQuery`] for unknown parameters and
    /// malformed values.
    pub fn from_params(params: &[(String, String)]) -> DatabaseResult<Self> {
        let mut query = AllDocsQuery::default();

        for (name, raw) in params {
            match name.as_str() {
                "descending" => query.descending = Some(decode_bool(name, raw)?),
                "endkey" | "end_key" => query.endkey = Some(decode_key(name, raw)?),
                "include_docs" => query.include_docs = Some(decode_bool(name, raw)?),
                "inclusive_end" => query.inclusive_end = Some(decode_bool(name, raw)?),
                "key" => query.key = Some(decode_key(name, raw)?),
                "limit" => query.limit = Some(decode_usize(name, raw)?),
                "skip" => query.skip = Some(decode_usize(name, raw)?),
                "startkey" | "start_key" => query.startkey = Some(decode_key(name, raw)?),
                _ => {
                    return Err(DatabaseError::InvalidQuery(format!(
                        "unknown parameter {name}"
                    )));
                }
            }
        }

        Ok(query)
    }
}

fn encode_key(name: &str, key: &Value) -> DatabaseResult<String> {
    serde_json::to_string(key)
        .map_err(|e| DatabaseError::InvalidQuery(format!("{name}: {e}")))
}

fn decode_key(name: &str, raw: &str) -> DatabaseResult<Value> {
    serde_json::from_str(raw)
        .map_err(|e| DatabaseError::InvalidQuery(format!("{name} is not valid JSON: {e}")))
}

fn decode_bool(name: &str, raw: &str) -> DatabaseResult<bool> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(DatabaseError::InvalidQuery(format!(
            "{name} must be true or false, got {raw}"
        ))),
    }
}

fn decode_usize(name: &str, raw: &str) -> DatabaseResult<usize> {
    raw.parse()
        .map_err(|_| DatabaseError::InvalidQuery(format!("{name} must be a non-negative integer, got {raw}")))
}

/// Builder for constructing [`AllDocsQuery`] instances.
#[derive(Debug, Clone, Default)]
pub struct AllDocsQueryBuilder {
    query: AllDocsQuery,
}

impl AllDocsQueryBuilder {
    /// Creates a new builder with every option unset.
    pub fn new() -> Self {
        Self { query: AllDocsQuery::default() }
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.query.descending = Some(descending);
        self
    }

    pub fn endkey(mut self, endkey: impl Into<Value>) -> Self {
        self.query.endkey = Some(endkey.into());
        self
    }

    pub fn include_docs(mut self, include_docs: bool) -> Self {
        self.query.include_docs = Some(include_docs);
        self
    }

    pub fn inclusive_end(mut self, inclusive_end: bool) -> Self {
        self.query.inclusive_end = Some(inclusive_end);
        self
    }

    pub fn key(mut self, key: impl Into<Value>) -> Self {
        self.query.key = Some(key.into());
        self
    }

    /// Sets the maximum number of rows to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Sets the number of rows to skip.
    pub fn skip(mut self, skip: usize) -> Self {
        self.query.skip = Some(skip);
        self
    }

    pub fn startkey(mut self, startkey: impl Into<Value>) -> Self {
        self.query.startkey = Some(startkey.into());
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> AllDocsQuery {
        self.query
    }
}
