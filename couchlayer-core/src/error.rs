//! Error types and result types for database client operations.
//!
//! Every fallible operation in this crate returns a [`DatabaseResult<T>`].
//! Transport failures, unexpected HTTP statuses and lookup misses are kept
//! apart so callers can branch on them.

use serde_json::Error as SerdeJsonError;
use std::error::Error as StdError;
use thiserror::Error;

/// Represents all possible errors that can occur when talking to a remote database.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Serialization/deserialization error when converting between JSON and Rust types.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error while building a client or transport (bad URL, TLS setup, ...).
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The HTTP exchange itself failed (connection refused, timeout, TLS).
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
    /// The server answered with a status outside of 2xx.
    #[error("Request to {url} failed with status {status}: {reason}")]
    Http {
        url: String,
        status: u16,
        reason: String,
    },
    /// The server refused to create a database.
    #[error("Unable to create database {url}: Reason: {reason}")]
    DatabaseCreation {
        url: String,
        reason: String,
        status: u16,
    },
    /// The document is unknown both locally and remotely.
    /// The first argument is the document ID, the second is the database name.
    #[error("Document {0} not found in database {1}")]
    DocumentNotFound(String, String),
    /// A document with the given ID already exists in the database.
    /// The first argument is the document ID, the second is the database name.
    #[error("Document {0} already exists in database {1}")]
    DocumentAlreadyExists(String, String),
    /// The document or listing row has an invalid structure.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// A listing query parameter could not be encoded or decoded.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

/// A specialized `Result` type for database client operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

impl DatabaseError {
    /// Creates a transport error wrapping an underlying cause.
    pub fn transport(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        DatabaseError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the HTTP status code carried by this error, if any.
    ///
    /// Lookup misses report `404` so that callers can treat local and remote
    /// misses alike.
    pub fn status(&self) -> Option<u16> {
        match self {
            DatabaseError::Http { status, .. } => Some(*status),
            DatabaseError::DatabaseCreation { status, .. } => Some(*status),
            DatabaseError::DocumentNotFound(..) => Some(404),
            DatabaseError::DocumentAlreadyExists(..) => Some(409),
            _ => None,
        }
    }

    /// Returns `true` when the error denotes a missing document or resource.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<SerdeJsonError> for DatabaseError {
    fn from(err: SerdeJsonError) -> Self {
        DatabaseError::Serialization(err.to_string())
    }
}
