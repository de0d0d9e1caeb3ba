//! Document representation and conversions.
//!
//! This module provides [`JsonDocument`], the client-side representation of a
//! single server-stored record, along with utilities for converting it to and
//! from strongly typed Rust structs.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, from_value, to_value};

use crate::error::{DatabaseError, DatabaseResult};

/// Reserved field holding the document identifier.
pub const ID_FIELD: &str = "_id";
/// Reserved field holding the document revision.
pub const REV_FIELD: &str = "_rev";

/// A JSON document as stored by the server.
///
/// The identifier is optional until the document has been persisted: the
/// server assigns one when it is absent. All user data lives in `fields`;
/// `_id` and `_rev` are kept out of it so they cannot drift apart.
///
/// # Example
///
/// ```ignore
/// use couchlayer::document::JsonDocument;
/// use serde_json::json;
///
/// let mut doc = JsonDocument::new(Some("alice".to_string()));
/// doc.update(json!({ "name": "Alice", "age": 30 }).as_object().cloned().unwrap());
///
/// assert_eq!(doc.id(), Some("alice"));
/// assert_eq!(doc.get("age"), Some(&json!(30)));
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct JsonDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    rev: Option<String>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl JsonDocument {
    /// Creates an empty document, optionally with a known identifier.
    pub fn new(id: Option<String>) -> Self {
        Self { id, rev: None, fields: Map::new() }
    }

    /// Returns the identifier, if one has been set or assigned.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the current revision, if the document has been persisted.
    pub fn rev(&self) -> Option<&str> {
        self.rev.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn set_rev(&mut self, rev: impl Into<String>) {
        self.rev = Some(rev.into());
    }

    /// Returns the user fields of this document.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns a single field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Sets a single field, returning the previous value.
    ///
    /// `_id` and `_rev` are routed to the identifier and revision.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        let field = field.into();

        match field.as_str() {
            ID_FIELD => {
                let previous = self.id.take().map(Value::String);
                self.id = value.as_str().map(str::to_owned);
                previous
            }
            REV_FIELD => {
                let previous = self.rev.take().map(Value::String);
                self.rev = value.as_str().map(str::to_owned);
                previous
            }
            _ => self.fields.insert(field, value),
        }
    }

    /// Removes a single user field.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Bulk-updates the document from a JSON map.
    ///
    /// Existing fields are overwritten, other fields are left untouched.
    pub fn update(&mut self, data: Map<String, Value>) {
        for (field, value) in data {
            self.insert(field, value);
        }
    }

    /// Replaces identifier, revision and fields with those of `other`.
    pub fn replace_with(&mut self, other: JsonDocument) {
        *self = other;
    }

    /// Builds a document from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidDocument`] if `value` is not a JSON object.
    pub fn from_value(value: Value) -> DatabaseResult<Self> {
        if !value.is_object() {
            return Err(DatabaseError::InvalidDocument(format!(
                "expected a JSON object, found {value}"
            )));
        }

        Ok(from_value(value)?)
    }

    /// Converts the document, `_id` and `_rev` included, into a JSON value.
    pub fn to_value(&self) -> DatabaseResult<Value> {
        Ok(to_value(self)?)
    }

    /// Deserializes the document into a typed struct.
    ///
    /// # Example
    ///
    /// ```ignore
    /// #[derive(Deserialize)]
    /// struct User {
    ///     #[serde(rename = "_id")]
    ///     id: String,
    ///     name: String,
    /// }
    ///
    /// let user: User = doc.deserialize_into()?;
    /// ```
    pub fn deserialize_into<D: DeserializeOwned>(&self) -> DatabaseResult<D> {
        Ok(from_value(self.to_value()?)?)
    }

    /// Builds a document from any serializable value that serializes to a JSON object.
    pub fn from_serializable<S: Serialize>(value: &S) -> DatabaseResult<Self> {
        Self::from_value(to_value(value)?)
    }
}

/// What to do when creating a document whose identifier is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateMode {
    /// Adopt the stored representation and succeed.
    #[default]
    IfAbsent,
    /// Fail with [`DatabaseError::DocumentAlreadyExists`].
    Exclusive,
}
