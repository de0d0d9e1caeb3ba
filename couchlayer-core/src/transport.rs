//! Transport abstraction between the client and a database server.
//!
//! # Overview
//!
//! The [`Transport`] trait is the only place where bytes leave the process. It
//! receives a [`Request`] (verb, path segments below the server root, query
//! pairs and an optional JSON body) and returns the raw [`Response`] status and
//! body text. Everything above it, status interpretation included, lives in
//! [`crate::database`].
//!
//! Keeping the seam this low lets the HTTP implementation stay a thin wrapper
//! over an HTTP client while the in-memory implementation can act as a complete
//! fake server.
//!
//! # Traits
//!
//! - [`Transport`]: sends a single request and waits for its response
//! - [`TransportBuilder`]: factory trait for creating transport instances
//!
//! # Examples
//!
//! ```ignore
//! use couchlayer::transport::{Method, Request, Transport};
//!
//! let response = transport
//!     .send(Request::new(Method::Get, ["my_database"]))
//!     .await?;
//! assert_eq!(response.status, 200);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{fmt, fmt::Debug, sync::Arc};

use crate::error::DatabaseResult;

/// HTTP verbs used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Put,
    Post,
    Delete,
}

impl Method {
    /// Returns the canonical upper-case verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Put => "PUT",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request against a database server.
///
/// `path` holds unescaped segments relative to the server root, e.g.
/// `["my db", "_all_docs"]`. Escaping is the transport's job.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Request {
    /// Creates a request with no query parameters and no body.
    pub fn new<I, S>(method: Method, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            path: path.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Replaces the query parameters of this request.
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Sets the JSON body of this request.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns the value of the first query parameter named `name`.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// The status and body text returned by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    /// Returns `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON into `D`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Serialization`](crate::error::DatabaseError::Serialization)
    /// if the body is not valid JSON for `D`.
    pub fn json<D: DeserializeOwned>(&self) -> DatabaseResult<D> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Abstract interface for the wire between client and server.
///
/// # Error Handling
///
/// An `Err` means no HTTP response was obtained at all. A response with an
/// error status is still `Ok`; interpreting it is up to the caller.
///
/// # Concurrency
///
/// Implementations must be `Send + Sync`, but the client never has more than
/// one request in flight per call chain.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Sends `request` and waits for the complete response.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Transport`](crate::error::DatabaseError::Transport)
    /// when the exchange cannot be completed.
    async fn send(&self, request: Request) -> DatabaseResult<Response>;

    /// Returns the printable URL of the resource at `path`.
    fn resource_url(&self, path: &[String]) -> String;
}

#[async_trait]
impl<T> Transport for &T
where
    T: Transport + ?Sized,
{
    async fn send(&self, request: Request) -> DatabaseResult<Response> {
        (**self).send(request).await
    }

    fn resource_url(&self, path: &[String]) -> String {
        (**self).resource_url(path)
    }
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn send(&self, request: Request) -> DatabaseResult<Response> {
        (**self).send(request).await
    }

    fn resource_url(&self, path: &[String]) -> String {
        (**self).resource_url(path)
    }
}

/// Factory trait for constructing [`Transport`] instances.
///
/// # Example
///
/// ```ignore
/// let transport = InMemoryServer::builder().database("users").build().await?;
/// ```
#[async_trait]
pub trait TransportBuilder {
    /// The transport type produced by this builder.
    type Transport: Transport;

    /// Builds and returns a new transport instance.
    async fn build(self) -> DatabaseResult<Self::Transport>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_returns_first_match() {
        let request = Request::new(Method::Get, ["db", "_all_docs"]).with_query(vec![
            ("limit".to_string(), "3".to_string()),
            ("startkey".to_string(), "0".to_string()),
        ]);

        assert_eq!(request.query_param("startkey"), Some("0"));
        assert_eq!(request.query_param("skip"), None);
    }

    #[test]
    fn success_covers_whole_2xx_range() {
        assert!(Response::new(200, "").is_success());
        assert!(Response::new(202, "").is_success());
        assert!(!Response::new(304, "").is_success());
        assert!(!Response::new(404, "").is_success());
    }
}
