use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};
use std::{env, fmt, time::Duration};
use tracing::debug;
use url::Url;

use couchlayer_core::{
    error::{DatabaseError, DatabaseResult},
    transport::{Method, Request, Response, Transport, TransportBuilder},
};

use crate::path::build_url;

/// Environment variable holding the server URL.
pub const URL_VAR: &str = "COUCHLAYER_URL";
/// Environment variable holding the basic-auth user name.
pub const USERNAME_VAR: &str = "COUCHLAYER_USERNAME";
/// Environment variable holding the basic-auth password.
pub const PASSWORD_VAR: &str = "COUCHLAYER_PASSWORD";
/// Environment variable holding the request timeout in seconds.
pub const TIMEOUT_VAR: &str = "COUCHLAYER_TIMEOUT_SECS";

/// Connection settings for [`HttpTransport`].
///
/// # Example
///
/// ```ignore
/// let config: HttpConfig = serde_json::from_str(r#"{
///     "url": "https://account.cloudant.com",
///     "username": "admin",
///     "password": "secret",
///     "timeout_secs": 30
/// }"#)?;
/// let transport = config.builder().build().await?;
/// ```
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Server root, e.g. `http://localhost:5984`.
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Whole-request timeout. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), username: None, password: None, timeout_secs: None }
    }

    /// Reads the configuration from `COUCHLAYER_URL`, `COUCHLAYER_USERNAME`,
    /// `COUCHLAYER_PASSWORD` and `COUCHLAYER_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Initialization`] if the URL is missing or the
    /// timeout is not a whole number of seconds.
    pub fn from_env() -> DatabaseResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DatabaseResult<Self> {
        let url = lookup(URL_VAR)
            .ok_or_else(|| DatabaseError::Initialization(format!("{URL_VAR} is not set")))?;
        let timeout_secs = lookup(TIMEOUT_VAR)
            .map(|raw| {
                raw.trim().parse().map_err(|_| {
                    DatabaseError::Initialization(format!("{TIMEOUT_VAR} must be a number of seconds, got {raw}"))
                })
            })
            .transpose()?;

        Ok(Self {
            url,
            username: lookup(USERNAME_VAR),
            password: lookup(PASSWORD_VAR),
            timeout_secs,
        })
    }

    /// Returns a transport builder preloaded with these settings.
    pub fn builder(&self) -> HttpTransportBuilder {
        let mut builder = HttpTransport::builder(&self.url);

        if let Some(username) = &self.username {
            builder = builder.credentials(username, self.password.clone());
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder
    }
}

impl fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone)]
struct Credentials {
    username: String,
    password: Option<String>,
}

/// [`Transport`] over HTTP(S) backed by `reqwest`.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    base: Url,
    client: Client,
    credentials: Option<Credentials>,
}

impl HttpTransport {
    /// Creates a builder for a transport rooted at `url`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use couchlayer::{http::HttpTransport, transport::TransportBuilder};
    ///
    /// let transport = HttpTransport::builder("http://localhost:5984")
    ///     .credentials("admin", Some("secret"))
    ///     .build()
    ///     .await?;
    /// ```
    pub fn builder(url: impl Into<String>) -> HttpTransportBuilder {
        HttpTransportBuilder::new(url)
    }

    /// Returns the server root.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Put => reqwest::Method::PUT,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base", &self.base.as_str())
            .field("username", &self.credentials.as_ref().map(|c| &c.username))
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> DatabaseResult<Response> {
        let url = build_url(&self.base, &request.path, &request.query)?;
        let mut builder = self
            .client
            .request(Self::method(request.method), url.clone())
            .header(ACCEPT, "application/json");

        if let Some(credentials) = &self.credentials {
            builder = builder.basic_auth(&credentials.username, credentials.password.as_ref());
        }
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(body)?);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DatabaseError::transport(format!("{} {url} failed", request.method), e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| DatabaseError::transport(format!("reading response from {url} failed"), e))?;

        debug!(method = %request.method, %url, status, "http exchange");

        Ok(Response::new(status, body))
    }

    fn resource_url(&self, path: &[String]) -> String {
        build_url(&self.base, path, &[])
            .map(String::from)
            .unwrap_or_else(|_| format!("{}/{}", self.base.as_str().trim_end_matches('/'), path.join("/")))
    }
}

/// Builder for creating an [`HttpTransport`].
#[derive(Clone)]
pub struct HttpTransportBuilder {
    url: String,
    credentials: Option<Credentials>,
    timeout: Option<Duration>,
}

impl HttpTransportBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), credentials: None, timeout: None }
    }

    /// Authenticates every request with HTTP basic auth.
    pub fn credentials(mut self, username: impl Into<String>, password: Option<impl Into<String>>) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.map(Into::into),
        });
        self
    }

    /// Sets a whole-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for HttpTransportBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransportBuilder")
            .field("url", &self.url)
            .field("username", &self.credentials.as_ref().map(|c| &c.username))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl TransportBuilder for HttpTransportBuilder {
    type Transport = HttpTransport;

    async fn build(self) -> DatabaseResult<Self::Transport> {
        let base = Url::parse(&self.url)
            .map_err(|e| DatabaseError::Initialization(format!("invalid server URL {}: {e}", self.url)))?;
        if base.cannot_be_a_base() {
            return Err(DatabaseError::Initialization(format!(
                "{base} cannot be used as a base URL"
            )));
        }

        let mut client = Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }

        Ok(HttpTransport {
            base,
            client: client
                .build()
                .map_err(|e| DatabaseError::Initialization(e.to_string()))?,
            credentials: self.credentials,
        })
    }
}
