//! Client configuration.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Page size used when none is configured.
pub const DEFAULT_FETCH_LIMIT: NonZeroUsize = NonZeroUsize::MIN.saturating_add(99);

/// Settings shared by every collection a client hands out.
///
/// # Example
///
/// ```ignore
/// let config: ClientConfig = serde_json::from_str(r#"{ "fetch_limit": 25 }"#)?;
/// let client = CouchClient::with_config(transport, config);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Number of documents requested per page during remote iteration.
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: NonZeroUsize,
}

fn default_fetch_limit() -> NonZeroUsize {
    DEFAULT_FETCH_LIMIT
}

impl ClientConfig {
    pub fn with_fetch_limit(mut self, fetch_limit: NonZeroUsize) -> Self {
        self.fetch_limit = fetch_limit;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { fetch_limit: DEFAULT_FETCH_LIMIT }
    }
}
