//! HTTP transport for couchlayer.
//!
//! This crate provides [`HttpTransport`], a `reqwest`-based implementation of
//! the `Transport` trait for CouchDB and Cloudant servers.
//!
//! To use this transport, include the `http` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! couchlayer = { version = "x.y.z", features = ["http"] }
//! ```
//!
//! # Features
//!
//! - **TLS** - HTTPS through rustls with the platform's root certificates
//! - **Authentication** - Optional HTTP basic auth
//! - **Timeouts** - Optional whole-request timeout
//! - **Configuration** - [`HttpConfig`] from serde sources or environment variables
//!
//! # Example
//!
//! ```ignore
//! use couchlayer::{prelude::*, http::HttpConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpConfig::from_env()?.builder().build().await?;
//!     let client = CouchClient::new(transport);
//!
//!     println!("{} orders", client.database("orders").doc_count().await?);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as couchlayer_http;

mod path;
pub mod transport;

pub use transport::{HttpConfig, HttpTransport, HttpTransportBuilder};
