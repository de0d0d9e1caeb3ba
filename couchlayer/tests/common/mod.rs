#![allow(dead_code)]

use couchlayer::{
    database::ALL_DOCS,
    memory::InMemoryServer,
    prelude::*,
};
use serde_json::{Map, Value, json};
use std::num::NonZeroUsize;
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn limit(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

pub fn data(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

/// A server with database `db` holding one document per id.
pub async fn seeded(db: &str, ids: &[String]) -> InMemoryServer {
    let mut builder = InMemoryServer::builder().database(db);
    for id in ids {
        builder = builder.document(db, json!({ "_id": id, "value": id }));
    }
    builder.build().await.unwrap()
}

/// A server with database `letters` holding documents `a` to `e`.
pub async fn letters() -> InMemoryServer {
    let ids: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
    seeded("letters", &ids).await
}

/// Zero-padded ids so that key order matches numeric order.
pub fn numbered_ids(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("doc-{i:03}")).collect()
}

pub async fn listing_requests(server: &InMemoryServer) -> Vec<Request> {
    server
        .requests()
        .await
        .into_iter()
        .filter(|request| request.path.last().is_some_and(|segment| segment == ALL_DOCS))
        .collect()
}

pub async fn methods(server: &InMemoryServer) -> Vec<Method> {
    server.requests().await.iter().map(|request| request.method).collect()
}
