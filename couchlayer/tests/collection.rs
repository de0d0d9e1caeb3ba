mod common;

use couchlayer::{memory::InMemoryServer, prelude::*};
use serde_json::json;

use common::{data, init_tracing, letters, listing_requests, methods};

#[tokio::test]
async fn create_is_idempotent() {
    init_tracing();
    let server = letters().await;
    let client = CouchClient::new(server.clone());
    let mut letters = client.cached_database("letters");

    letters.create().await.unwrap();

    assert_eq!(methods(&server).await, [Method::Get]);
}

#[tokio::test]
async fn create_puts_missing_database() {
    let server = InMemoryServer::new();
    let client = CouchClient::new(server.clone());
    let mut orders = client.cached_database("orders");

    assert!(!orders.exists().await);
    orders.create().await.unwrap();

    assert!(orders.exists().await);
    assert_eq!(methods(&server).await, [Method::Get, Method::Get, Method::Put, Method::Get]);
}

#[tokio::test]
async fn create_chains_into_further_calls() {
    let client = CouchClient::new(InMemoryServer::new());
    let mut orders = client.cached_database("orders");

    let count = orders.create().await.unwrap().doc_count().await.unwrap();

    assert_eq!(count, 0);
}

#[tokio::test]
async fn delete_requires_an_existing_database() {
    let server = letters().await;
    let client = CouchClient::new(server);

    let missing = client.cached_database("missing").delete().await.unwrap_err();
    assert_eq!(missing.status(), Some(404));

    let letters = client.cached_database("letters");
    letters.delete().await.unwrap();
    assert!(!letters.exists().await);
}

#[tokio::test]
async fn delete_keeps_the_local_cache() {
    let client = CouchClient::new(letters().await);
    let mut letters = client.cached_database("letters");

    letters.get("a").await.unwrap();
    letters.delete().await.unwrap();

    assert!(letters.contains_cached("a"));
    letters.clear_cache();
    assert!(letters.cache().is_empty());
}

#[tokio::test]
async fn metadata_reports_document_count() {
    let client = CouchClient::new(letters().await);
    let letters = client.cached_database("letters");

    let info = letters.metadata().await.unwrap();

    assert_eq!(info.db_name, "letters");
    assert_eq!(info.doc_count, 5);
    assert_eq!(letters.doc_count().await.unwrap(), 5);
}

#[tokio::test]
async fn remote_keys_do_not_populate_the_cache() {
    let client = CouchClient::new(letters().await);
    let letters = client.cached_database("letters");

    let keys = letters.keys(Source::Remote).await.unwrap();

    assert_eq!(keys, ["a", "b", "c", "d", "e"]);
    assert!(letters.keys(Source::Local).await.unwrap().is_empty());
}

#[tokio::test]
async fn get_fetches_and_caches_listed_documents() {
    let server = letters().await;
    let client = CouchClient::new(server.clone());
    let mut letters = client.cached_database("letters");

    let document = letters.get("b").await.unwrap();
    assert_eq!(document.id(), Some("b"));
    assert_eq!(document.get("value"), Some(&json!("b")));
    assert!(letters.contains_cached("b"));

    server.clear_requests().await;
    letters.get("b").await.unwrap();

    // The second lookup confirms the id remotely but reads the body locally.
    assert_eq!(listing_requests(&server).await.len(), 1);
    assert_eq!(methods(&server).await, [Method::Get]);
}

#[tokio::test]
async fn get_serves_cached_copy_of_listed_documents() {
    let server = letters().await;
    let client = CouchClient::new(server.clone());
    let mut letters = client.cached_database("letters");

    letters.get("c").await.unwrap();
    server
        .insert_document("letters", json!({ "_id": "c", "value": "changed" }))
        .await
        .unwrap();

    let document = letters.get("c").await.unwrap();

    assert_eq!(document.get("value"), Some(&json!("c")));
}

#[tokio::test]
async fn get_reports_unknown_documents() {
    let server = letters().await;
    let client = CouchClient::new(server.clone());
    let mut letters = client.cached_database("letters");

    let err = letters.get("zzz").await.unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, DatabaseError::DocumentNotFound(ref id, ref db) if id == "zzz" && db == "letters"));
    assert_eq!(methods(&server).await, [Method::Get, Method::Head]);
    assert!(letters.cache().is_empty());
}

#[tokio::test]
async fn create_document_caches_the_stored_version() {
    let server = letters().await;
    let client = CouchClient::new(server.clone());
    let mut letters = client.cached_database("letters");

    let created = letters
        .create_document(data(json!({ "_id": "f", "value": "f" })))
        .await
        .unwrap();
    assert_eq!(created.id(), Some("f"));
    assert!(created.rev().is_some_and(|rev| rev.starts_with("1-")));

    assert!(letters.contains_cached("f"));
    assert_eq!(letters.doc_count().await.unwrap(), 6);
}

#[tokio::test]
async fn create_document_adopts_existing_documents() {
    let client = CouchClient::new(letters().await);
    let mut letters = client.cached_database("letters");

    let document = letters
        .create_document(data(json!({ "_id": "a", "value": "other" })))
        .await
        .unwrap();

    assert_eq!(document.get("value"), Some(&json!("a")));
    assert_eq!(letters.doc_count().await.unwrap(), 5);
}

#[tokio::test]
async fn exclusive_create_rejects_existing_documents() {
    let client = CouchClient::new(letters().await);
    let mut letters = client.cached_database("letters");

    let err = letters
        .create_document_with(data(json!({ "_id": "a" })), CreateMode::Exclusive)
        .await
        .unwrap_err();

    assert!(matches!(err, DatabaseError::DocumentAlreadyExists(..)));
    assert_eq!(err.status(), Some(409));
    assert!(!letters.contains_cached("a"));
}

#[tokio::test]
async fn new_document_receives_a_server_id() {
    let server = letters().await;
    let client = CouchClient::new(server.clone());
    let mut letters = client.cached_database("letters");

    let id = letters.new_document().await.unwrap().id().unwrap().to_string();

    assert!(letters.contains_cached(&id));
    assert!(letters.database().document_exists(&id).await);
    assert_eq!(methods(&server).await, [Method::Post, Method::Head]);
}

#[tokio::test]
async fn unavailable_server_reads_as_absent_but_fails_metadata() {
    let server = letters().await;
    let client = CouchClient::new(server.clone());
    let letters = client.cached_database("letters");

    server.set_unavailable(true).await;

    assert!(!letters.exists().await);
    assert_eq!(letters.metadata().await.unwrap_err().status(), Some(503));
}

#[tokio::test]
async fn disconnected_server_reads_as_absent_but_fails_metadata() {
    let server = letters().await;
    let client = CouchClient::new(server.clone());
    let letters = client.cached_database("letters");

    server.set_disconnected(true).await;

    assert!(!letters.exists().await);
    assert!(!letters.database().document_exists("a").await);
    assert!(matches!(letters.metadata().await.unwrap_err(), DatabaseError::Transport { .. }));
}
