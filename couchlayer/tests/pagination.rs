mod common;

use couchlayer::prelude::*;
use futures::{StreamExt, TryStreamExt};

use common::{init_tracing, letters, limit, listing_requests, numbered_ids, seeded};

#[tokio::test]
async fn yields_every_document_exactly_once() {
    init_tracing();

    for n in 0..=12 {
        for fetch_limit in 1..=5 {
            let ids = numbered_ids(n);
            let server = seeded("docs", &ids).await;
            let client = CouchClient::new(server.clone());
            let mut docs = client.cached_database_with_limit("docs", limit(fetch_limit));

            let yielded: Vec<String> = docs
                .iter(Source::Remote)
                .map_ok(|row| row.id)
                .try_collect()
                .await
                .unwrap();

            assert_eq!(yielded, ids, "n={n} fetch_limit={fetch_limit}");
            assert_eq!(
                listing_requests(&server).await.len(),
                n.div_ceil(fetch_limit).max(1),
                "n={n} fetch_limit={fetch_limit}"
            );
        }
    }
}

#[tokio::test]
async fn exact_multiple_of_fetch_limit_needs_no_extra_request() {
    let server = seeded("docs", &numbered_ids(6)).await;
    let client = CouchClient::new(server.clone());
    let mut docs = client.cached_database_with_limit("docs", limit(3));

    let rows: Vec<AllDocsRow> = docs.iter(Source::Remote).try_collect().await.unwrap();

    assert_eq!(rows.len(), 6);
    assert_eq!(listing_requests(&server).await.len(), 2);
}

#[tokio::test]
async fn cursor_advances_to_the_excluded_row() {
    init_tracing();
    let server = letters().await;
    let client = CouchClient::new(server.clone());
    let mut letters = client.cached_database_with_limit("letters", limit(2));

    let ids: Vec<String> = letters
        .iter(Source::Remote)
        .map_ok(|row| row.id)
        .try_collect()
        .await
        .unwrap();

    let requests = listing_requests(&server).await;
    let startkeys: Vec<&str> = requests
        .iter()
        .map(|request| request.query_param("startkey").unwrap())
        .collect();

    assert_eq!(ids, ["a", "b", "c", "d", "e"]);
    assert_eq!(startkeys, ["0", "\"c\"", "\"e\""]);
    for request in &requests {
        assert_eq!(request.query_param("limit"), Some("3"));
        assert_eq!(request.query_param("include_docs"), Some("true"));
    }
}

#[tokio::test]
async fn full_iteration_caches_every_document() {
    let server = letters().await;
    let client = CouchClient::new(server);
    let mut letters = client.cached_database_with_limit("letters", limit(2));

    let rows: Vec<AllDocsRow> = letters.iter(Source::Remote).try_collect().await.unwrap();

    assert_eq!(letters.cache().len(), rows.len());
    for row in &rows {
        let cached = letters.get_cached(&row.id).unwrap();
        assert_eq!(cached.get("value"), Some(&serde_json::json!(row.id)));
        assert!(cached.rev().is_some());
    }
}

#[tokio::test]
async fn partial_iteration_caches_only_yielded_rows() {
    let server = letters().await;
    let client = CouchClient::new(server.clone());
    let mut letters = client.cached_database_with_limit("letters", limit(2));

    let rows: Vec<AllDocsRow> = letters
        .iter(Source::Remote)
        .take(2)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(letters.keys(Source::Local).await.unwrap(), ["a", "b"]);
    assert!(!letters.contains_cached("c"));
    assert_eq!(listing_requests(&server).await.len(), 1);
}

#[tokio::test]
async fn every_iteration_restarts_from_the_beginning() {
    let server = letters().await;
    let client = CouchClient::new(server.clone());
    let mut letters = client.cached_database_with_limit("letters", limit(10));

    for _ in 0..2 {
        let rows: Vec<AllDocsRow> = letters.iter(Source::Remote).try_collect().await.unwrap();
        assert_eq!(rows.len(), 5);
    }

    let startkeys: Vec<String> = listing_requests(&server)
        .await
        .iter()
        .filter_map(|request| request.query_param("startkey").map(str::to_owned))
        .collect();
    assert_eq!(startkeys, ["0", "0"]);
}

#[tokio::test]
async fn local_iteration_issues_no_requests() {
    let server = letters().await;
    let client = CouchClient::new(server.clone());
    let mut letters = client.cached_database_with_limit("letters", limit(2));

    let remote: Vec<AllDocsRow> = letters.iter(Source::Remote).try_collect().await.unwrap();
    server.clear_requests().await;

    let local: Vec<AllDocsRow> = letters.iter(Source::Local).try_collect().await.unwrap();

    assert_eq!(
        local.iter().map(|row| &row.id).collect::<Vec<_>>(),
        remote.iter().map(|row| &row.id).collect::<Vec<_>>()
    );
    assert_eq!(local[0].doc, remote[0].doc);
    assert!(server.requests().await.is_empty());
}

#[tokio::test]
async fn outage_ends_iteration_with_the_error() {
    let server = letters().await;
    server.set_unavailable(true).await;
    let client = CouchClient::new(server);
    let mut letters = client.cached_database_with_limit("letters", limit(2));

    let err = letters
        .iter(Source::Remote)
        .try_collect::<Vec<AllDocsRow>>()
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(letters.cache().is_empty());
}

#[tokio::test]
async fn transport_failure_between_pages_stops_the_stream() {
    let server = letters().await;
    let client = CouchClient::new(server.clone());
    let mut letters = client.cached_database_with_limit("letters", limit(2));

    {
        let mut rows = Box::pin(letters.iter(Source::Remote));

        assert_eq!(rows.next().await.unwrap().unwrap().id, "a");
        assert_eq!(rows.next().await.unwrap().unwrap().id, "b");

        server.set_disconnected(true).await;

        let err = rows.next().await.unwrap().unwrap_err();
        assert!(matches!(err, DatabaseError::Transport { .. }));
        assert!(rows.next().await.is_none());
    }

    assert_eq!(letters.cache().len(), 2);
}
