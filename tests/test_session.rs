use heapview::{
    dispatch::{Session, HISTOGRAM_TAB_NAME},
    output::{MemorySink, Notice},
    transport::{make_canned_server, CannedServer},
    ClientError,
};

const INIT_UI: &str = r#"{"handler": "InitUI", "data": {}}"#;

fn fetched(server: &CannedServer) -> impl FnOnce() -> Vec<String> {
    let log = server.fetch_log();
    move || log.lock().unwrap().clone()
}

/// The end-to-end flow the server drives for a fresh page: reset, class
/// definitions, then a histogram referencing them.
#[tokio::test]
async fn test_init_defs_histo_renders_one_table() {
    let server = make_canned_server(&[
        ("init", INIT_UI),
        (
            "defs",
            r#"{"handler": "ClassDefs", "data": [{"id": 1, "name": "X"}]}"#,
        ),
        (
            "histo",
            r#"{"handler": "Histo", "data": [{"id": 1, "count": 5, "nbytes": 50}]}"#,
        ),
    ]);
    let log = fetched(&server);

    let mut session = Session::new(Box::new(server), MemorySink::new());
    session.request("init").then("defs").then("histo");
    let summary = session.run().await.unwrap();

    assert_eq!(summary.responses, 3);
    assert_eq!(summary.failures, 0);
    assert_eq!(log(), vec!["init", "defs", "histo"]);

    let sink = session.into_sink();
    assert!(sink.notices.is_empty());
    assert_eq!(sink.tabs.len(), 1);
    assert_eq!(sink.tabs[0].name, HISTOGRAM_TAB_NAME);
    insta::assert_json_snapshot!(sink.tabs[0].table.rows, @r###"
    [
      {
        "header": false,
        "cells": [
          "X",
          "5",
          "50"
        ]
      }
    ]
    "###);
}

/// `request(A).then(B); request(A).then(C)`: B is only issued once the first A
/// has been handled, and C only once B has been handled.
#[tokio::test]
async fn test_chained_requests_are_sequential() {
    let server = make_canned_server(&[
        ("a", INIT_UI),
        ("b", r#"{"handler": "ClassDefs", "data": [{"id": 1, "name": "p.B"}]}"#),
        (
            "c",
            r#"{"handler": "Histo", "data": [{"id": 1, "count": 2, "nbytes": 16}]}"#,
        ),
    ]);
    let log = fetched(&server);

    let mut session = Session::new(Box::new(server), MemorySink::new());
    session.request("a").then("b");
    session.request("a").then("c");
    assert_eq!(session.pending().len(), 2);

    let summary = session.run().await.unwrap();
    assert_eq!(summary.responses, 4);

    let order = log();
    assert_eq!(order, vec!["a", "a", "b", "c"]);

    // C's histogram could only be rendered if B's class definitions had
    // already been registered.
    let sink = session.into_sink();
    assert!(sink.notices.is_empty());
    assert_eq!(sink.tabs.len(), 1);
    assert_eq!(sink.tabs[0].table.rows[0].cells, vec!["p", "2", "16"]);
}

#[tokio::test]
async fn test_unknown_handler_still_fires_next_request() {
    let server = make_canned_server(&[
        ("bogus", r#"{"handler": "Bogus", "data": [1, 2, 3]}"#),
        ("next", r#"{"handler": "Error", "data": "no such heap"}"#),
    ]);
    let log = fetched(&server);

    let mut session = Session::new(Box::new(server), MemorySink::new());
    session.request("bogus").then("next");
    let summary = session.run().await.unwrap();

    assert_eq!(summary.responses, 2);
    assert_eq!(summary.failures, 1);
    assert_eq!(log(), vec!["bogus", "next"]);

    let notices = &session.sink().notices;
    assert_eq!(notices.len(), 2);
    assert!(matches!(notices[0], Notice::ProtocolMismatch(_)));
    assert_eq!(notices[1], Notice::ServerError("no such heap".to_string()));
}

#[tokio::test]
async fn test_unregistered_class_is_a_lookup_failure() {
    let server = make_canned_server(&[
        ("init", INIT_UI),
        (
            "histo",
            r#"{"handler": "Histo", "data": [{"id": 42, "count": 1, "nbytes": 8}]}"#,
        ),
    ]);

    let mut session = Session::new(Box::new(server), MemorySink::new());
    session.request("init").then("histo");
    let summary = session.run().await.unwrap();
    assert_eq!(summary.failures, 1);

    let sink = session.into_sink();
    assert!(sink.tabs.is_empty());
    assert_eq!(sink.notices, vec![Notice::Failure(ClientError::Lookup(42).to_string())]);
}

/// A histogram whose totals can't be represented is reported like any other
/// malformed response, and the chain carries on.
#[tokio::test]
async fn test_overflowing_histogram_still_fires_next_request() {
    let server = make_canned_server(&[
        (
            "defs",
            r#"{"handler": "ClassDefs", "data": [{"id": 1, "name": "a.A"}, {"id": 2, "name": "a.B"}]}"#,
        ),
        (
            "huge",
            r#"{"handler": "Histo", "data": [{"id": 1, "count": 18446744073709551615, "nbytes": 1}, {"id": 2, "count": 1, "nbytes": 1}]}"#,
        ),
        (
            "small",
            r#"{"handler": "Histo", "data": [{"id": 2, "count": 1, "nbytes": 1}]}"#,
        ),
    ]);
    let log = fetched(&server);

    let mut session = Session::new(Box::new(server), MemorySink::new());
    session.request("defs").then("huge").then("small");
    let summary = session.run().await.unwrap();

    assert_eq!(summary.failures, 1);
    assert_eq!(log(), vec!["defs", "huge", "small"]);

    let sink = session.into_sink();
    assert_eq!(sink.notices.len(), 1);
    assert!(matches!(sink.notices[0], Notice::ProtocolMismatch(_)));
    assert!(sink.notices[0].message().contains("totals overflow"));
    assert_eq!(sink.tabs.len(), 1);
    assert_eq!(sink.tabs[0].table.rows[0].cells, vec!["a", "1", "1"]);
}

#[tokio::test]
async fn test_registry_persists_across_queries_until_init() {
    let server = make_canned_server(&[
        (
            "defs",
            r#"{"handler": "ClassDefs", "data": [{"id": 1, "name": "a.A"}, {"id": 2, "name": "b.B"}]}"#,
        ),
        (
            "query?q=first",
            r#"{"handler": "Histo", "data": [{"id": 1, "count": 1, "nbytes": 10}]}"#,
        ),
        (
            "query?q=second",
            r#"{"handler": "Histo", "data": [{"id": 2, "count": 3, "nbytes": 30}, {"id": 1, "count": 1, "nbytes": 10}]}"#,
        ),
        ("reset", INIT_UI),
    ]);

    let mut session = Session::new(Box::new(server), MemorySink::new());
    session.request("defs");
    session.query("first");
    session.query("second").then("reset");
    session.run().await.unwrap();

    assert!(session.registry().is_empty());
    let sink = session.into_sink();
    assert_eq!(sink.tabs.len(), 2);
    assert_ne!(sink.tabs[0].id, sink.tabs[1].id);
    let labels: Vec<&str> = sink.tabs[1]
        .table
        .rows
        .iter()
        .map(|row| row.cells[0].as_str())
        .collect();
    assert_eq!(labels, vec!["a", "b"]);
}

#[tokio::test]
async fn test_transport_failure_halts_chain() {
    let server = make_canned_server(&[("init", INIT_UI), ("after", INIT_UI)]).fail("broken", 500);
    let log = fetched(&server);

    let mut session = Session::new(Box::new(server), MemorySink::new());
    session.request("init").then("broken").then("after");

    let err = session.run().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(err.is_transient());

    assert_eq!(log(), vec!["init", "broken"]);
    // The follow-up stays queued; nothing resumes it.
    assert_eq!(
        session.pending().iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["after"]
    );

    let sink = session.into_sink();
    assert_eq!(sink.notices.len(), 1);
    assert!(matches!(sink.notices[0], Notice::Fatal(_)));
    assert!(sink.notices[0]
        .message()
        .starts_with("Internal error, response processing failed: "));
}
