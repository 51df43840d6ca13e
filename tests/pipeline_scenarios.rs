//! End-to-end scenarios through the request pipeline.
//!
//! Each test builds a host from config the way the binary does, then drives
//! requests through `begin`/`execute` and checks what the host callback sees.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::Probe;
use scheme_dispatch::config::schema::SchemeConfig;
use scheme_dispatch::pipeline::{BeginOutcome, Completion, CompletionCallback, Dispatched, SchemeRequest};
use scheme_dispatch::resource::error_handler::{STATUS_TEXT_FILE_NOT_FOUND, STATUS_TEXT_ZERO_FILE_SIZE};
use scheme_dispatch::routing::{ApiResponse, CommandTable, RouteTable};
use scheme_dispatch::{Host, HostConfig, SchemeKind, SchemeRegistry};

fn scheme(scheme: &str, host: &str, kind: SchemeKind) -> SchemeConfig {
    SchemeConfig {
        scheme: scheme.into(),
        host: host.into(),
        kind,
        base_folder: String::new(),
        assembly: None,
    }
}

fn routes() -> RouteTable {
    RouteTable::new()
        .route("/movies", |req| {
            Ok(ApiResponse::ok(json!({
                "id": req.params.get("id"),
                "posted": req.post_data,
            })))
        })
        .route_async("/slow", |_| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(ApiResponse::ok("slow"))
        })
}

struct Fixture {
    host: Host,
    _dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("dist")).unwrap();
    std::fs::write(dir.path().join("dist/index.html"), "<h1>hello</h1>").unwrap();
    std::fs::write(dir.path().join("dist/empty.js"), "").unwrap();

    let mut config = HostConfig::default();
    config.resources.root = dir.path().to_path_buf();
    config.schemes = vec![
        scheme("local", "dist", SchemeKind::Resource),
        scheme("app", "api", SchemeKind::LocalRequest),
        scheme("http", "command.com", SchemeKind::Command),
        // Assembly scheme with no bundle configured.
        scheme("assembly", "broken", SchemeKind::AssemblyResource),
    ];

    let host = Host::build(
        &config,
        Arc::new(SchemeRegistry::new()),
        routes(),
        CommandTable::new(),
    )
    .unwrap();
    Fixture { host, _dir: dir }
}

#[derive(Debug, PartialEq)]
enum Began {
    NotHandled,
    Rejected,
    Async,
}

/// Begin `request` with a probe callback and wait for its task to end.
async fn run(host: &Host, request: SchemeRequest) -> (Began, Probe) {
    let probe = Probe::default();
    let began = match host.pipeline.begin(request, CompletionCallback::new(probe.clone())) {
        BeginOutcome::NotHandled => Began::NotHandled,
        BeginOutcome::Rejected => Began::Rejected,
        BeginOutcome::ContinueAsync(handle) => {
            let id = handle.id();
            handle.join().await;
            assert!(!host.pipeline.inflight().contains(&id));
            Began::Async
        }
    };
    (began, probe)
}

fn body_json(probe: &Probe) -> (StatusCode, Value) {
    let resp = probe.take_response().expect("response delivered");
    (resp.status, serde_json::from_slice(resp.body_bytes()).unwrap())
}

#[tokio::test]
async fn test_resource_served_exactly_once() {
    let f = fixture();
    let (began, probe) = run(&f.host, SchemeRequest::get("local://dist/index.html").unwrap()).await;

    assert_eq!(began, Began::Async);
    assert_eq!(probe.outcomes(), (1, 0));
    let resp = probe.take_response().unwrap();
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.mime_type, "text/html");
    assert_eq!(resp.body_position(), 0);
    assert_eq!(resp.body_bytes().as_ref(), b"<h1>hello</h1>");
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let f = fixture();
    let (_, probe) = run(&f.host, SchemeRequest::get("local://dist/missing.html").unwrap()).await;

    assert_eq!(probe.outcomes(), (1, 0));
    let resp = probe.take_response().unwrap();
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.status_text, STATUS_TEXT_FILE_NOT_FOUND);
}

#[tokio::test]
async fn test_empty_file_is_bad_request() {
    let f = fixture();
    let (_, probe) = run(&f.host, SchemeRequest::get("local://dist/empty.js").unwrap()).await;

    assert_eq!(probe.outcomes(), (1, 0));
    let resp = probe.take_response().unwrap();
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.status_text, STATUS_TEXT_ZERO_FILE_SIZE);
}

#[tokio::test]
async fn test_unregistered_and_unhandled_schemes_cancel() {
    let f = fixture();
    for url in ["other://dist/index.html", "http://command.com/movies"] {
        let (began, probe) = run(&f.host, SchemeRequest::get(url).unwrap()).await;
        assert_eq!(began, Began::NotHandled, "{url}");
        assert_eq!(probe.outcomes(), (0, 1), "{url}");
    }
}

#[tokio::test]
async fn test_bundle_scheme_without_bundle_is_rejected() {
    let f = fixture();
    let (began, probe) = run(&f.host, SchemeRequest::get("assembly://broken/index.html").unwrap()).await;

    assert_eq!(began, Began::Rejected);
    assert_eq!(probe.outcomes(), (0, 1));
    assert!(f.host.pipeline.inflight().is_empty());
}

#[tokio::test]
async fn test_local_request_dispatches_route() {
    let f = fixture();
    let request = SchemeRequest::new(
        Method::POST,
        url::Url::parse("app://api/movies?id=42").unwrap(),
    )
    .with_body("{\"title\":\"Alien\"}");

    let (_, probe) = run(&f.host, request).await;

    assert_eq!(probe.outcomes(), (1, 0));
    let (status, body) = body_json(&probe);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": "42", "posted": "{\"title\":\"Alien\"}"}));
}

#[tokio::test]
async fn test_local_request_async_route() {
    let f = fixture();
    match f.host.pipeline.execute(SchemeRequest::get("app://api/slow").unwrap()).await {
        Dispatched::Finished(Completion::Continue(resp)) => {
            assert_eq!(resp.body_bytes().as_ref(), b"slow");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_local_request_unknown_route_is_not_found() {
    let f = fixture();
    let (_, probe) = run(&f.host, SchemeRequest::get("app://api/nothing").unwrap()).await;

    let (status, body) = body_json(&probe);
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert_eq!(body["statusText"], "Not Found");
}

#[tokio::test]
async fn test_local_request_root_is_bad_request() {
    let f = fixture();
    let (_, probe) = run(&f.host, SchemeRequest::get("app://api/").unwrap()).await;

    let (status, body) = body_json(&probe);
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusText"], "Bad Request");
}

#[tokio::test]
async fn test_many_concurrent_requests_each_complete_once() {
    let f = fixture();
    let mut probes = Vec::new();
    let mut handles = Vec::new();
    for i in 0..32 {
        let url = if i % 2 == 0 {
            "local://dist/index.html".to_string()
        } else {
            format!("app://api/movies?id={}", i)
        };
        let probe = Probe::default();
        match f.host.pipeline.begin(
            SchemeRequest::get(&url).unwrap(),
            CompletionCallback::new(probe.clone()),
        ) {
            BeginOutcome::ContinueAsync(handle) => handles.push(handle),
            other => panic!("unexpected {:?}", other),
        }
        probes.push(probe);
    }

    for handle in handles {
        handle.join().await;
    }
    for probe in probes {
        assert_eq!(probe.outcomes(), (1, 0));
    }
    assert!(f.host.pipeline.inflight().is_empty());
}
