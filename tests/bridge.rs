//! HTTP bridge end-to-end tests.
//!
//! A real listener serves the bridge router; requests go through reqwest the
//! way a page or a developer tool would reach the host.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use common::{start_mock_backend, MockResponse};
use scheme_dispatch::config::schema::SchemeConfig;
use scheme_dispatch::http::response::STATUS_TEXT_CANCELED;
use scheme_dispatch::routing::{ApiResponse, CommandTable, RouteTable};
use scheme_dispatch::{Host, HostConfig, HttpServer, SchemeKind, SchemeRegistry};

struct Bridge {
    addr: SocketAddr,
    client: reqwest::Client,
    _dir: tempfile::TempDir,
}

impl Bridge {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

fn entry(scheme: &str, host: &str, kind: SchemeKind) -> SchemeConfig {
    SchemeConfig {
        scheme: scheme.into(),
        host: host.into(),
        kind,
        base_folder: String::new(),
        assembly: None,
    }
}

fn host_config(dir: &tempfile::TempDir) -> HostConfig {
    let mut config = HostConfig::default();
    config.resources.root = dir.path().to_path_buf();
    config.schemes = vec![
        entry("local", "dist", SchemeKind::Resource),
        entry("app", "api", SchemeKind::LocalRequest),
        entry("http", "127.0.0.1", SchemeKind::ExternalRequest),
    ];
    config
}

fn build_host(config: &HostConfig) -> Host {
    let routes = RouteTable::new().route("/movies", |req| {
        Ok(ApiResponse::ok(json!([{ "id": req.params.get("id"), "title": "Alien" }])))
    });
    Host::build(
        config,
        Arc::new(SchemeRegistry::new()),
        routes,
        CommandTable::new(),
    )
    .unwrap()
}

fn resource_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("dist/css")).unwrap();
    std::fs::write(dir.path().join("dist/index.html"), "<h1>bridge</h1>").unwrap();
    std::fs::write(dir.path().join("dist/css/site.css"), "body {}").unwrap();
    dir
}

async fn start_bridge() -> Bridge {
    let dir = resource_dir();
    let config = host_config(&dir);
    let host = build_host(&config);
    let server = HttpServer::new(config.bridge.clone(), host.pipeline.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = server.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Bridge {
        addr,
        client: reqwest::Client::new(),
        _dir: dir,
    }
}

#[tokio::test]
async fn test_resource_served_with_mime() {
    let bridge = start_bridge().await;

    let resp = bridge.client.get(bridge.url("/local/dist/index.html")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "text/html");
    assert_eq!(resp.text().await.unwrap(), "<h1>bridge</h1>");

    let resp = bridge.client.get(bridge.url("/local/dist/css/site.css")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "text/css");
}

#[tokio::test]
async fn test_missing_resource_is_404() {
    let bridge = start_bridge().await;

    let resp = bridge.client.get(bridge.url("/local/dist/nope.html")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_unregistered_scheme_is_404() {
    let bridge = start_bridge().await;

    for path in ["/other/dist/index.html", "/local", "/"] {
        let resp = bridge.client.get(bridge.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 404, "{path}");
    }
}

#[tokio::test]
async fn test_local_request_returns_json() {
    let bridge = start_bridge().await;

    let resp = bridge.client.get(bridge.url("/app/api/movies?id=3")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert!(resp.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!([{ "id": "3", "title": "Alien" }]));
}

#[tokio::test]
async fn test_local_request_unknown_route_envelope() {
    let bridge = start_bridge().await;

    let resp = bridge.client.post(bridge.url("/app/api/missing")).body("{}").send().await.unwrap();
    assert_eq!(resp.status(), 404);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], 404);
    assert_eq!(body["statusText"], "Not Found");
}

#[tokio::test]
async fn test_request_id_generated_and_propagated() {
    let bridge = start_bridge().await;

    let resp = bridge.client.get(bridge.url("/local/dist/index.html")).send().await.unwrap();
    let generated = resp.headers().get("x-request-id").expect("request id set");
    assert!(uuid::Uuid::parse_str(generated.to_str().unwrap()).is_ok());

    let id = "6a1f64c2-8c43-4b9e-9a55-0a7d1d3f2b10";
    let resp = bridge
        .client
        .get(bridge.url("/local/dist/index.html"))
        .header("x-request-id", id)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-request-id"], id);
}

#[tokio::test]
async fn test_external_request_through_bridge() {
    let upstream = start_mock_backend(
        MockResponse::ok("{\"ok\":true}")
            .header("Content-Type", "application/json")
            .header("X-Frame-Options", "DENY"),
    )
    .await;
    let bridge = start_bridge().await;

    let path = format!("/http/{}/status", upstream);
    let resp = bridge.client.get(bridge.url(&path)).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    assert!(resp.headers().get("x-frame-options").is_none());
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert_eq!(resp.text().await.unwrap(), "{\"ok\":true}");
}

#[tokio::test]
async fn test_shutdown_cancels_inflight_requests() {
    let upstream =
        start_mock_backend(MockResponse::ok("late").delayed(Duration::from_secs(30))).await;
    let dir = resource_dir();
    let mut config = host_config(&dir);
    config.bridge.shutdown_grace_secs = 2;
    let host = build_host(&config);
    let pipeline = host.pipeline.clone();
    let server = HttpServer::new(config.bridge.clone(), host.pipeline.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server_task = tokio::spawn(server.run(listener, async move {
        let _ = stop_rx.await;
    }));

    let url = format!("http://{}/http/{}/slow", addr, upstream);
    let pending = tokio::spawn(async move { reqwest::get(url).await });

    // Wait until the proxied request is in flight.
    for _ in 0..100 {
        if !pipeline.inflight().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(pipeline.inflight().len(), 1);

    stop_tx.send(()).unwrap();

    let resp = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .expect("pending request answered")
        .unwrap()
        .unwrap();
    assert_eq!(resp.status(), 502);
    assert_eq!(resp.text().await.unwrap(), STATUS_TEXT_CANCELED);

    tokio::time::timeout(Duration::from_secs(5), server_task)
        .await
        .expect("server stops")
        .unwrap()
        .unwrap();
    assert!(pipeline.inflight().is_empty());
}
