#![allow(clippy::unwrap_used)]
// Integration tests for `FetchModule` using wiremock.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use catalogo_api::{
    BusyKind, BusyTracker, Error, FetchModule, Origin, RequestConfig, ResponseBody, ResponseKind,
    handle_error,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Arc<FetchModule>) {
    let server = MockServer::start().await;
    let backend = Url::parse(&format!("{}/api-back/", server.uri())).unwrap();
    let app = Url::parse(&server.uri()).unwrap();
    let fetch = FetchModule::new(
        reqwest::Client::new(),
        Some(backend),
        Some(app),
        Arc::new(BusyTracker::new()),
    );
    (server, Arc::new(fetch))
}

/// Wait until a request is registered under `key`.
async fn until_registered(fetch: &FetchModule, key: &str) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !fetch.registry().contains(key) {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("request never registered");
}

fn slow(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(body)
        .set_delay(Duration::from_secs(10))
}

#[derive(Debug, Deserialize, PartialEq)]
struct Product {
    name: String,
}

// ── URL construction ────────────────────────────────────────────────

#[tokio::test]
async fn test_params_skip_undefined_values() {
    let (server, fetch) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api-back/search"))
        .and(query_param("q", "x"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "mesa" })))
        .expect(1)
        .mount(&server)
        .await;

    let config = RequestConfig::get("/search")
        .param("q", "x")
        .param_opt::<u32>("page", None);
    let product = fetch.fetch_data::<Product>(config).await.unwrap();

    assert!(product.success);
    assert_eq!(product.name, "mesa");
}

#[tokio::test]
async fn test_app_origin_skips_backend_prefix() {
    let (server, fetch) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "user": "a", "password": "b" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let config = RequestConfig::post("/auth/login", json!({ "user": "a", "password": "b" }))
        .origin(Origin::App);
    fetch.fetch_data::<Product>(config).await.unwrap();
}

#[tokio::test]
async fn test_relative_url_without_base_is_rejected() {
    let fetch = FetchModule::new(
        reqwest::Client::new(),
        None,
        None,
        Arc::new(BusyTracker::new()),
    );

    let result = fetch.fetch_body(RequestConfig::get("/product/")).await;

    assert!(
        matches!(result, Err(Error::MissingBaseUrl { .. })),
        "expected MissingBaseUrl, got: {result:?}"
    );
    assert!(fetch.registry().is_empty());
    assert!(!fetch.busy().is_busy(BusyKind::Read));
}

// ── Headers ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_token_header() {
    let (server, fetch) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api-back/solicitud/"))
        .and(header("authorization", "Bearer tok-123"))
        .and(header("x-trace", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "s" })))
        .expect(1)
        .mount(&server)
        .await;

    let config = RequestConfig::get("/solicitud/")
        .bearer(Some("tok-123".to_string().into()))
        .header("x-trace", "1");
    fetch.fetch_data::<Product>(config).await.unwrap();
}

#[tokio::test]
async fn test_caller_authorization_overrides_bearer() {
    let (server, fetch) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api-back/solicitud/"))
        .and(header("authorization", "Basic abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "s" })))
        .expect(1)
        .mount(&server)
        .await;

    let config = RequestConfig::get("/solicitud/")
        .bearer(Some("tok-123".to_string().into()))
        .header("Authorization", "Basic abc");
    fetch.fetch_data::<Product>(config).await.unwrap();
}

// ── Responses ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_envelope_message_is_merged() {
    let (server, fetch) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api-back/product/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "sin cambios",
            "name": "silla"
        })))
        .mount(&server)
        .await;

    let envelope = fetch
        .fetch_data::<Product>(RequestConfig::put("/product/1", json!({ "name": "silla" })))
        .await
        .unwrap();

    assert!(!envelope.success);
    assert_eq!(envelope.message.as_deref(), Some("sin cambios"));
    assert_eq!(envelope.into_inner(), Product { name: "silla".into() });
}

#[tokio::test]
async fn test_response_kinds() {
    let (server, fetch) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api-back/archivos/a.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hola"))
        .mount(&server)
        .await;

    let text = fetch
        .fetch_body(RequestConfig::get("/archivos/a.txt").response_kind(ResponseKind::Text))
        .await
        .unwrap();
    assert_eq!(text.into_text().as_deref(), Some("hola"));

    let blob = fetch
        .fetch_body(RequestConfig::get("/archivos/a.txt").response_kind(ResponseKind::Blob))
        .await
        .unwrap();
    assert_eq!(blob.into_bytes().unwrap().as_ref(), b"hola");

    let stream = fetch
        .fetch_body(RequestConfig::get("/archivos/a.txt").response_kind(ResponseKind::Stream))
        .await
        .unwrap();
    assert!(matches!(stream, ResponseBody::Stream(_)));
}

#[tokio::test]
async fn test_http_error_keeps_body_data() {
    let (server, fetch) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api-back/cc/9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "centro no encontrado" })),
        )
        .mount(&server)
        .await;

    let err = fetch
        .fetch_body(RequestConfig::delete("/cc/9"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    let shape = handle_error(&err);
    assert_eq!(shape.message, "Centro no encontrado");
    assert_eq!(shape.status_code, 404);
    assert!(fetch.registry().is_empty());
    assert!(!fetch.busy().is_busy(BusyKind::Mutating));
}

// ── Busy bookkeeping ────────────────────────────────────────────────

#[tokio::test]
async fn test_busy_flags_during_and_after_request() {
    let (server, fetch) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api-back/product/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "name": "x" }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let task = {
        let fetch = Arc::clone(&fetch);
        tokio::spawn(async move {
            fetch
                .fetch_data::<Product>(RequestConfig::get("/product/").scope("catalog"))
                .await
        })
    };

    until_registered(&fetch, "/product/").await;
    let busy = fetch.busy();
    assert!(busy.is_busy(BusyKind::Read));
    assert!(!busy.is_busy(BusyKind::Mutating));
    assert!(busy.is_scope_busy("catalog"));

    task.await.unwrap().unwrap();

    assert!(!busy.is_busy(BusyKind::Read));
    assert_eq!(busy.count(BusyKind::Read), 0);
    assert!(!busy.is_scope_busy("catalog"));
    assert!(fetch.registry().is_empty());
}

#[tokio::test]
async fn test_forced_spinner_counts_get_as_mutating() {
    let (server, fetch) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api-back/user/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "name": "u" }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let task = {
        let fetch = Arc::clone(&fetch);
        tokio::spawn(async move {
            fetch
                .fetch_data::<Product>(RequestConfig::get("/user/").force_spinner())
                .await
        })
    };

    until_registered(&fetch, "/user/").await;
    assert!(fetch.busy().is_busy(BusyKind::Mutating));
    assert!(fetch.busy().is_busy(BusyKind::Read));
    assert!(fetch.busy().is_scope_busy("default"));

    task.await.unwrap().unwrap();
    assert!(!fetch.busy().is_busy(BusyKind::Mutating));
    assert!(!fetch.busy().is_busy(BusyKind::Read));
}

// ── Cancellation ────────────────────────────────────────────────────

#[tokio::test]
async fn test_abort_same_cancels_previous_request() {
    let (server, fetch) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api-back/solicitud/"))
        .and(query_param("page", "1"))
        .respond_with(slow(json!({ "name": "old" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api-back/solicitud/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "new" })))
        .mount(&server)
        .await;

    let first = {
        let fetch = Arc::clone(&fetch);
        tokio::spawn(async move {
            fetch
                .fetch_data::<Product>(
                    RequestConfig::get("/solicitud/")
                        .param("page", 1)
                        .abort_previous("same"),
                )
                .await
        })
    };
    until_registered(&fetch, "/solicitud/").await;
    let previous = fetch.registry().pending_for("/solicitud/");
    assert_eq!(previous.len(), 1);

    let second = fetch
        .fetch_data::<Product>(
            RequestConfig::get("/solicitud/")
                .param("page", 2)
                .abort_previous("same"),
        )
        .await
        .unwrap();
    assert_eq!(second.name, "new");
    assert!(previous[0].cancel.is_cancelled());

    let first = first.await.unwrap();
    assert!(
        matches!(first, Err(ref e) if e.is_cancelled()),
        "expected cancellation, got: {first:?}"
    );
    assert!(fetch.registry().is_empty());
    assert_eq!(fetch.busy().count(BusyKind::Read), 0);
}

#[tokio::test]
async fn test_invalid_request_leaves_previous_running() {
    let (server, fetch) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api-back/solicitud/"))
        .respond_with(slow(json!({ "name": "old" })))
        .mount(&server)
        .await;

    let first = {
        let fetch = Arc::clone(&fetch);
        tokio::spawn(async move {
            fetch
                .fetch_data::<Product>(RequestConfig::get("/solicitud/").abort_previous("same"))
                .await
        })
    };
    until_registered(&fetch, "/solicitud/").await;
    let previous = fetch.registry().pending_for("/solicitud/");

    let err = fetch
        .fetch_data::<Product>(
            RequestConfig::get("/solicitud/")
                .header("x-filtro", "a\nb")
                .abort_previous("same"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidHeader(_)), "got: {err:?}");

    assert!(!previous[0].cancel.is_cancelled());
    assert_eq!(fetch.registry().pending_for("/solicitud/").len(), 1);
    assert!(!first.is_finished());
    first.abort();
}

#[tokio::test]
async fn test_navigation_cancels_only_flagged_requests() {
    let (server, fetch) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api-back/product/"))
        .respond_with(slow(json!({ "name": "p" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api-back/cc/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "name": "c" }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    fetch.on_navigate("/a");

    let flagged = {
        let fetch = Arc::clone(&fetch);
        tokio::spawn(async move {
            fetch
                .fetch_data::<Product>(RequestConfig::get("/product/").cancel_on_route_change())
                .await
        })
    };
    let unflagged = {
        let fetch = Arc::clone(&fetch);
        tokio::spawn(async move { fetch.fetch_data::<Product>(RequestConfig::get("/cc/")).await })
    };
    until_registered(&fetch, "/product/").await;
    until_registered(&fetch, "/cc/").await;
    assert_eq!(fetch.registry().pending_for("/product/")[0].origin_path, "/a");

    assert_eq!(fetch.on_navigate("/b"), 1);
    assert_eq!(fetch.current_path(), "/b");

    let flagged = flagged.await.unwrap();
    assert!(matches!(flagged, Err(Error::Cancelled { .. })));

    let unflagged = unflagged.await.unwrap().unwrap();
    assert_eq!(unflagged.name, "c");

    assert!(fetch.registry().is_empty());
    assert!(!fetch.busy().is_busy(BusyKind::Read));
}
