#![allow(clippy::unwrap_used)]
// Integration tests for the auth store, route guard and service base.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use catalogo_api::RequestConfig;
use catalogo_core::{
    App, ClientConfig, INVALID_CREDENTIALS, MemorySessionStore, Navigation, RouteMeta, RouteTable,
    Severity, SessionStore, UserType,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn routes() -> RouteTable {
    RouteTable::new()
        .with_route("/login", RouteMeta::public())
        .with_route("/solicitudes", RouteMeta::with_roles([UserType::User, UserType::Admin]))
        .with_route("/admin", RouteMeta::with_roles([UserType::Admin]))
}

async fn setup() -> (MockServer, App<MemorySessionStore>) {
    let server = MockServer::start().await;
    let config = ClientConfig {
        back_base_url: Some(Url::parse(&format!("{}/api-back/", server.uri())).unwrap()),
        app_base_url: Some(Url::parse(&server.uri()).unwrap()),
        cookies: false,
        ..ClientConfig::default()
    };
    let app = App::from_config(&config, MemorySessionStore::new(), routes()).unwrap();
    (server, app)
}

fn session(roles: &[&str]) -> serde_json::Value {
    json!({
        "token": "jwt-abc",
        "expire": "2030-01-01T00:00:00Z",
        "user": {
            "_id": "66a1",
            "username": "jperez",
            "email": "jperez@usach.cl",
            "rut": "11.111.111-1",
            "role": roles,
            "cc": ["cc1"]
        }
    })
}

async fn mount_session(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn password() -> SecretString {
    SecretString::from("hunter2".to_owned())
}

// ── Login / logout ──────────────────────────────────────────────────

#[tokio::test]
async fn test_login_failure_has_fixed_message() {
    let (server, app) = setup().await;
    let mut notes = app.notifier().subscribe();

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "usuario no existe" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = app.login("jperez", &password()).await.unwrap_err();

    assert_eq!(err.to_string(), INVALID_CREDENTIALS);
    assert!(!app.auth().is_authenticated());
    assert_eq!(app.auth().session_store().current().await.unwrap(), None);

    let note = notes.recv().await.unwrap();
    assert_eq!(note.severity, Severity::Error);
    assert_eq!(note.message, "Credenciales inválidas");
}

#[tokio::test]
async fn test_login_success_persists_session() {
    let (server, app) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "user": "jperez", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session(&["Usuario"])))
        .expect(1)
        .mount(&server)
        .await;

    let data = app.login("jperez", &password()).await.unwrap();
    let auth = app.auth();

    assert_eq!(data.token, "jwt-abc");
    assert!(auth.is_authenticated());
    assert_eq!(auth.username().as_deref(), Some("jperez"));
    assert_eq!(auth.roles(), Some(vec!["Usuario".to_owned()]));
    assert_eq!(auth.national_id().as_deref(), Some("11.111.111-1"));
    assert_eq!(auth.cost_centres(), vec!["cc1"]);
    assert!(auth.has_any_role(&["Usuario", "Administrador"]));
    assert!(auth.lacks_roles(&["Administrador"]));
    assert_eq!(auth.session_store().current().await.unwrap(), Some(data));
}

#[tokio::test]
async fn test_login_accepts_null_profile_lists() {
    let (server, app) = setup().await;

    let mut body = session(&["Usuario"]);
    body["user"]["cc"] = serde_json::Value::Null;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let data = app.login("jperez", &password()).await.unwrap();

    assert!(data.user.cost_centres.is_empty());
    assert!(app.auth().is_authenticated());
    assert!(app.auth().cost_centres().is_empty());
}

#[tokio::test]
async fn test_logout_clears_state_and_store() {
    let (server, app) = setup().await;
    mount_session(&server, session(&["Usuario"])).await;

    assert!(app.auth().restore(None).await);
    app.logout().await.unwrap();

    assert!(!app.auth().is_authenticated());
    assert!(app.auth().token().is_none());
    assert!(app.auth().lacks_roles(&["Usuario"]));
    assert_eq!(app.auth().session_store().current().await.unwrap(), None);
}

// ── Restore ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_restore_forwards_cookie() {
    let (server, app) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/session"))
        .and(header("cookie", "sid=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session(&["Administrador"])))
        .expect(1)
        .mount(&server)
        .await;

    assert!(app.auth().restore(Some("sid=abc")).await);
    assert_eq!(app.auth().user_id().as_deref(), Some("66a1"));
}

#[tokio::test]
async fn test_restore_failure_stays_anonymous() {
    let (server, app) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/session"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(!app.auth().restore(None).await);
    assert!(!app.auth().is_authenticated());
}

#[tokio::test]
async fn test_is_user_authenticated_reads_store() {
    let (_server, app) = setup().await;
    assert!(!app.auth().is_user_authenticated().await.unwrap());

    let data = serde_json::from_value(session(&["Usuario"])).unwrap();
    app.auth().session_store().overwrite(&data).await.unwrap();

    assert!(app.auth().is_user_authenticated().await.unwrap());
    assert!(app.auth().is_authenticated());
}

#[tokio::test]
async fn test_expired_stored_session_is_dropped() {
    let (_server, app) = setup().await;

    let mut body = session(&["Usuario"]);
    body["expire"] = json!("2020-01-01T00:00:00Z");
    let data = serde_json::from_value(body).unwrap();
    app.auth().session_store().overwrite(&data).await.unwrap();

    assert!(!app.auth().is_user_authenticated().await.unwrap());
    assert!(!app.auth().is_authenticated());
    assert!(app.auth().token().is_none());
}

#[tokio::test]
async fn test_restore_rejects_expired_session() {
    let (server, app) = setup().await;
    let mut body = session(&["Usuario"]);
    body["expire"] = json!("2020-01-01T00:00:00Z");
    mount_session(&server, body).await;

    assert!(!app.auth().restore(None).await);
    assert!(!app.auth().is_authenticated());
    assert_eq!(app.auth().session_store().current().await.unwrap(), None);
}

// ── Route guard ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthenticated_redirects_to_login() {
    let (server, app) = setup().await;
    mount_session(&server, json!({})).await;

    let nav = app.navigate("/productos").await.unwrap();
    assert_eq!(nav, Navigation::Redirect("/login".into()));
}

#[tokio::test]
async fn test_public_route_proceeds_without_session() {
    let (server, app) = setup().await;
    mount_session(&server, json!({})).await;

    assert_eq!(app.navigate("/login").await.unwrap(), Navigation::Proceed);
}

#[tokio::test]
async fn test_guard_restores_session_before_checking() {
    let (server, app) = setup().await;
    mount_session(&server, session(&["Usuario"])).await;

    assert_eq!(app.navigate("/solicitudes").await.unwrap(), Navigation::Proceed);
    assert!(app.auth().is_authenticated());
}

#[tokio::test]
async fn test_missing_role_redirects_to_home() {
    let (server, app) = setup().await;
    mount_session(&server, session(&["Usuario"])).await;
    let mut notes = app.notifier().subscribe();

    let nav = app.navigate("/admin").await.unwrap();

    assert_eq!(nav, Navigation::Redirect("/solicitudes".into()));
    assert!(app.auth().is_authenticated());
    assert_eq!(notes.recv().await.unwrap().severity, Severity::Info);
}

#[tokio::test]
async fn test_unknown_roles_log_out_and_redirect_to_login() {
    let (server, app) = setup().await;
    mount_session(&server, session(&["Invitado"])).await;

    let nav = app.navigate("/admin").await.unwrap();

    assert_eq!(nav, Navigation::Redirect("/login".into()));
    assert!(!app.auth().is_authenticated());
    assert_eq!(app.auth().session_store().current().await.unwrap(), None);
}

// ── Service base ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Product {
    name: String,
}

#[tokio::test]
async fn test_service_attaches_token() {
    let (server, app) = setup().await;
    mount_session(&server, session(&["Usuario"])).await;
    assert!(app.auth().restore(None).await);

    Mock::given(method("GET"))
        .and(path("/api-back/product/1"))
        .and(header("authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "silla" })))
        .expect(1)
        .mount(&server)
        .await;

    let product = app
        .service()
        .fetch::<Product>(RequestConfig::get("/product/1"), false)
        .await
        .unwrap();
    assert_eq!(product.name, "silla");
}

#[tokio::test]
async fn test_service_omits_token_on_request() {
    let (server, app) = setup().await;
    mount_session(&server, session(&["Usuario"])).await;
    assert!(app.auth().restore(None).await);

    Mock::given(method("GET"))
        .and(path("/api-back/public"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api-back/public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "abierto" })))
        .mount(&server)
        .await;

    let product = app
        .service()
        .fetch::<Product>(RequestConfig::get("/public"), true)
        .await
        .unwrap();
    assert_eq!(product.name, "abierto");
}

#[tokio::test]
async fn test_service_handle_error_classifies_api_errors() {
    let (server, app) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api-back/product/9"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "producto no encontrado" })),
        )
        .mount(&server)
        .await;

    let err = app
        .service()
        .fetch::<Product>(RequestConfig::get("/product/9"), false)
        .await
        .unwrap_err();
    let shape = app.service().handle_error(&err);

    assert!(!shape.success);
    assert_eq!(shape.status_code, 404);
    assert_eq!(shape.message, "Producto no encontrado");
}
