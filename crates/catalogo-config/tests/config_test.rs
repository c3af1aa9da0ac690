#![allow(clippy::unwrap_used)]
// Loading configuration files from disk.

use std::time::Duration;

use pretty_assertions::assert_eq;

use catalogo_config::{Config, load_config, save_config};
use catalogo_core::{SessionStore, UserType};

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(Some(&dir.path().join("absent.toml"))).unwrap();

    assert_eq!(config.timeout, 30);
    assert_eq!(config.routes, Config::default().routes);
}

#[test]
fn test_toml_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
back_base_url = "https://api.catalogo.test/api-back/"
app_base_url = "https://catalogo.test"
timeout = 5

[session]
expiry_in_seconds = 60
path = "/tmp/catalogo-session.json"

[[routes]]
path = "/login"
auth = false

[[routes]]
path = "/reportes"
user_type = ["Admin"]
"#,
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();
    let client = config.client_config().unwrap();

    assert_eq!(
        client.back_base_url.unwrap().as_str(),
        "https://api.catalogo.test/api-back/"
    );
    assert_eq!(client.timeout, Duration::from_secs(5));
    assert_eq!(config.session.expiry_in_seconds, 60);
    assert_eq!(config.routes.len(), 2);

    let table = config.route_table();
    assert_eq!(table.meta("/reportes").user_type, vec![UserType::Admin]);
    assert!(!table.meta("/login").requires_auth());
    // Routes from the file replace the defaults.
    assert!(table.meta("/solicitudes").user_type.is_empty());
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/config.toml");
    let config = Config {
        back_base_url: Some("https://api.catalogo.test/".into()),
        username: Some("jperez".into()),
        ..Config::default()
    };

    save_config(&config, &path).unwrap();
    let loaded = load_config(Some(&path)).unwrap();

    assert_eq!(loaded.back_base_url, config.back_base_url);
    assert_eq!(loaded.username.as_deref(), Some("jperez"));
    assert_eq!(loaded.routes, config.routes);
}

#[tokio::test]
async fn test_session_store_uses_configured_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.session.path = Some(dir.path().join("session.json"));

    let store = config.session_store();
    assert_eq!(store.path(), dir.path().join("session.json"));
    assert_eq!(store.current().await.unwrap(), None);
}
