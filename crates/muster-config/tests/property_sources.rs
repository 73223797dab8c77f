//! Loads properties from disk and layers them beneath the environment.

use std::fs;

use camino::Utf8PathBuf;
use muster_config::{EnvProperties, LayeredProperties, PropertyError, PropertyFile, PropertyProvider};
use tempfile::TempDir;

fn write_properties(dir: &TempDir, text: &str) -> Utf8PathBuf {
    let path = Utf8PathBuf::from_path_buf(dir.path().join("service.properties"))
        .expect("temp path is UTF-8");
    fs::write(&path, text).expect("write properties file");
    path
}

#[test]
fn loads_properties_file_from_disk() {
    let dir = TempDir::new().expect("create temp dir");
    let path = write_properties(
        &dir,
        "server.port=8080\nserver.context_path=/template\norders.db.url=jdbc:h2:mem:orders\n",
    );

    let file = PropertyFile::load(&path).expect("load properties");

    assert_eq!(file.path(), path.as_path());
    assert_eq!(file.get("server.port").as_deref(), Some("8080"));
    assert_eq!(
        file.get("orders.db.url").as_deref(),
        Some("jdbc:h2:mem:orders")
    );
}

#[test]
fn missing_file_reports_path() {
    let dir = TempDir::new().expect("create temp dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("absent.properties"))
        .expect("temp path is UTF-8");

    let error = PropertyFile::load(&path).expect_err("file is absent");

    assert!(matches!(error, PropertyError::Io { .. }));
    assert!(error.to_string().contains("absent.properties"));
}

#[test]
fn environment_overrides_file() {
    let dir = TempDir::new().expect("create temp dir");
    let path = write_properties(&dir, "server.port=8080\nserver.context_path=/template\n");
    let file = PropertyFile::load(&path).expect("load properties");
    let env = EnvProperties::from_vars("muster", [("MUSTER_SERVER_PORT", "9090")]);

    let properties = LayeredProperties::new().layer(env).layer(file);

    assert_eq!(properties.get("server.port").as_deref(), Some("9090"));
    assert_eq!(
        properties.get("server.context_path").as_deref(),
        Some("/template")
    );
    properties
        .fail_if_not_present(&["server.port", "server.context_path"])
        .expect("server settings present");
}
