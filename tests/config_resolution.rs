use std::fs;

use mongo_db_manager::config::load_config_file;
use mongo_db_manager::{ConfigResolver, Configuration, EnvOverrides, PartialConfig};
use tempfile::TempDir;

fn env(uri: Option<&str>, db_name: Option<&str>) -> EnvOverrides {
    EnvOverrides {
        mongo_uri: uri.map(str::to_string),
        mongo_dbname: db_name.map(str::to_string),
    }
}

#[test]
fn test_nothing_configured_yields_localhost_testdb() {
    let temp = TempDir::new().unwrap();

    let config = ConfigResolver::new()
        .discover_in(temp.path())
        .env(env(None, None))
        .resolve()
        .unwrap();

    assert_eq!(config.uri(), "mongodb://localhost:27017");
    assert_eq!(config.default_db_name(), "testdb");
}

#[test]
fn test_precedence_is_explicit_then_file_then_env() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("config.json"),
        r#"{"MONGO_URI": "mongodb://file:27017", "MONGO_DBNAME": "filedb"}"#,
    )
    .unwrap();

    let env_only = ConfigResolver::new()
        .without_discovery()
        .env(env(Some("mongodb://env:27017"), Some("envdb")))
        .resolve()
        .unwrap();
    assert_eq!(env_only, Configuration::new("mongodb://env:27017", "envdb").unwrap());

    let file_and_env = ConfigResolver::new()
        .discover_in(temp.path())
        .env(env(Some("mongodb://env:27017"), Some("envdb")))
        .resolve()
        .unwrap();
    assert_eq!(file_and_env, Configuration::new("mongodb://file:27017", "filedb").unwrap());

    let all = ConfigResolver::new()
        .discover_in(temp.path())
        .env(env(Some("mongodb://env:27017"), Some("envdb")))
        .explicit(PartialConfig::default().with_db_name("shop"))
        .resolve()
        .unwrap();
    assert_eq!(all, Configuration::new("mongodb://file:27017", "shop").unwrap());
}

#[test]
fn test_invalid_json_does_not_fall_back_to_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("mongo.json");
    fs::write(&path, "MONGO_URI=mongodb://db1").unwrap();

    let err = ConfigResolver::new()
        .file(&path)
        .without_env()
        .resolve()
        .unwrap_err();
    assert!(err.is_config_parse(), "unexpected error: {err:?}");
    assert!(err.to_string().contains("mongo.json"));

    assert!(load_config_file(&path).is_err());
    assert_eq!(load_config_file(&temp.path().join("missing.json")).unwrap(), None);
}
