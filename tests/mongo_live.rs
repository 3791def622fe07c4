//! Needs a running MongoDB (`MONGO_URI`, default `mongodb://localhost:27017`).
//! Run with `cargo test --test mongo_live -- --ignored`.
//!
//! `DatabaseManager::instance()` and `legacy_get_db()` are bound to `MongoConnector`,
//! so they are only exercised here. The manager logic behind them is covered
//! without a server in `tests/manager.rs` through `FakeConnector`.

use std::sync::Arc;
use std::time::Duration;

use mongo_db_manager::{
    ConfigResolver, Configuration, DatabaseManager, MongoConnector, legacy_get_db,
};

#[tokio::test]
#[ignore]
async fn test_legacy_get_db_returns_default_database() {
    let expected = ConfigResolver::from_env().resolve().unwrap();

    let db = legacy_get_db().await.unwrap();
    assert_eq!(db.name(), expected.default_db_name());

    let again = DatabaseManager::instance().get_db(None).await.unwrap();
    assert!(Arc::ptr_eq(&db, &again));

    let collections = db.list_collection_names().await.unwrap();
    assert!(collections.iter().all(|name| !name.is_empty()));
}

#[tokio::test]
#[ignore]
async fn test_unreachable_server_fails_fast() {
    let connector = MongoConnector::default().with_server_selection_timeout(Duration::from_millis(200));
    let config = Configuration::new("mongodb://127.0.0.1:1", "shop").unwrap();
    let manager = DatabaseManager::new(config, connector);

    let err = manager.get_db(None).await.unwrap_err();
    assert!(err.is_connection_init(), "unexpected error: {err:?}");
    assert!(!manager.is_initialized().await);
}
