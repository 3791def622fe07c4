//! Process-wide MongoDB connection manager.
//!
//! One client per manager, opened lazily, and one cached handle per database name.
//! Initialization uses double-checked locking: a read of the session slot is the
//! fast path, `init_lock` serializes the network call, and the slot is re-checked
//! under it. The session lock is never held across I/O, and an old client is shut
//! down only after `init_lock` is released.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tokio::sync::{Mutex, RwLock};

use crate::config::{ConfigResolver, Configuration, validate_db_name};
use crate::connector::{Connector, MongoConnector};
use crate::constants::MAX_SESSION_ATTEMPTS;
use crate::errors::Error;
use crate::utils::uri::redact_uri;

pub type DbHandle<C = MongoConnector> = Arc<<C as Connector>::Database>;

static INSTANCE: OnceCell<DatabaseManager> = OnceCell::new();

struct Session<C: Connector> {
    client: Arc<C::Client>,
    default_db_name: String,
    databases: HashMap<String, DbHandle<C>>,
}

pub struct DatabaseManager<C: Connector = MongoConnector> {
    connector: C,
    config: RwLock<Option<Configuration>>,
    init_lock: Mutex<()>,
    session: RwLock<Option<Session<C>>>,
}

impl DatabaseManager<MongoConnector> {
    /// The process-wide manager. Creating it does not connect.
    pub fn instance() -> &'static Self {
        INSTANCE.get_or_init(|| {
            tracing::info!("Creating DatabaseManager instance");
            Self::unconfigured(MongoConnector::default())
        })
    }

    /// Like [`Self::instance`]; `config` is only used if this call creates the instance.
    pub fn instance_with(config: Configuration) -> &'static Self {
        let mut created = false;
        let instance = INSTANCE.get_or_init(|| {
            created = true;
            tracing::info!("Creating DatabaseManager instance");
            Self::new(config, MongoConnector::default())
        });
        if !created {
            tracing::warn!("DatabaseManager instance already created. Returning existing instance.");
        }
        instance
    }
}

impl<C: Connector> DatabaseManager<C> {
    pub fn new(config: Configuration, connector: C) -> Self {
        Self {
            connector,
            config: RwLock::new(Some(config)),
            init_lock: Mutex::new(()),
            session: RwLock::new(None),
        }
    }

    /// A manager that resolves its configuration from the environment on first use.
    pub fn unconfigured(connector: C) -> Self {
        Self {
            connector,
            config: RwLock::new(None),
            init_lock: Mutex::new(()),
            session: RwLock::new(None),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub async fn is_initialized(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub async fn configuration(&self) -> Option<Configuration> {
        self.config.read().await.clone()
    }

    /// Opens the client unless one is already open. Failures are not cached.
    pub async fn ensure_initialized(&self, config: &Configuration) -> Result<(), Error> {
        if self.is_initialized().await {
            return Ok(());
        }

        let _guard = self.init_lock.lock().await;
        if self.is_initialized().await {
            tracing::debug!("MongoDB client initialized by a concurrent caller");
            return Ok(());
        }

        let session = self.open_session(config).await?;
        *self.config.write().await = Some(config.clone());
        *self.session.write().await = Some(session);
        Ok(())
    }

    /// Returns the shared handle for `name`, or for the configured default database.
    pub async fn get_db(&self, name: Option<&str>) -> Result<DbHandle<C>, Error> {
        if let Some(name) = name {
            validate_db_name(name)?;
        }

        for _ in 0..MAX_SESSION_ATTEMPTS {
            if !self.is_initialized().await {
                let config = self.config_or_resolve().await?;
                self.ensure_initialized(&config).await?;
            }

            if let Some(db) = self.cached_db(name).await {
                return Ok(db);
            }
            tracing::debug!("MongoDB client closed concurrently, re-initializing");
        }
        Err(Error::NotInitialized)
    }

    /// `None` only when no session is open.
    async fn cached_db(&self, name: Option<&str>) -> Option<DbHandle<C>> {
        {
            let session = self.session.read().await;
            let session = session.as_ref()?;
            let name = name.unwrap_or(session.default_db_name.as_str());
            if let Some(db) = session.databases.get(name) {
                tracing::debug!("Using cached database handle for: {name}");
                return Some(Arc::clone(db));
            }
        }

        let mut session = self.session.write().await;
        let Session {
            client,
            default_db_name,
            databases,
        } = session.as_mut()?;
        let name = name.unwrap_or(default_db_name.as_str()).to_string();

        let db = databases.entry(name).or_insert_with_key(|name| {
            tracing::info!("Switching to database: {name}");
            Arc::new(self.connector.database(&**client, name))
        });
        Some(Arc::clone(db))
    }

    /// Opens a client for `config` and swaps it in with an empty handle cache.
    /// On failure the current client, cache and configuration are kept.
    pub async fn reconfigure(&self, config: Configuration) -> Result<(), Error> {
        let previous = {
            let _guard = self.init_lock.lock().await;

            let session = self.open_session(&config).await?;
            let previous = self.session.write().await.replace(session);
            *self.config.write().await = Some(config);
            previous
        };

        if let Some(previous) = previous {
            tracing::info!(
                "Replaced MongoDB client, dropped {} cached database handle(s)",
                previous.databases.len()
            );
            self.connector.shutdown(previous.client).await;
        }
        Ok(())
    }

    /// Shuts the client down and clears the cache. A later `get_db` reconnects.
    pub async fn close(&self) {
        let taken = {
            let _guard = self.init_lock.lock().await;
            self.session.write().await.take()
        };

        let Some(session) = taken else {
            tracing::warn!("Attempted to close a non-existent MongoDB connection.");
            return;
        };
        self.connector.shutdown(session.client).await;
        tracing::info!("MongoDB connection closed.");
    }

    async fn config_or_resolve(&self) -> Result<Configuration, Error> {
        if let Some(config) = self.config.read().await.clone() {
            return Ok(config);
        }
        tracing::debug!("No configuration supplied, resolving from environment");
        ConfigResolver::from_env().resolve()
    }

    async fn open_session(&self, config: &Configuration) -> Result<Session<C>, Error> {
        let uri = redact_uri(config.uri());
        tracing::info!("Initializing MongoDB client for {uri}");

        match self.connector.connect(config.uri()).await {
            Ok(client) => {
                tracing::info!("Connected to MongoDB at URI: {uri}");
                Ok(Session {
                    client: Arc::new(client),
                    default_db_name: config.default_db_name().to_string(),
                    databases: HashMap::new(),
                })
            }
            Err(e) => {
                tracing::error!("MongoDB connection error: {e}");
                Err(e)
            }
        }
    }
}

/// The default database of the process-wide manager, configured from the environment.
pub async fn legacy_get_db() -> Result<DbHandle, Error> {
    DatabaseManager::instance().get_db(None).await
}
