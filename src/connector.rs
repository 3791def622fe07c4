use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

use crate::constants::SERVER_SELECTION_TIMEOUT;
use crate::errors::Error;

/// The driver capabilities the manager depends on.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Client: Send + Sync + 'static;
    type Database: Send + Sync + 'static;

    /// Opens a client and proves it is usable. Called at most once per successful initialization.
    async fn connect(&self, uri: &str) -> Result<Self::Client, Error>;

    fn database(&self, client: &Self::Client, name: &str) -> Self::Database;

    async fn shutdown(&self, _client: Arc<Self::Client>) {}
}

#[derive(Debug, Clone)]
pub struct MongoConnector {
    server_selection_timeout: Duration,
}

impl Default for MongoConnector {
    fn default() -> Self {
        Self {
            server_selection_timeout: SERVER_SELECTION_TIMEOUT,
        }
    }
}

impl MongoConnector {
    pub fn with_server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = timeout;
        self
    }
}

#[async_trait]
impl Connector for MongoConnector {
    type Client = Client;
    type Database = Database;

    async fn connect(&self, uri: &str) -> Result<Client, Error> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| Error::connection_init(uri, e))?;
        options.server_selection_timeout = Some(self.server_selection_timeout);

        let client = Client::with_options(options).map_err(|e| Error::connection_init(uri, e))?;

        // the driver connects lazily; ping forces server selection
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| Error::connection_init(uri, e))?;

        Ok(client)
    }

    fn database(&self, client: &Client, name: &str) -> Database {
        client.database(name)
    }

    async fn shutdown(&self, client: Arc<Client>) {
        Arc::unwrap_or_clone(client).shutdown().await;
    }
}
