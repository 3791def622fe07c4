#![allow(dead_code)]

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use mongo_db_manager::{Connector, Error};

/// In-memory driver: counts calls, fails for hosts named `unreachable`.
#[derive(Debug, Default)]
pub struct FakeConnector {
    connect_delay: Duration,
    hang_on_shutdown: bool,
    connects: AtomicUsize,
    databases: AtomicUsize,
    shutdowns: AtomicUsize,
}

#[derive(Debug)]
pub struct FakeClient {
    pub id: usize,
    pub uri: String,
}

#[derive(Debug)]
pub struct FakeDatabase {
    pub client_id: usize,
    pub uri: String,
    pub name: String,
}

impl FakeConnector {
    pub fn with_connect_delay(delay: Duration) -> Self {
        Self {
            connect_delay: delay,
            ..Self::default()
        }
    }

    /// `shutdown` never completes, like a driver waiting on a cursor nobody drops.
    pub fn with_hanging_shutdown() -> Self {
        Self {
            hang_on_shutdown: true,
            ..Self::default()
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn databases(&self) -> usize {
        self.databases.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Client = FakeClient;
    type Database = FakeDatabase;

    async fn connect(&self, uri: &str) -> Result<FakeClient, Error> {
        let id = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }

        if uri.contains("unreachable") {
            return Err(Error::connection_init(
                uri,
                io::Error::new(io::ErrorKind::ConnectionRefused, "server selection timed out"),
            ));
        }

        Ok(FakeClient {
            id,
            uri: uri.to_string(),
        })
    }

    fn database(&self, client: &FakeClient, name: &str) -> FakeDatabase {
        self.databases.fetch_add(1, Ordering::SeqCst);
        FakeDatabase {
            client_id: client.id,
            uri: client.uri.clone(),
            name: name.to_string(),
        }
    }

    async fn shutdown(&self, _client: Arc<FakeClient>) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        if self.hang_on_shutdown {
            std::future::pending::<()>().await;
        }
    }
}
