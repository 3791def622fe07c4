pub mod config;
pub mod connector;
pub mod constants;
pub mod database;
pub mod errors;

pub mod utils {
    pub mod tracing;
    pub mod uri;
}

pub use config::{ConfigResolver, Configuration, EnvOverrides, PartialConfig};
pub use connector::{Connector, MongoConnector};
pub use database::{DatabaseManager, DbHandle, legacy_get_db};
pub use errors::Error;
