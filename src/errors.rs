use std::path::PathBuf;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to parse config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("Invalid environment overrides: {0}")]
    EnvOverrides(#[from] clap::Error),

    #[error("Failed to connect to MongoDB at {uri}: {source}")]
    ConnectionInit {
        uri: String,
        #[source]
        source: BoxError,
    },

    #[error("Invalid database name {0:?}")]
    InvalidName(String),

    #[error("Database manager is not initialized")]
    NotInitialized,
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Ini(#[from] ini::ParseError),
}

impl Error {
    pub fn invalid_config(message: &str) -> Self {
        Error::InvalidConfig(message.to_string())
    }

    pub fn connection_init<E>(uri: &str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::ConnectionInit {
            uri: crate::utils::uri::redact_uri(uri),
            source: source.into(),
        }
    }

    pub fn is_connection_init(&self) -> bool {
        matches!(self, Error::ConnectionInit { .. })
    }

    pub fn is_config_parse(&self) -> bool {
        matches!(self, Error::ConfigParse { .. })
    }
}
