use std::time::Duration;

pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DB_NAME: &str = "testdb";

pub const ENV_MONGO_URI: &str = "MONGO_URI";
pub const ENV_MONGO_DBNAME: &str = "MONGO_DBNAME";

/// Files looked up, in order, when discovering configuration in a directory.
pub const DISCOVERY_FILE_NAMES: [&str; 4] =
    ["config.json", "config.yaml", "config.yml", "config.ini"];

pub const INI_SECTION: &str = "MongoDB";

/// Attempts `get_db` makes when a concurrent `close` removes the session under it.
pub const MAX_SESSION_ATTEMPTS: usize = 3;

pub const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(5);

pub const MONGO_URI_SCHEMES: [&str; 2] = ["mongodb://", "mongodb+srv://"];

// MongoDB rejects database names of 64 bytes or more.
pub const MAX_DB_NAME_BYTES: usize = 63;
pub const DB_NAME_FORBIDDEN_CHARS: [char; 13] = [
    '/', '\\', '.', '"', '$', '*', '<', '>', ':', '|', '?', ' ', '\0',
];
