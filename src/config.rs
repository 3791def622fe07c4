//! Configuration resolution.
//!
//! Each field is resolved independently; later layers win:
//! hard-coded defaults, then environment, then file, then an explicit object.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Parser;
use serde::Deserialize;
use strum_macros::{Display, EnumString};

use crate::constants::{
    DB_NAME_FORBIDDEN_CHARS, DEFAULT_DB_NAME, DEFAULT_MONGO_URI, DISCOVERY_FILE_NAMES,
    ENV_MONGO_DBNAME, ENV_MONGO_URI, INI_SECTION, MAX_DB_NAME_BYTES, MONGO_URI_SCHEMES,
};
use crate::errors::{Error, ParseError};
use crate::utils::uri::redact_uri;

/// Resolved connection parameters. Always valid once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    uri: String,
    default_db_name: String,
}

impl Configuration {
    pub fn new(uri: impl Into<String>, default_db_name: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            uri: uri.into(),
            default_db_name: default_db_name.into(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn default_db_name(&self) -> &str {
        &self.default_db_name
    }

    /// Returns a copy with every set, non-empty field of `partial` applied.
    pub fn update(&self, partial: &PartialConfig) -> Result<Self, Error> {
        let mut next = self.clone();
        next.overlay(partial);
        next.validate()?;
        Ok(next)
    }

    fn overlay(&mut self, partial: &PartialConfig) {
        if let Some(uri) = non_empty(&partial.uri) {
            self.uri = uri.to_string();
        }
        if let Some(db_name) = non_empty(&partial.db_name) {
            self.default_db_name = db_name.to_string();
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if !MONGO_URI_SCHEMES
            .iter()
            .any(|scheme| self.uri.starts_with(scheme))
        {
            return Err(Error::invalid_config(&format!(
                "{ENV_MONGO_URI} must start with one of {MONGO_URI_SCHEMES:?}, got {:?}",
                redact_uri(&self.uri)
            )));
        }

        validate_db_name(&self.default_db_name).map_err(|_| {
            Error::invalid_config(&format!(
                "{ENV_MONGO_DBNAME} {:?} is not a valid database name",
                self.default_db_name
            ))
        })
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            uri: DEFAULT_MONGO_URI.to_string(),
            default_db_name: DEFAULT_DB_NAME.to_string(),
        }
    }
}

/// Checks a database name against MongoDB's naming restrictions.
pub fn validate_db_name(name: &str) -> Result<(), Error> {
    if name.is_empty()
        || name.len() > MAX_DB_NAME_BYTES
        || name.contains(DB_NAME_FORBIDDEN_CHARS)
    {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// One layer of configuration input, as found in a config file or built by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PartialConfig {
    #[serde(rename = "MONGO_URI", default)]
    pub uri: Option<String>,

    #[serde(rename = "MONGO_DBNAME", default)]
    pub db_name: Option<String>,
}

impl PartialConfig {
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[clap(no_binary_name = true)]
pub struct EnvOverrides {
    #[clap(long, env = ENV_MONGO_URI)]
    pub mongo_uri: Option<String>,

    #[clap(long, env = ENV_MONGO_DBNAME)]
    pub mongo_dbname: Option<String>,
}

impl EnvOverrides {
    pub fn from_process_env() -> Result<Self, Error> {
        Ok(Self::try_parse_from(std::iter::empty::<String>())?)
    }

    fn as_partial(&self) -> PartialConfig {
        PartialConfig {
            uri: self.mongo_uri.clone(),
            db_name: self.mongo_dbname.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum ConfigFormat {
    #[default]
    #[strum(to_string = "json")]
    Json,
    #[strum(to_string = "yaml", serialize = "yml")]
    Yaml,
    #[strum(to_string = "ini")]
    Ini,
}

impl ConfigFormat {
    /// Anything that is not `.yaml`/`.yml`/`.ini` is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(|extension| ConfigFormat::from_str(extension).ok())
            .unwrap_or_default()
    }
}

/// Loads one config file. A missing file is `Ok(None)`, a malformed one is an error.
pub fn load_config_file(path: &Path) -> Result<Option<PartialConfig>, Error> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("Config file {} not found, skipping", path.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(Error::ConfigRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let format = ConfigFormat::from_path(path);
    let parsed: Result<PartialConfig, ParseError> = match format {
        ConfigFormat::Json => serde_json::from_str(&contents).map_err(ParseError::from),
        ConfigFormat::Yaml => serde_yaml::from_str(&contents).map_err(ParseError::from),
        ConfigFormat::Ini => parse_ini(&contents),
    };

    match parsed {
        Ok(partial) => {
            tracing::debug!("Loaded {format} config from {}", path.display());
            Ok(Some(partial))
        }
        Err(source) => Err(Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reads the keys from the `[MongoDB]` section. A missing section or key is left unset.
fn parse_ini(contents: &str) -> Result<PartialConfig, ParseError> {
    let ini = ini::Ini::load_from_str(contents)?;
    let Some(section) = ini.section(Some(INI_SECTION)) else {
        tracing::debug!("No [{INI_SECTION}] section in INI config");
        return Ok(PartialConfig::default());
    };

    // configparser-style files often lowercase their keys
    let get = |key: &str| {
        section
            .get(key)
            .or_else(|| section.get(key.to_lowercase()))
            .map(str::to_string)
    };

    Ok(PartialConfig {
        uri: get(ENV_MONGO_URI),
        db_name: get(ENV_MONGO_DBNAME),
    })
}

#[derive(Debug, Clone)]
enum DotenvSource {
    /// `.env` in the current directory or one of its parents.
    Discover,
    Path(PathBuf),
}

#[derive(Debug, Clone)]
enum EnvLayer {
    Process,
    Fixed(EnvOverrides),
    Disabled,
}

#[derive(Debug, Clone)]
enum FileLayer {
    /// `None` means the current working directory at resolution time.
    Discover(Option<PathBuf>),
    Path(PathBuf),
    Disabled,
}

#[derive(Debug, Clone)]
pub struct ConfigResolver {
    explicit: Option<PartialConfig>,
    file: FileLayer,
    env: EnvLayer,
    dotenv: Option<DotenvSource>,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self {
            explicit: None,
            file: FileLayer::Discover(None),
            env: EnvLayer::Process,
            dotenv: None,
        }
    }

    /// Environment and defaults only; never touches the filesystem.
    pub fn from_env() -> Self {
        Self::new().without_discovery()
    }

    pub fn explicit(mut self, partial: PartialConfig) -> Self {
        self.explicit = Some(partial);
        self
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = FileLayer::Path(path.into());
        self
    }

    pub fn discover_in(mut self, dir: impl Into<PathBuf>) -> Self {
        self.file = FileLayer::Discover(Some(dir.into()));
        self
    }

    pub fn without_discovery(mut self) -> Self {
        self.file = FileLayer::Disabled;
        self
    }

    pub fn env(mut self, overrides: EnvOverrides) -> Self {
        self.env = EnvLayer::Fixed(overrides);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.env = EnvLayer::Disabled;
        self
    }

    pub fn with_dotenv(mut self) -> Self {
        self.dotenv = Some(DotenvSource::Discover);
        self
    }

    pub fn with_dotenv_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.dotenv = Some(DotenvSource::Path(path.into()));
        self
    }

    pub fn resolve(&self) -> Result<Configuration, Error> {
        let mut config = Configuration::default();

        if let Some(overrides) = self.env_overrides()? {
            config.overlay(&overrides.as_partial());
        }

        if let Some(path) = self.locate_file() {
            if let Some(partial) = load_config_file(&path)? {
                config.overlay(&partial);
            }
        }

        if let Some(explicit) = &self.explicit {
            config.overlay(explicit);
        }

        config.validate()?;
        tracing::debug!(
            "Resolved configuration: uri={}, default_db_name={}",
            redact_uri(&config.uri),
            config.default_db_name
        );
        Ok(config)
    }

    fn env_overrides(&self) -> Result<Option<EnvOverrides>, Error> {
        match &self.env {
            EnvLayer::Process => {
                self.load_dotenv()?;
                EnvOverrides::from_process_env().map(Some)
            }
            EnvLayer::Fixed(overrides) => Ok(Some(overrides.clone())),
            EnvLayer::Disabled => Ok(None),
        }
    }

    /// Variables already set in the process are never overwritten.
    fn load_dotenv(&self) -> Result<(), Error> {
        let loaded = match &self.dotenv {
            None => return Ok(()),
            Some(DotenvSource::Discover) => dotenvy::dotenv(),
            Some(DotenvSource::Path(path)) => dotenvy::from_path(path).map(|()| path.clone()),
        };

        match loaded {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => tracing::debug!("No .env file found, skipping"),
            Err(e) => return Err(Error::Dotenv(e)),
        }
        Ok(())
    }

    fn locate_file(&self) -> Option<PathBuf> {
        match &self.file {
            FileLayer::Path(path) => Some(path.clone()),
            FileLayer::Discover(dir) => {
                let dir = match dir {
                    Some(dir) => dir.clone(),
                    None => std::env::current_dir().ok()?,
                };
                let found = DISCOVERY_FILE_NAMES
                    .iter()
                    .map(|name| dir.join(name))
                    .find(|candidate| candidate.is_file());
                if found.is_none() {
                    tracing::debug!("No config file discovered in {}", dir.display());
                }
                found
            }
            FileLayer::Disabled => None,
        }
    }
}
