//! File-based module configuration.
//!
//! Every section is optional; a module asks for its own section when it is built from config.
//!
//! ```toml
//! [database]
//! driver = "postgres"
//! dbname = "site"
//! dbuser = "site"
//! dbpass = "secret"
//! dbhost = "localhost"
//! dbport = 5432
//!
//! [statics]
//! directory = "./public"
//! defaults = true
//!
//! [cookie]
//! generate = true
//!
//! [trailslash]
//! trail = false
//! ```

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config has no [{0}] section")]
    MissingSection(&'static str),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModulesConfig {
    database: Option<DatabaseSection>,
    statics: Option<StaticsSection>,
    cookie: Option<CookieSection>,
    trailslash: Option<TrailslashSection>,
}

impl ModulesConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        content.parse()
    }

    pub fn database(&self) -> Result<&DatabaseSection, ConfigError> {
        self.database.as_ref().ok_or(ConfigError::MissingSection("database"))
    }

    pub fn statics(&self) -> Result<&StaticsSection, ConfigError> {
        self.statics.as_ref().ok_or(ConfigError::MissingSection("statics"))
    }

    pub fn cookie(&self) -> Result<&CookieSection, ConfigError> {
        self.cookie.as_ref().ok_or(ConfigError::MissingSection("cookie"))
    }

    /// Without a `[trailslash]` section slashes are stripped.
    pub fn trailslash(&self) -> TrailslashSection {
        self.trailslash.unwrap_or_default()
    }
}

impl FromStr for ModulesConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

#[derive(Clone, Deserialize)]
pub struct DatabaseSection {
    #[serde(default)]
    pub driver: Option<String>,
    pub dbname: String,
    pub dbuser: String,
    pub dbpass: String,
    pub dbhost: String,
    #[serde(deserialize_with = "string_or_number")]
    pub dbport: String,
    #[serde(default)]
    pub options: String,
}

impl fmt::Debug for DatabaseSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSection")
            .field("driver", &self.driver)
            .field("dbname", &self.dbname)
            .field("dbuser", &self.dbuser)
            .field("dbpass", &"***")
            .field("dbhost", &self.dbhost)
            .field("dbport", &self.dbport)
            .field("options", &self.options)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticsSection {
    pub directory: PathBuf,
    #[serde(default)]
    pub defaults: bool,
    #[serde(default)]
    pub favicons: bool,
    #[serde(default)]
    pub items: Vec<String>,
}

#[derive(Clone, Default, Deserialize)]
pub struct CookieSection {
    pub hash: Option<String>,
    pub block: Option<String>,
    #[serde(default)]
    pub generate: bool,
}

impl fmt::Debug for CookieSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieSection")
            .field("hash", &self.hash.as_ref().map(|_| "***"))
            .field("block", &self.block.as_ref().map(|_| "***"))
            .field("generate", &self.generate)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TrailslashSection {
    #[serde(default)]
    pub trail: bool,
}

/// Ports are strings in the DSN, but `dbport = 5432` is the natural way to write them.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u16),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Text(text) => text,
        Port::Number(number) => number.to_string(),
    })
}
