//! SQL connection setup.
//!
//! [`SqlOptions`] holds the connection settings and renders them as a driver specific URL,
//! [`Database::connect`] opens a pool over that URL and checks it with a ping.

use crate::config::DatabaseSection;
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyPool, Connection};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum SqlError {
    #[error("unknown database driver: {name}")]
    UnknownDriver { name: String },

    #[error("unable to connect to {driver} database: {source}")]
    Connect {
        driver: Driver,
        #[source]
        source: sqlx::Error,
    },

    #[error("database did not answer ping: {source}")]
    Ping {
        #[source]
        source: sqlx::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Driver {
    #[default]
    MySql,
    Postgres,
    Sqlite,
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Driver::MySql => "mysql",
            Driver::Postgres => "postgres",
            Driver::Sqlite => "sqlite3",
        })
    }
}

impl FromStr for Driver {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Driver::MySql),
            "postgres" | "postgresql" | "pgsql" => Ok(Driver::Postgres),
            "sqlite3" | "sqlite" => Ok(Driver::Sqlite),
            _ => Err(SqlError::UnknownDriver { name: s.to_owned() }),
        }
    }
}

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Clone)]
pub struct SqlOptions {
    username: String,
    password: String,
    name: String,
    host: String,
    port: String,
    options: String,
    driver: Driver,
    max_connections: u32,
}

impl Default for SqlOptions {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            name: String::new(),
            host: String::new(),
            port: String::new(),
            options: String::new(),
            driver: Driver::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl SqlOptions {
    /// Starts from empty settings, the MySQL driver and a pool of 10 connections.
    pub fn builder() -> SqlOptionsBuilder {
        SqlOptionsBuilder { options: SqlOptions::default() }
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    /// The connection URL. Credentials are inserted verbatim, they must already be URL safe.
    pub fn dsn(&self) -> String {
        let Self { username, password, name, host, port, options, .. } = self;
        match self.driver {
            Driver::Postgres => format!("postgres://{username}:{password}@{host}:{port}/{name}{options}"),
            Driver::MySql => format!("mysql://{username}:{password}@{host}:{port}/{name}{options}"),
            Driver::Sqlite => format!("sqlite:{name}{options}"),
        }
    }
}

impl fmt::Debug for SqlOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlOptions")
            .field("username", &self.username)
            .field("password", &"***")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("options", &self.options)
            .field("driver", &self.driver)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SqlOptionsBuilder {
    options: SqlOptions,
}

impl SqlOptionsBuilder {
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.options.username = username.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.options.password = password.into();
        self
    }

    /// Database name, or the file path for SQLite.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.options.name = name.into();
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.options.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.options.port = port.into();
        self
    }

    /// Appended to the URL as is, e.g. `?sslmode=disable`.
    #[must_use]
    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.options.options = options.into();
        self
    }

    #[must_use]
    pub fn driver(mut self, driver: Driver) -> Self {
        self.options.driver = driver;
        self
    }

    #[must_use]
    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.options.max_connections = max_connections;
        self
    }

    pub fn build(self) -> SqlOptions {
        self.options
    }
}

impl TryFrom<&DatabaseSection> for SqlOptions {
    type Error = SqlError;

    fn try_from(section: &DatabaseSection) -> Result<Self, Self::Error> {
        let driver = match &section.driver {
            Some(name) => name.parse()?,
            None => Driver::default(),
        };

        Ok(SqlOptions::builder()
            .driver(driver)
            .name(&section.dbname)
            .username(&section.dbuser)
            .password(&section.dbpass)
            .host(&section.dbhost)
            .port(&section.dbport)
            .options(&section.options)
            .build())
    }
}

/// An open connection pool together with the settings it was opened with.
#[derive(Debug, Clone)]
pub struct Database {
    pool: AnyPool,
    info: SqlOptions,
}

impl Database {
    /// Opens a pool for `options` and pings it once, so a returned `Database` is known to answer.
    pub async fn connect(options: SqlOptions) -> Result<Self, SqlError> {
        sqlx::any::install_default_drivers();

        let driver = options.driver;
        let pool = AnyPoolOptions::new()
            .max_connections(options.max_connections)
            .connect(&options.dsn())
            .await
            .map_err(|source| SqlError::Connect { driver, source })?;

        let database = Self { pool, info: options };
        database.ping().await?;

        info!(%driver, host = %database.info.host, name = %database.info.name, "database connected");
        Ok(database)
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn info(&self) -> &SqlOptions {
        &self.info
    }

    /// Acquires a pooled connection and round trips a ping over it.
    pub async fn ping(&self) -> Result<(), SqlError> {
        let mut connection = self.pool.acquire().await.map_err(|source| SqlError::Ping { source })?;
        connection.ping().await.map_err(|source| SqlError::Ping { source })?;
        debug!(driver = %self.info.driver, "database ping ok");
        Ok(())
    }
}
