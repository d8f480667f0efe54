use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::result::{DbResult, StoreError};

/// Environment variable holding a full connection string. Takes precedence over `PG*`.
pub const DATABASE_URL_VAR: &str = "RELSTORE_DATABASE_URL";

/// Connection settings for [`crate::PgGateway`].
///
/// Missing fields fall back to the usual PostgreSQL defaults, so the struct can be
/// embedded in an application's own configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PgConfig {
    /// A `postgres://` URL or `key=value` connection string. Overrides the fields below.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub dbname: String,
    /// Seconds to wait for a connection before giving up.
    pub connect_timeout_secs: Option<u64>,
    pub application_name: Option<String>,
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_owned(),
            port: 5432,
            user: "postgres".to_owned(),
            password: None,
            dbname: "postgres".to_owned(),
            connect_timeout_secs: Some(10),
            application_name: Some("relstore".to_owned()),
        }
    }
}

impl PgConfig {
    /// Settings for database `dbname` on the default local server.
    pub fn new(dbname: &str) -> Self {
        Self {
            dbname: dbname.to_owned(),
            ..Self::default()
        }
    }

    /// Read settings from the environment.
    ///
    /// Uses [`DATABASE_URL_VAR`] when set, otherwise `PGHOST`, `PGPORT`, `PGUSER`,
    /// `PGPASSWORD` and `PGDATABASE` over the defaults.
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DbResult<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup(DATABASE_URL_VAR) {
            config.url = Some(url);
            return Ok(config);
        }

        if let Some(host) = lookup("PGHOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PGPORT") {
            config.port = port
                .parse()
                .map_err(|_| StoreError::Config(format!("PGPORT is not a port: {port}")))?;
        }
        if let Some(user) = lookup("PGUSER") {
            config.user = user;
        }
        if let Some(dbname) = lookup("PGDATABASE") {
            config.dbname = dbname;
        }
        config.password = lookup("PGPASSWORD");

        Ok(config)
    }

    /// Build the client configuration.
    pub fn to_postgres_config(&self) -> DbResult<postgres::Config> {
        let mut config = match &self.url {
            Some(url) => url
                .parse::<postgres::Config>()
                .map_err(|err| StoreError::Config(err.to_string()))?,
            None => {
                let mut config = postgres::Config::new();
                config
                    .host(&self.host)
                    .port(self.port)
                    .user(&self.user)
                    .dbname(&self.dbname);
                if let Some(password) = &self.password {
                    config.password(password);
                }
                config
            }
        };

        if let Some(seconds) = self.connect_timeout_secs {
            config.connect_timeout(Duration::from_secs(seconds));
        }
        if let Some(name) = &self.application_name {
            config.application_name(name);
        }

        Ok(config)
    }
}
