// src/config.rs

use std::{env, fmt, net::SocketAddr, path::PathBuf};

use dotenvy::dotenv;

/// Name of the cookie carrying the JWT for browser sessions.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Where unauthenticated requests are sent.
pub const LOGIN_PATH: &str = "/accounts/login/";

const DEFAULT_JWT_EXPIRATION: u64 = 86_400;
const DEFAULT_APP_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without it the in-memory store is used.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub app_addr: SocketAddr,
    /// JSON catalog loaded into an empty store at startup.
    pub quiz_fixture: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has invalid value '{}'", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiration = match lookup("JWT_EXPIRATION") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                key: "JWT_EXPIRATION",
                value,
            })?,
            None => DEFAULT_JWT_EXPIRATION,
        };

        let rust_log = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let app_addr = lookup("APP_ADDR").unwrap_or_else(|| DEFAULT_APP_ADDR.to_string());
        let app_addr = app_addr.parse().map_err(|_| ConfigError::Invalid {
            key: "APP_ADDR",
            value: app_addr.clone(),
        })?;

        let quiz_fixture = lookup("QUIZ_FIXTURE").map(PathBuf::from);

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            app_addr,
            quiz_fixture,
        })
    }
}
