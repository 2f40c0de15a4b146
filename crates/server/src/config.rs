//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Secret used to sign session tokens.
    pub jwt_secret: String,
    /// Mark session cookies `Secure` (HTTPS-only deployments).
    pub cookie_secure: bool,
    /// Optional JSON file replacing the built-in game catalog.
    pub game_catalog_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `FREECHAT_ADDR` | Server bind address | `127.0.0.1:5001` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:freechat.db?mode=rwc` |
    /// | `JWT_SECRET` | Session token signing secret | (required) |
    /// | `COOKIE_SECURE` | Mark session cookies `Secure` | `false` |
    /// | `GAME_CATALOG_PATH` | JSON file replacing the built-in game catalog | (built-in) |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("FREECHAT_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:5001".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url =
            env::var("SQLITE_PATH").unwrap_or_else(|_| "sqlite:freechat.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::MissingJwtSecret)?;

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let game_catalog_path = env::var("GAME_CATALOG_PATH").ok().map(PathBuf::from);

        Ok(Self {
            addr,
            database_url,
            jwt_secret,
            cookie_secure,
            game_catalog_path,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid FREECHAT_ADDR format")]
    InvalidAddr,

    #[error("JWT_SECRET environment variable is required")]
    MissingJwtSecret,
}
