//! # API Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SPLITTER_BIND_ADDR=0.0.0.0:8080                                    │
//! │     SPLITTER_JWT_SECRET=...                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $SPLITTER_CONFIG, or                                               │
//! │     ~/.config/bill-splitter/api.toml (Linux)                           │
//! │     ~/Library/Application Support/com.splitter.bill-splitter/api.toml  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # api.toml
//! bind_addr = "127.0.0.1:8080"
//! database_path = "/var/lib/splitter/splitter.db"
//! jwt_secret = "change-me"
//! session_lifetime_secs = 86400
//! currency_symbol = "$"
//! discrepancy_tolerance = 0.02
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use splitter_core::money::DISCREPANCY_TOLERANCE;
use splitter_core::Tolerance;

const DEV_SECRET: &str = "splitter-dev-secret-change-in-production";

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Could not read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Config file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime settings for the HTTP shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Secret used to sign session tokens
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    pub session_lifetime_secs: i64,

    /// Symbol used when formatting amounts in messages
    pub currency_symbol: String,

    /// Receipt total vs components tolerance, as a decimal (0.02 = two cents)
    pub discrepancy_tolerance: f64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_addr: "127.0.0.1:8080".to_string(),
            database_path: default_database_path(),
            jwt_secret: DEV_SECRET.to_string(),
            session_lifetime_secs: 86_400, // 1 day
            currency_symbol: "$".to_string(),
            discrepancy_tolerance: DISCREPANCY_TOLERANCE.mills() as f64 / 1000.0,
        }
    }
}

impl ApiConfig {
    /// Loads from file (if any), then applies environment overrides.
    ///
    /// `config_path` wins over `SPLITTER_CONFIG`, which wins over the
    /// platform config directory. A missing file is not an error.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = config_path
            .or_else(|| std::env::var("SPLITTER_CONFIG").ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading config file");
                let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                Self::from_toml(&contents)?
            }
            _ => {
                debug!("No config file found, using defaults");
                ApiConfig::default()
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;

        if config.jwt_secret == DEV_SECRET {
            warn!("Using the development session secret; set SPLITTER_JWT_SECRET");
        }

        Ok(config)
    }

    /// Like `load`, but falls back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            ApiConfig::default()
        })
    }

    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Checks invariants that the type system doesn't.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue("jwt_secret".into()));
        }
        if self.session_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("session_lifetime_secs".into()));
        }
        if self.tolerance().is_none() {
            return Err(ConfigError::InvalidValue("discrepancy_tolerance".into()));
        }
        if self.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidValue("bind_addr".into()));
        }
        Ok(())
    }

    /// The discrepancy tolerance, or `None` if negative or not finite.
    pub fn tolerance(&self) -> Option<Tolerance> {
        Tolerance::from_decimal(self.discrepancy_tolerance)
    }

    /// Applies `SPLITTER_*` environment overrides.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(addr) = std::env::var("SPLITTER_BIND_ADDR") {
            debug!(addr = %addr, "Overriding bind address from environment");
            self.bind_addr = addr;
        }

        if let Ok(path) = std::env::var("SPLITTER_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }

        if let Ok(secret) = std::env::var("SPLITTER_JWT_SECRET") {
            self.jwt_secret = secret;
        }

        if let Ok(secs) = std::env::var("SPLITTER_SESSION_LIFETIME_SECS") {
            self.session_lifetime_secs = secs
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SPLITTER_SESSION_LIFETIME_SECS".into()))?;
        }

        if let Ok(symbol) = std::env::var("SPLITTER_CURRENCY_SYMBOL") {
            self.currency_symbol = symbol;
        }

        if let Ok(tolerance) = std::env::var("SPLITTER_DISCREPANCY_TOLERANCE") {
            self.discrepancy_tolerance = tolerance
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SPLITTER_DISCREPANCY_TOLERANCE".into()))?;
        }

        Ok(())
    }

    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("api.toml"))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "splitter", "bill-splitter")
}

/// `<data dir>/splitter.db`, or `./splitter.db` when no home directory exists.
fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("splitter.db"))
        .unwrap_or_else(|| PathBuf::from("splitter.db"))
}
