//! Bootstrap configuration loading
//!
//! Settings come from a TOML file read once at startup. Config file
//! resolution order:
//! 1. Command-line argument (highest priority)
//! 2. `VMS_CONFIG` environment variable
//! 3. `~/.config/vms/config.toml` (platform config dir)
//! 4. Built-in defaults (no file)
//!
//! Individual command-line flags are applied on top by the binary.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "VMS_CONFIG";

/// Longest accepted token lifetime (one year)
pub const MAX_JWT_EXPIRATION_HOURS: u64 = 24 * 366;

/// Service configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// HMAC key for access tokens; must be set before serving
    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration_hours")]
    pub jwt_expiration_hours: u64,

    /// Origins allowed by CORS
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            database_path: default_database_path(),
            jwt_secret: String::new(),
            jwt_expiration_hours: default_jwt_expiration_hours(),
            allowed_origins: default_allowed_origins(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    8080
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vms")
        .join("vms.db")
}

fn default_jwt_expiration_hours() -> u64 {
    24
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Parse TOML text; absent fields take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Load configuration, falling back to defaults when no file is found
    ///
    /// An explicitly named file (argument or environment) must exist.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from);

        match resolve_config_path(cli_path, env_path.as_deref(), user_config_path().as_deref()) {
            Some(path) => {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
                })?;
                info!("Loaded configuration from {}", path.display());
                Self::from_toml_str(&content)
            }
            None => {
                debug!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(Error::Config(
                "jwt_secret must be set (config file or VMS_JWT_SECRET)".to_string(),
            ));
        }
        if self.jwt_expiration_hours == 0 {
            return Err(Error::Config(
                "jwt_expiration_hours must be greater than zero".to_string(),
            ));
        }
        if self.jwt_expiration_hours > MAX_JWT_EXPIRATION_HOURS {
            return Err(Error::Config(format!(
                "jwt_expiration_hours must be at most {}",
                MAX_JWT_EXPIRATION_HOURS
            )));
        }
        Ok(())
    }
}

/// `~/.config/vms/config.toml` or the platform equivalent
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vms").join("config.toml"))
}

/// Pick the config file to read
///
/// Explicit paths win even when missing so the read error reaches the user;
/// the per-user file is only used if it exists.
fn resolve_config_path(
    cli_path: Option<&Path>,
    env_path: Option<&Path>,
    user_path: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_path {
        return Some(path.to_path_buf());
    }
    user_path.filter(|p| p.exists()).map(Path::to_path_buf)
}
