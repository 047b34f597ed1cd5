use crate::engine::loopback::LoopbackSettings;
use crate::error::config::ConfigError;
use crate::{
    DEFAULT_SERVER_NAME, ENV_DEBUG_CLIENTS, ENV_DEFAULT_SERVER, ENV_NO_START_SERVER,
    ENV_START_TIMEOUT_MS, SERVER_NAME_SIZE,
};

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "gateway.toml";
const CONFIG_DIR_NAME: &str = "audiogate";
const MAX_START_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server used when an open does not name one.
    #[serde(default = "default_server_name")]
    pub default_server_name: String,

    /// Force no-start on every open, as if each caller passed it.
    #[serde(default)]
    pub no_start_server: bool,

    /// Wrap client proxies in the tracing decorator.
    #[serde(default)]
    pub debug_clients: bool,

    #[serde(default = "default_start_timeout_ms")]
    pub server_start_timeout_ms: u64,

    #[serde(default)]
    pub loopback: LoopbackSettings,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            default_server_name: default_server_name(),
            no_start_server: false,
            debug_clients: false,
            server_start_timeout_ms: default_start_timeout_ms(),
            loopback: LoopbackSettings::default(),
        }
    }
}

fn default_server_name() -> String {
    DEFAULT_SERVER_NAME.to_string()
}
fn default_start_timeout_ms() -> u64 {
    5_000
}

impl GatewayConfig {
    pub fn server_start_timeout(&self) -> Duration {
        Duration::from_millis(self.server_start_timeout_ms)
    }

    /// Directory searched by [`GatewayConfig::from_env`].
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME))
    }

    /// Load config from {config_dir}/gateway.toml.
    ///
    /// # Returns
    ///
    /// Returns defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but is unreadable or invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            debug!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).map_err(|e| ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            })?;

        let config: GatewayConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Apply environment-style overrides read through `lookup`.
    ///
    /// A set no-start variable forces no-start whatever its value.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(ENV_DEFAULT_SERVER) {
            self.default_server_name = name;
        }

        if lookup(ENV_NO_START_SERVER).is_some() {
            self.no_start_server = true;
        }

        if let Some(value) = lookup(ENV_DEBUG_CLIENTS) {
            self.debug_clients = parse_flag(ENV_DEBUG_CLIENTS, &value)?;
        }

        if let Some(value) = lookup(ENV_START_TIMEOUT_MS) {
            self.server_start_timeout_ms =
                value
                    .trim()
                    .parse()
                    .map_err(|e| ConfigError::OverrideError {
                        location: ErrorLocation::from(Location::caller()),
                        variable: ENV_START_TIMEOUT_MS.to_string(),
                        reason: format!("'{value}' is not a number of milliseconds: {e}"),
                    })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Config for the process-wide gateway: `.env`, then the config file in
    /// [`GatewayConfig::default_dir`], then process environment overrides.
    ///
    /// Falls back to defaults on any error.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }

        let base = match Self::default_dir() {
            Some(dir) => Self::load(&dir).unwrap_or_else(|e| {
                warn!("Ignoring gateway config file: {e}");
                Self::default()
            }),
            None => Self::default(),
        };

        base.clone()
            .apply_overrides(|key| std::env::var(key).ok())
            .unwrap_or_else(|e| {
                warn!("Ignoring gateway environment overrides: {e}");
                base
            })
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_server_name.is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "default_server_name cannot be empty".to_string(),
            });
        }

        if self.default_server_name.len() > SERVER_NAME_SIZE {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "default_server_name is {} bytes (maximum {SERVER_NAME_SIZE})",
                    self.default_server_name.len()
                ),
            });
        }

        if self.server_start_timeout_ms == 0 || self.server_start_timeout_ms > MAX_START_TIMEOUT_MS
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid server_start_timeout_ms: {} (must be 1-{MAX_START_TIMEOUT_MS})",
                    self.server_start_timeout_ms
                ),
            });
        }

        if self.loopback.max_clients == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "loopback.max_clients must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

#[track_caller]
fn parse_flag(variable: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::OverrideError {
            location: ErrorLocation::from(Location::caller()),
            variable: variable.to_string(),
            reason: format!("'{other}' is not a boolean"),
        }),
    }
}
