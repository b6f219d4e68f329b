//! # Service Configuration
//!
//! Settings for the store connection, lock timeouts and sale tax.
//!
//! ## Configuration Sources (priority order)
//! 1. Environment variables (`SYOS_*`)
//! 2. Config file (`syos.toml` in the platform config directory)
//! 3. Defaults
//!
//! ## Example Config File
//! ```toml
//! [database]
//! path = "syos.db"
//! max_connections = 8
//! busy_timeout_ms = 5000
//! connect_timeout_secs = 30
//!
//! [locks]
//! cache_lock_timeout_ms = 2000
//! sale_number_lock_timeout_ms = 2000
//!
//! [sales]
//! tax_rate_bps = 0
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ServiceError, ServiceResult};
use syos_core::TaxRate;
use syos_db::DbConfig;

// =============================================================================
// Database Settings
// =============================================================================

/// Store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    /// Pool size. Concurrent sales each hold one connection.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits on another transaction's lock.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("syos.db")
}

fn default_max_connections() -> u32 {
    8
}

fn default_busy_timeout() -> u64 {
    5000
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

// =============================================================================
// Lock Settings
// =============================================================================

/// Upper bounds on in-process lock waits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockSettings {
    /// Product cache read/write lock.
    #[serde(default = "default_lock_timeout")]
    pub cache_lock_timeout_ms: u64,

    /// Sale-number mutex.
    #[serde(default = "default_lock_timeout")]
    pub sale_number_lock_timeout_ms: u64,
}

fn default_lock_timeout() -> u64 {
    2000
}

impl Default for LockSettings {
    fn default() -> Self {
        LockSettings {
            cache_lock_timeout_ms: default_lock_timeout(),
            sale_number_lock_timeout_ms: default_lock_timeout(),
        }
    }
}

// =============================================================================
// Sales Settings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesSettings {
    /// Tax charged on (subtotal - discount), in basis points.
    #[serde(default)]
    pub tax_rate_bps: u32,
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete SYOS service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyosConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub locks: LockSettings,

    #[serde(default)]
    pub sales: SalesSettings,
}

impl SyosConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (syos.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ServiceResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ServiceResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ServiceError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ServiceResult<()> {
        if self.database.max_connections == 0 {
            return Err(ServiceError::InvalidConfig(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        let timeouts = [
            ("database.busy_timeout_ms", self.database.busy_timeout_ms),
            ("database.connect_timeout_secs", self.database.connect_timeout_secs),
            ("locks.cache_lock_timeout_ms", self.locks.cache_lock_timeout_ms),
            ("locks.sale_number_lock_timeout_ms", self.locks.sale_number_lock_timeout_ms),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(ServiceError::InvalidConfig(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        syos_core::validation::validate_tax_rate_bps(self.sales.tax_rate_bps)?;

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("SYOS_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = env_override("SYOS_DB_MAX_CONNECTIONS") {
            self.database.max_connections = max;
        }
        if let Some(ms) = env_override("SYOS_BUSY_TIMEOUT_MS") {
            self.database.busy_timeout_ms = ms;
        }
        if let Some(ms) = env_override("SYOS_CACHE_LOCK_TIMEOUT_MS") {
            self.locks.cache_lock_timeout_ms = ms;
        }
        if let Some(ms) = env_override("SYOS_SALE_NUMBER_LOCK_TIMEOUT_MS") {
            self.locks.sale_number_lock_timeout_ms = ms;
        }
        if let Some(bps) = env_override("SYOS_TAX_RATE_BPS") {
            self.sales.tax_rate_bps = bps;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "syos", "pos")
            .map(|dirs| dirs.config_dir().join("syos.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Store settings as a `DbConfig` for `Database::new`.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
    }

    pub fn cache_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.locks.cache_lock_timeout_ms)
    }

    pub fn sale_number_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.locks.sale_number_lock_timeout_ms)
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.sales.tax_rate_bps)
    }
}

/// Reads and parses `name`; unset yields `None`, unparsable warns and
/// yields `None`.
fn env_override<T>(name: &str) -> Option<T>
where
    T: FromStr + std::fmt::Display,
{
    let raw = std::env::var(name).ok()?;
    parse_override(name, &raw)
}

fn parse_override<T>(name: &str, raw: &str) -> Option<T>
where
    T: FromStr + std::fmt::Display,
{
    match raw.trim().parse::<T>() {
        Ok(value) => {
            debug!(variable = name, value = %value, "Overriding config from environment");
            Some(value)
        }
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring invalid environment override");
            None
        }
    }
}
