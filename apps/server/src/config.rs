//! # Server Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKROOM_PORT=8080                                                │
//! │     STOCKROOM_DB_PATH=/var/lib/stockroom/stockroom.db                  │
//! │                                                                         │
//! │  2. TOML Config File (--config, or the platform default)               │
//! │     ~/.config/stockroom/stockroom.toml (Linux)                         │
//! │     ~/Library/Application Support/com.stockroom.stockroom/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 3000
//!
//! [database]
//! path = "stockroom.db"
//! max_connections = 5
//!
//! [export]
//! locale = "es"
//! file_prefix = "inventario"
//! utc_offset_minutes = -300
//!
//! [capture]
//! fps = 30
//! auto_close_ms = 1500
//! symbologies = ["ean-13", "upc-a", "code-128"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use stockroom_capture::CaptureSettings;
use stockroom_db::DbConfig;
use stockroom_export::ExportOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Change notifications buffered per subscriber before it starts
    /// missing events.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_event_buffer() -> usize {
    256
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: default_bind_addr(),
            port: default_port(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("stockroom.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseSettings {
    pub fn to_db_config(&self) -> DbConfig {
        DbConfig::new(&self.path).max_connections(self.max_connections)
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockroomConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub export: ExportOptions,

    #[serde(default)]
    pub capture: CaptureSettings,
}

impl StockroomConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// An explicit `config_path` must exist; the platform default may not.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a config file without applying overrides.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }

        if self.server.event_buffer == 0 {
            return Err(ConfigError::Invalid(
                "server.event_buffer must be greater than 0".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.export.file_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("export.file_prefix must not be empty".into()));
        }

        // Real-world offsets span UTC-12:00 to UTC+14:00.
        if !(-720..=840).contains(&self.export.utc_offset_minutes) {
            return Err(ConfigError::Invalid(format!(
                "export.utc_offset_minutes out of range: {}",
                self.export.utc_offset_minutes
            )));
        }

        self.capture.validate().map_err(ConfigError::Invalid)?;

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `STOCKROOM_*` overrides from `lookup`. Unparseable values are
    /// logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("STOCKROOM_BIND_ADDR") {
            self.server.bind_addr = addr;
        }

        if let Some(port) = lookup("STOCKROOM_PORT") {
            match port.parse::<u16>() {
                Ok(p) => {
                    debug!(port = p, "Overriding port from environment");
                    self.server.port = p;
                }
                Err(_) => warn!(value = %port, "Ignoring invalid STOCKROOM_PORT"),
            }
        }

        if let Some(path) = lookup("STOCKROOM_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("STOCKROOM_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(m) => self.database.max_connections = m,
                Err(_) => warn!(value = %max, "Ignoring invalid STOCKROOM_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(locale) = lookup("STOCKROOM_EXPORT_LOCALE") {
            match locale.parse() {
                Ok(l) => self.export.locale = l,
                Err(e) => warn!(error = %e, "Ignoring STOCKROOM_EXPORT_LOCALE"),
            }
        }

        if let Some(prefix) = lookup("STOCKROOM_EXPORT_PREFIX") {
            self.export.file_prefix = prefix;
        }

        if let Some(offset) = lookup("STOCKROOM_UTC_OFFSET_MINUTES") {
            match offset.parse::<i32>() {
                Ok(o) => self.export.utc_offset_minutes = o,
                Err(_) => warn!(value = %offset, "Ignoring invalid STOCKROOM_UTC_OFFSET_MINUTES"),
            }
        }

        if let Some(fps) = lookup("STOCKROOM_CAPTURE_FPS") {
            match fps.parse::<u32>() {
                Ok(f) => self.capture.fps = f,
                Err(_) => warn!(value = %fps, "Ignoring invalid STOCKROOM_CAPTURE_FPS"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockroom", "stockroom")
            .map(|dirs| dirs.config_dir().join("stockroom.toml"))
    }
}
