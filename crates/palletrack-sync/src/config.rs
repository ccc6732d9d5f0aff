//! # Sync Configuration
//!
//! Configuration management for the sync engine and the local store.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PALLETRACK_ENDPOINT_URL=https://script.example.com/exec            │
//! │     PALLETRACK_API_KEY=...                                             │
//! │     PALLETRACK_DB=/data/pallets.db                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/palletrack/config.toml (Linux)                           │
//! │     ~/Library/Application Support/com.palletrack/config.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     timeout 15 s, flush batch 50, snapshot chunk 200                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # config.toml
//! database_path = "pallets.db"
//!
//! [sync]
//! endpoint_url = "https://script.example.com/macros/s/.../exec"
//! api_key = "WAREHOUSE-QR-2026"
//! timeout_secs = 15
//! flush_batch = 50
//! snapshot_chunk = 200
//! ```

use std::env;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Defaults
// =============================================================================

fn default_timeout_secs() -> u64 {
    15
}

fn default_flush_batch() -> u32 {
    50
}

fn default_snapshot_chunk() -> usize {
    200
}

fn default_database_path() -> PathBuf {
    PathBuf::from("pallets.db")
}

// =============================================================================
// Sync Configuration
// =============================================================================

/// Remote webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Webhook endpoint URL (the deployed spreadsheet script).
    #[serde(default)]
    pub endpoint_url: String,

    /// Shared secret carried in every payload body; must match the remote.
    #[serde(default)]
    pub api_key: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum outbox entries attempted per flush.
    #[serde(default = "default_flush_batch")]
    pub flush_batch: u32,

    /// Snapshot rows per bulk request.
    #[serde(default = "default_snapshot_chunk")]
    pub snapshot_chunk: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            endpoint_url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            flush_batch: default_flush_batch(),
            snapshot_chunk: default_snapshot_chunk(),
        }
    }
}

// =============================================================================
// App Configuration
// =============================================================================

/// Full application configuration: local store path + sync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Remote sync settings.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: default_database_path(),
            sync: SyncConfig::default(),
        }
    }
}

impl AppConfig {
    /// Returns the default config file path for this platform.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "palletrack", "palletrack")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads configuration from the given path (or the platform default),
    /// then applies environment overrides.
    ///
    /// A missing file yields defaults rather than an error so a fresh
    /// install can start from env vars alone.
    pub fn load(path: Option<&Path>) -> SyncResult<Self> {
        let resolved = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };

        let mut config = match resolved {
            Some(ref file) if file.exists() => {
                info!(path = %file.display(), "Loading configuration");
                let text = std::fs::read_to_string(file)?;
                toml::from_str(&text)?
            }
            _ => {
                debug!("No config file found, using defaults");
                AppConfig::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Saves the configuration to the given path, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> SyncResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text)
            .map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;

        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Applies `PALLETRACK_*` environment overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = env::var("PALLETRACK_ENDPOINT_URL") {
            self.sync.endpoint_url = endpoint;
        }
        if let Ok(key) = env::var("PALLETRACK_API_KEY") {
            self.sync.api_key = key;
        }
        if let Ok(db) = env::var("PALLETRACK_DB") {
            self.database_path = PathBuf::from(db);
        }
    }

    /// Validates the configuration for use by the sync engine.
    ///
    /// ## Errors
    /// * [`SyncError::InvalidConfig`] - empty api key or zero batch sizes
    /// * [`SyncError::InvalidUrl`] - endpoint missing or unparseable
    pub fn validate(&self) -> SyncResult<()> {
        if self.sync.endpoint_url.trim().is_empty() {
            return Err(SyncError::InvalidUrl("endpoint_url is not set".to_string()));
        }
        Url::parse(&self.sync.endpoint_url)?;

        if self.sync.api_key.trim().is_empty() {
            return Err(SyncError::InvalidConfig("api_key is not set".to_string()));
        }
        if self.sync.flush_batch == 0 {
            return Err(SyncError::InvalidConfig(
                "flush_batch must be at least 1".to_string(),
            ));
        }
        if self.sync.snapshot_chunk == 0 {
            return Err(SyncError::InvalidConfig(
                "snapshot_chunk must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
