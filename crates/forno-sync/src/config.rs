//! # Queue Configuration
//!
//! Configuration for the terminal, the hosted backend and the offline queue.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     FORNO_TENANT_ID=pizzeria-centro                                     │
//! │     FORNO_BACKEND_URL=https://api.example.com                           │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/pos/queue.toml (Linux)                                    │
//! │     ~/Library/Application Support/com.forno.pos/queue.toml (macOS)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     no backend, 30 s remote timeout, failed orders held                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # queue.toml
//! [terminal]
//! tenant_id = "pizzeria-centro"
//! name = "Counter 1"
//!
//! [backend]
//! url = "https://api.example.com"
//! api_key = "public-anon-key"
//! remote_timeout_secs = 30
//!
//! [queue]
//! database_path = "/var/lib/forno/forno.db"
//! retry_failed_on_drain = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};

const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Terminal Configuration
// =============================================================================

/// Identity of this terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Tenant every order is recorded under.
    #[serde(default)]
    pub tenant_id: String,

    /// Human-readable terminal name (e.g., "Counter 1").
    #[serde(default = "default_terminal_name")]
    pub name: String,
}

fn default_terminal_name() -> String {
    "POS Terminal".to_string()
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            tenant_id: String::new(),
            name: default_terminal_name(),
        }
    }
}

// =============================================================================
// Backend Configuration
// =============================================================================

/// Hosted backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL; `/rest/v1/...` is appended per table.
    #[serde(default)]
    pub url: Option<String>,

    /// Project API key, sent as `apikey`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Signed-in user's token. Falls back to the API key when unset.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Upper bound on every remote call (seconds).
    #[serde(default = "default_remote_timeout")]
    pub remote_timeout_secs: u64,
}

fn default_remote_timeout() -> u64 {
    DEFAULT_REMOTE_TIMEOUT_SECS
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            url: None,
            api_key: None,
            access_token: None,
            remote_timeout_secs: default_remote_timeout(),
        }
    }
}

// =============================================================================
// Queue Settings
// =============================================================================

/// Offline queue behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueSettings {
    /// SQLite file for the queue. Defaults to the platform data dir.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Requeue Error records at the start of every drain.
    /// Off by default: failed orders wait for an operator. Interrupted
    /// records always do.
    #[serde(default)]
    pub retry_failed_on_drain: bool,
}

// =============================================================================
// Main Queue Configuration
// =============================================================================

/// Complete terminal configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub terminal: TerminalConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub queue: QueueSettings,
}

impl QueueConfig {
    /// Creates a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (queue.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading queue config from file");
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
            warn!("Failed to load queue config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Queue config saved");
        Ok(())
    }

    /// Validates the configuration.
    ///
    /// A missing backend is valid (the terminal runs offline); a present
    /// but malformed one is not.
    pub fn validate(&self) -> SyncResult<()> {
        if self.terminal.tenant_id.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "terminal.tenant_id must be set".into(),
            ));
        }

        if let Some(ref raw) = self.backend.url {
            let url = Url::parse(raw)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(SyncError::InvalidUrl(format!(
                    "Backend URL must start with http:// or https://, got: {}",
                    raw
                )));
            }
            if self.backend.api_key.as_deref().map_or(true, str::is_empty) {
                return Err(SyncError::InvalidConfig(
                    "backend.api_key is required when backend.url is set".into(),
                ));
            }
        }

        if self.backend.remote_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "remote_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("FORNO_TENANT_ID") {
            debug!(tenant_id = %id, "Overriding tenant ID from environment");
            self.terminal.tenant_id = id;
        }

        if let Some(name) = lookup("FORNO_TERMINAL_NAME") {
            self.terminal.name = name;
        }

        if let Some(url) = lookup("FORNO_BACKEND_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.backend.url = Some(url);
        }

        if let Some(key) = lookup("FORNO_API_KEY") {
            self.backend.api_key = Some(key);
        }

        if let Some(token) = lookup("FORNO_ACCESS_TOKEN") {
            self.backend.access_token = Some(token);
        }

        if let Some(secs) = lookup("FORNO_REMOTE_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.backend.remote_timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring non-numeric FORNO_REMOTE_TIMEOUT_SECS"),
            }
        }

        if let Some(path) = lookup("FORNO_DATABASE_PATH") {
            self.queue.database_path = Some(PathBuf::from(path));
        }

        if let Some(flag) = lookup("FORNO_RETRY_FAILED_ON_DRAIN") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.queue.retry_failed_on_drain = true,
                "0" | "false" | "no" => self.queue.retry_failed_on_drain = false,
                _ => warn!(value = %flag, "Unknown FORNO_RETRY_FAILED_ON_DRAIN value"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "forno", "pos")
            .map(|dirs| dirs.config_dir().join("queue.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the tenant ID.
    pub fn tenant_id(&self) -> &str {
        &self.terminal.tenant_id
    }

    /// Returns the bound applied to each remote call.
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.remote_timeout_secs)
    }

    /// Returns true if a backend is configured.
    pub fn has_backend(&self) -> bool {
        self.backend.url.is_some()
    }

    /// Returns the queue database path, falling back to the platform data dir.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.queue.database_path.clone().or_else(|| {
            directories::ProjectDirs::from("com", "forno", "pos")
                .map(|dirs| dirs.data_dir().join("forno.db"))
        })
    }
}
