//! Configuration loading and typed config structures for the chat server.
//!
//! The configuration lives in `parlor-config.yaml` at the working
//! directory (or wherever `PARLOR_CONFIG` points). This module defines
//! strongly-typed structs that mirror the YAML structure, and provides a
//! loader that reads, overrides from the environment, and validates it.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the reference behavior: sweep every 15 seconds, evict after 10 seconds
//! without a heartbeat, serve on port 5000 from an in-memory store.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is not usable.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level chat server configuration.
///
/// Mirrors the structure of `parlor-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Heartbeat and sweep timing.
    #[serde(default)]
    pub presence: PresenceConfig,

    /// Document store selection.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ChatConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `DATABASE_URL` sets `storage.database_url` and selects the
    ///   `postgres` backend
    /// - `PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Takes the lookup as a closure so tests can supply a fixed map
    /// instead of mutating the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `PORT` is not a valid port.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.storage.database_url = Some(url);
            self.storage.backend = StorageBackend::Postgres;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.trim().parse().map_err(|e| ConfigError::Invalid {
                reason: format!("PORT must be a TCP port, got {port:?}: {e}"),
            })?;
        }
        Ok(())
    }

    /// Check cross-field and range constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.presence.validate()?;
        if self.storage.backend == StorageBackend::Postgres && self.storage.database_url.is_none() {
            return Err(ConfigError::Invalid {
                reason: "storage.backend is postgres but no database_url is set".to_owned(),
            });
        }
        if self.storage.max_connections == 0 {
            return Err(ConfigError::Invalid {
                reason: "storage.max_connections must be at least 1".to_owned(),
            });
        }
        if self.storage.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                reason: "storage.connect_timeout_secs must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Presence timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PresenceConfig {
    /// A participant whose last heartbeat is older than this is stale.
    #[serde(default = "default_inactivity_threshold_ms")]
    pub inactivity_threshold_ms: u64,

    /// Period of the background sweep.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Upper bound on departure announcements written concurrently by one
    /// sweep.
    #[serde(default = "default_max_concurrent_announcements")]
    pub max_concurrent_announcements: usize,
}

impl PresenceConfig {
    /// The sweep interval as a [`Duration`].
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    /// The inactivity threshold in the signed milliseconds used for
    /// timestamp arithmetic.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the value does not fit in `i64`.
    pub fn inactivity_threshold_millis(&self) -> Result<i64, ConfigError> {
        i64::try_from(self.inactivity_threshold_ms).map_err(|e| ConfigError::Invalid {
            reason: format!("presence.inactivity_threshold_ms is too large: {e}"),
        })
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inactivity_threshold_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "presence.inactivity_threshold_ms must be at least 1".to_owned(),
            });
        }
        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "presence.sweep_interval_ms must be at least 1".to_owned(),
            });
        }
        if self.max_concurrent_announcements == 0 {
            return Err(ConfigError::Invalid {
                reason: "presence.max_concurrent_announcements must be at least 1".to_owned(),
            });
        }
        self.inactivity_threshold_millis().map(|_| ())
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            inactivity_threshold_ms: default_inactivity_threshold_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            max_concurrent_announcements: default_max_concurrent_announcements(),
        }
    }
}

/// Which document store backs the chat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local, lost on restart.
    #[default]
    Memory,
    /// `PostgreSQL` via `storage.database_url`.
    Postgres,
}

/// Document store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Selected backend.
    #[serde(default)]
    pub backend: StorageBackend,

    /// `PostgreSQL` connection string (required for the postgres backend).
    #[serde(default)]
    pub database_url: Option<String>,

    /// Maximum pooled connections for the postgres backend.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long to wait for a pooled connection.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// How long an unused pooled connection is kept open.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl StorageConfig {
    /// The connection acquire timeout as a [`Duration`].
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// The idle connection timeout as a [`Duration`].
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: None,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    5000
}

const fn default_inactivity_threshold_ms() -> u64 {
    10_000
}

const fn default_sweep_interval_ms() -> u64 {
    15_000
}

const fn default_max_concurrent_announcements() -> usize {
    16
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

const fn default_idle_timeout_secs() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn parse_without_env(yaml: &str) -> Result<ChatConfig, ConfigError> {
        let mut config: ChatConfig = serde_yml::from_str(yaml)?;
        config.apply_env_overrides(no_env)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn default_config_matches_reference_behavior() {
        let config = ChatConfig::default();
        assert_eq!(config.presence.inactivity_threshold_millis().unwrap(), 10_000);
        assert_eq!(config.presence.sweep_interval(), Duration::from_secs(15));
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.storage.idle_timeout(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 9090

presence:
  inactivity_threshold_ms: 30000
  sweep_interval_ms: 5000
  max_concurrent_announcements: 4

storage:
  backend: postgres
  database_url: "postgresql://parlor:parlor@db:5432/parlor"
  max_connections: 5
  connect_timeout_secs: 2
  idle_timeout_secs: 60

logging:
  level: "debug"
  json: true
"#;

        let config = parse_without_env(yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.presence.inactivity_threshold_ms, 30_000);
        assert_eq!(config.presence.sweep_interval_ms, 5_000);
        assert_eq!(config.presence.max_concurrent_announcements, 4);
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.storage.max_connections, 5);
        assert_eq!(config.storage.connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.storage.idle_timeout(), Duration::from_secs(60));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = parse_without_env("presence:\n  sweep_interval_ms: 1000\n").unwrap();
        assert_eq!(config.presence.sweep_interval_ms, 1_000);
        // Everything else uses defaults
        assert_eq!(config.presence.inactivity_threshold_ms, 10_000);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn env_overrides_select_postgres_and_port() {
        let env: BTreeMap<&str, &str> = [
            ("DATABASE_URL", "postgresql://u:p@h/db"),
            ("PORT", "8081"),
        ]
        .into_iter()
        .collect();

        let mut config = ChatConfig::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| (*v).to_owned()))
            .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.storage.database_url.as_deref(), Some("postgresql://u:p@h/db"));
        assert_eq!(config.server.port, 8081);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = ChatConfig::default();
        let result = config.apply_env_overrides(|key| (key == "PORT").then(|| "http".to_owned()));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = parse_without_env("presence:\n  sweep_interval_ms: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let result = parse_without_env("presence:\n  inactivity_threshold_ms: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn postgres_without_url_is_rejected() {
        let result = parse_without_env("storage:\n  backend: postgres\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn zero_connect_timeout_is_rejected() {
        let result = parse_without_env("storage:\n  connect_timeout_secs: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn unknown_backend_is_a_yaml_error() {
        let result = parse_without_env("storage:\n  backend: mongo\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("parlor-config.yaml");
        if path.exists() {
            let config = ChatConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
