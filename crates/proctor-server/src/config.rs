//! Configuration loading and typed config structures for the Proctor service.
//!
//! The canonical configuration lives in `proctor-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.

use std::path::Path;
use std::time::Duration;

use proctor_core::ports::LockConfig;
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
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
///
/// Mirrors the structure of `proctor-config.yaml`. All fields have
/// sensible defaults so the service starts with no config file at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProctorConfig {
    /// Gateway listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Infrastructure connection strings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Room lock tuning.
    #[serde(default)]
    pub lock: LockSection,

    /// Countdown timer tuning.
    #[serde(default)]
    pub timer: TimerConfig,
}

impl ProctorConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `REDIS_URL` overrides `infrastructure.redis_url`
    /// - `NATS_URL` overrides `infrastructure.nats_url`
    /// - `PROCTOR_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.infrastructure.apply_env_overrides();
        if let Ok(val) = std::env::var("PROCTOR_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
    }
}

/// Gateway listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Bind address for the WebSocket gateway.
    #[serde(default = "default_host")]
    pub host: String,

    /// Gateway port.
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

/// Infrastructure connection strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// Redis URL for the room store and distributed lock.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// NATS messaging URL for the room event bus.
    #[serde(default = "default_nats_url")]
    pub nats_url: String,
}

impl InfrastructureConfig {
    /// Override infrastructure URLs with environment variables when set.
    ///
    /// This allows Docker Compose (or any deployment) to set connection
    /// strings via env vars without modifying the YAML config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("REDIS_URL") {
            self.redis_url = val;
        }
        if let Ok(val) = std::env::var("NATS_URL") {
            self.nats_url = val;
        }
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            nats_url: default_nats_url(),
        }
    }
}

/// Room lock tuning.
///
/// The defaults keep lock contention bounded at startup storms: a
/// caller retries for roughly `retry_count * (retry_delay_ms + jitter)`
/// before reporting the room as locked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LockSection {
    /// Lock time-to-live in milliseconds.
    #[serde(default = "default_lock_ttl_ms")]
    pub ttl_ms: u64,

    /// Number of acquisition retries before giving up.
    #[serde(default = "default_lock_retry_count")]
    pub retry_count: u32,

    /// Base delay between retries in milliseconds.
    #[serde(default = "default_lock_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Maximum random jitter added to each retry delay, in milliseconds.
    #[serde(default = "default_lock_retry_jitter_ms")]
    pub retry_jitter_ms: u64,
}

impl LockSection {
    /// Convert the YAML section into the lock port configuration.
    #[must_use]
    pub const fn to_lock_config(&self) -> LockConfig {
        LockConfig {
            ttl: Duration::from_millis(self.ttl_ms),
            retry_count: self.retry_count,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            retry_jitter: Duration::from_millis(self.retry_jitter_ms),
        }
    }
}

impl Default for LockSection {
    fn default() -> Self {
        Self {
            ttl_ms: default_lock_ttl_ms(),
            retry_count: default_lock_retry_count(),
            retry_delay_ms: default_lock_retry_delay_ms(),
            retry_jitter_ms: default_lock_retry_jitter_ms(),
        }
    }
}

/// Countdown timer tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimerConfig {
    /// Real-time milliseconds between countdown ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl TimerConfig {
    /// Tick interval as a [`Duration`].
    #[must_use]
    pub const fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    4000
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_owned()
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_owned()
}

const fn default_lock_ttl_ms() -> u64 {
    2000
}

const fn default_lock_retry_count() -> u32 {
    10
}

const fn default_lock_retry_delay_ms() -> u64 {
    200
}

const fn default_lock_retry_jitter_ms() -> u64 {
    50
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ProctorConfig::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.lock.ttl_ms, 2000);
        assert_eq!(config.lock.retry_count, 10);
        assert_eq!(config.timer.tick_interval_ms, 1000);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 4100

infrastructure:
  redis_url: "redis://testhost:6379"
  nats_url: "nats://testhost:4222"

lock:
  ttl_ms: 3000
  retry_count: 5
  retry_delay_ms: 100
  retry_jitter_ms: 25

timer:
  tick_interval_ms: 250
"#;

        let config = ProctorConfig::parse(yaml).expect("parse failed");

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 4100);
        assert_eq!(config.infrastructure.redis_url, "redis://testhost:6379");
        assert_eq!(config.lock.ttl_ms, 3000);
        assert_eq!(config.lock.retry_count, 5);
        assert_eq!(config.timer.tick_interval_ms, 250);
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "server:\n  port: 4001\n";
        let config = ProctorConfig::parse(yaml).expect("parse failed");

        // Port is overridden, everything else uses defaults.
        assert_eq!(config.server.port, 4001);
        assert_eq!(config.lock.retry_delay_ms, 200);
        assert_eq!(config.infrastructure.nats_url, "nats://localhost:4222");
    }

    #[test]
    fn parse_empty_yaml() {
        let config = ProctorConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn lock_section_converts_to_port_config() {
        let section = LockSection::default();
        let lock = section.to_lock_config();
        assert_eq!(lock.ttl, Duration::from_millis(2000));
        assert_eq!(lock.retry_count, 10);
        assert_eq!(lock.retry_delay, Duration::from_millis(200));
        assert_eq!(lock.retry_jitter, Duration::from_millis(50));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("proctor-config.yaml");
        if path.exists() {
            let config = ProctorConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
