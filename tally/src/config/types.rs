use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, Result};

pub const ENV_DATABASE_URL: &str = "RIPPLE_DATABASE_URL";
pub const ENV_COUNTER_STORE_URL: &str = "RIPPLE_COUNTER_STORE_URL";
pub const ENV_DRAIN_INTERVAL_SECS: &str = "RIPPLE_DRAIN_INTERVAL_SECS";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub drain: DrainConfig,
    pub counter_store: CounterStoreConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrainConfig {
    /// Seconds between drain ticks (default 5 minutes)
    pub interval_secs: u64,
    /// Expiry of post view counters, refreshed on every view (default 24 hours)
    pub post_view_ttl_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterStoreConfig {
    /// Counter store location. Only `memory://` is built in.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Apply pending migrations on `start`
    pub run_migrations: bool,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5 * 60,
            post_view_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl Default for CounterStoreConfig {
    fn default() -> Self {
        Self {
            url: "memory://".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://ripple.db?mode=rwc".to_string(),
            max_connections: 20,
            min_connections: 1,
            run_migrations: true,
        }
    }
}

impl DrainConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn post_view_ttl(&self) -> Duration {
        Duration::from_secs(self.post_view_ttl_secs)
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => ConfigError::InvalidFormat {
                message: format!("Failed to read config file: {e}"),
            },
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config = toml::from_str(content).map_err(|e| ConfigError::InvalidFormat {
            message: format!("Failed to parse config: {e}"),
        })?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat {
            message: format!("Failed to serialize config: {e}"),
        })?;
        Ok(content)
    }

    /// File (or defaults), then environment overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `RIPPLE_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            self.database.url = url;
        }

        if let Some(url) = lookup(ENV_COUNTER_STORE_URL) {
            self.counter_store.url = url;
        }

        if let Some(raw) = lookup(ENV_DRAIN_INTERVAL_SECS) {
            self.drain.interval_secs =
                raw.trim()
                    .parse()
                    .map_err(|e| ConfigError::EnvironmentVariable {
                        variable: ENV_DRAIN_INTERVAL_SECS.to_string(),
                        message: format!("{raw:?} is not a number of seconds: {e}"),
                    })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyError;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.drain.interval(), Duration::from_secs(300));
        assert_eq!(config.drain.post_view_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.counter_store.url, "memory://");
        assert!(config.database.run_migrations);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [drain]
            interval_secs = 60

            [database]
            url = "postgres://localhost/ripple"
            "#,
        )
        .unwrap();

        assert_eq!(config.drain.interval_secs, 60);
        assert_eq!(config.drain.post_view_ttl_secs, 86_400);
        assert_eq!(config.database.url, "postgres://localhost/ripple");
        assert_eq!(config.database.max_connections, 20);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = Config::default();
        let parsed = Config::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DATABASE_URL, "sqlite::memory:"),
            (ENV_DRAIN_INTERVAL_SECS, " 30 "),
        ]);

        let mut config = Config::default();
        config
            .apply_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.drain.interval_secs, 30);
        assert_eq!(config.counter_store.url, "memory://");
    }

    #[test]
    fn test_bad_env_interval() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|name| (name == ENV_DRAIN_INTERVAL_SECS).then(|| "soon".to_string()))
            .unwrap_err();

        assert!(matches!(
            err,
            TallyError::Config(ConfigError::EnvironmentVariable { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load_from_file("/nonexistent/ripple.toml").unwrap_err();
        assert!(matches!(
            err,
            TallyError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
