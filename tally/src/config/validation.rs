use crate::config::types::Config;
use crate::error::{ConfigError, Result};
use std::time::Duration;

const SUPPORTED_COUNTER_STORES: [&str; 1] = ["memory://"];

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.drain.interval() == Duration::ZERO {
            return Err(ConfigError::InvalidDuration {
                field: "drain.interval_secs".to_string(),
                duration: self.drain.interval(),
            }
            .into());
        }

        if self.drain.post_view_ttl() == Duration::ZERO {
            return Err(ConfigError::InvalidDuration {
                field: "drain.post_view_ttl_secs".to_string(),
                duration: self.drain.post_view_ttl(),
            }
            .into());
        }

        if self.counter_store.url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "counter_store.url".to_string(),
            }
            .into());
        }

        if !SUPPORTED_COUNTER_STORES.contains(&self.counter_store.url.trim()) {
            return Err(ConfigError::UnsupportedCounterStore {
                url: self.counter_store.url.clone(),
            }
            .into());
        }

        if self.database.url.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "database.url".to_string(),
            }
            .into());
        }

        if self.database.max_connections == 0
            || self.database.min_connections > self.database.max_connections
        {
            return Err(ConfigError::InvalidConnectionLimits {
                min: self.database.min_connections,
                max: self.database.max_connections,
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyError;

    fn config_error(config: &Config) -> ConfigError {
        match config.validate() {
            Err(TallyError::Config(e)) => e,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_interval() {
        let mut config = Config::default();
        config.drain.interval_secs = 0;
        assert!(matches!(
            config_error(&config),
            ConfigError::InvalidDuration { .. }
        ));
    }

    #[test]
    fn test_unsupported_counter_store() {
        let mut config = Config::default();
        config.counter_store.url = "redis://localhost:6379".to_string();
        assert!(matches!(
            config_error(&config),
            ConfigError::UnsupportedCounterStore { .. }
        ));
    }

    #[test]
    fn test_connection_limits() {
        let mut config = Config::default();
        config.database.min_connections = 30;
        assert!(matches!(
            config_error(&config),
            ConfigError::InvalidConnectionLimits { min: 30, max: 20 }
        ));
    }

    #[test]
    fn test_empty_database_url() {
        let mut config = Config::default();
        config.database.url = "  ".to_string();
        assert!(matches!(
            config_error(&config),
            ConfigError::MissingField { .. }
        ));
    }
}
