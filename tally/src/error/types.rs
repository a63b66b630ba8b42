use std::time::Duration;

use thiserror::Error;

/// Error taxonomy for the recording and drain pipeline
#[derive(Error, Debug)]
pub enum TallyError {
    // Counter store errors
    #[error("Counter store error during {operation}: {message}")]
    TransientStore { message: String, operation: String },

    // Durable store errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Key and field decoding errors
    #[error("Decode error for {input:?}: {reason}")]
    Decode { input: String, reason: String },

    #[error("Validation failed: {field} - {message}")]
    Validation {
        field: String,
        message: String,
        value: Option<String>,
    },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Configuration-specific errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Invalid duration: {field} = {duration:?} (must be > 0)")]
    InvalidDuration { field: String, duration: Duration },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid connection limits: min {min} > max {max}")]
    InvalidConnectionLimits { min: u32, max: u32 },

    #[error("Unsupported counter store url: {url}")]
    UnsupportedCounterStore { url: String },

    #[error("Invalid configuration format: {message}")]
    InvalidFormat { message: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Environment variable error: {variable} - {message}")]
    EnvironmentVariable { variable: String, message: String },
}

impl TallyError {
    pub fn store(operation: &str, message: impl Into<String>) -> Self {
        TallyError::TransientStore {
            message: message.into(),
            operation: operation.to_string(),
        }
    }

    pub fn decode(input: &str, reason: impl Into<String>) -> Self {
        TallyError::Decode {
            input: input.to_string(),
            reason: reason.into(),
        }
    }

    pub fn validation(field: &str, message: impl Into<String>, value: Option<&str>) -> Self {
        TallyError::Validation {
            field: field.to_string(),
            message: message.into(),
            value: value.map(str::to_string),
        }
    }

    /// Check if retrying the same operation later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TallyError::TransientStore { .. } | TallyError::Database { .. }
        )
    }

    /// Check if the drainer should retain the offending field as a dead letter
    pub fn is_dead_letter(&self) -> bool {
        matches!(self, TallyError::Decode { .. } | TallyError::Validation { .. })
    }
}

impl From<ripple_model::Error> for TallyError {
    fn from(err: ripple_model::Error) -> Self {
        match err {
            ripple_model::Error::ValidationError { errors } => {
                let field = errors
                    .first()
                    .map(|e| e.field.clone())
                    .unwrap_or_default();
                let message = errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");

                TallyError::Validation {
                    field,
                    message,
                    value: None,
                }
            }
            ripple_model::Error::DatabaseError(e) => TallyError::Database {
                message: e.to_string(),
                source: Some(Box::new(e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TallyError::store("increment", "connection reset").is_retryable());
        assert!(!TallyError::decode("G:x", "too few tokens").is_retryable());
        assert!(!TallyError::Internal { message: "x".into() }.is_retryable());
    }

    #[test]
    fn test_dead_letter_classification() {
        assert!(TallyError::decode("G:x", "too few tokens").is_dead_letter());
        assert!(TallyError::validation("entity", "bad id", Some("a b")).is_dead_letter());
        assert!(!TallyError::store("read_all", "timeout").is_dead_letter());
    }

    #[test]
    fn test_error_display() {
        let err = TallyError::store("increment", "connection reset");
        assert_eq!(
            err.to_string(),
            "Counter store error during increment: connection reset"
        );
    }
}
