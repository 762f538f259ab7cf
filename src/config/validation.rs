//! Configuration validation.
//!
//! Serde handles syntax; this pass checks value ranges and returns every
//! problem it finds, not just the first.

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("lifecycle.work_interval_ms must be greater than zero")]
    ZeroWorkInterval,

    #[error("lifecycle.check_interval_ms must be greater than zero")]
    ZeroCheckInterval,

    #[error("lifecycle.notify_suffix must not be empty")]
    EmptyNotifySuffix,

    #[error("lifecycle.notify_suffix must not contain a path separator: {0:?}")]
    SeparatorInNotifySuffix(String),

    #[error("unknown observability.log_level {0:?}")]
    UnknownLogLevel(String),
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let lifecycle = &config.lifecycle;

    if lifecycle.work_interval_ms == 0 {
        errors.push(ValidationError::ZeroWorkInterval);
    }
    if lifecycle.check_interval_ms == 0 {
        errors.push(ValidationError::ZeroCheckInterval);
    }
    if lifecycle.notify_suffix.is_empty() {
        errors.push(ValidationError::EmptyNotifySuffix);
    } else if lifecycle.notify_suffix.contains(['/', '\\']) {
        errors.push(ValidationError::SeparatorInNotifySuffix(
            lifecycle.notify_suffix.clone(),
        ));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
