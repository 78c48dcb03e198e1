// Error types for the session and lockdown core

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a lockdown state transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockdownError {
    #[error("Invalid lockdown duration: {minutes} minute(s), must be between {min} and {max}")]
    InvalidLockdownDuration { minutes: i64, min: i64, max: i64 },
}

/// Failure while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Rejection produced by the auth gate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("System is in emergency lockdown")]
    LockdownActive,

    #[error("Missing required right: {0}")]
    MissingRight(String),

    #[error(transparent)]
    Lockdown(#[from] LockdownError),
}
