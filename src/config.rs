use crate::error::ConfigError;
use crate::session::SessionConfig;
use crate::session::types::MAX_SESSION_TTL_SECS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Root configuration for the session and lockdown core
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuthorityConfig {
    pub session: SessionConfig,
    pub lockdown: LockdownConfig,
    pub sweeper: SweeperConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LockdownConfig {
    /// Right a session must carry to declare or lift a lockdown
    pub admin_right: String,
}

impl Default for LockdownConfig {
    fn default() -> Self {
        Self {
            admin_right: "EMERGENCY_SHUTDOWN".to_string(),
        }
    }
}

/// Background housekeeping. Expiry never depends on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SweeperConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
        }
    }
}

impl SweeperConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl AuthorityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.ttl_secs <= 0 {
            return Err(ConfigError::Invalid(
                "session.ttl_secs must be greater than zero".to_string(),
            ));
        }

        if self.session.ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "session.ttl_secs must not exceed {} (one year)",
                MAX_SESSION_TTL_SECS
            )));
        }

        if self.lockdown.admin_right.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "lockdown.admin_right must not be empty".to_string(),
            ));
        }

        if self.sweeper.enabled && self.sweeper.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sweeper.interval_secs must be greater than zero when the sweeper is enabled"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AuthorityConfig, ConfigError> {
    let path = path.as_ref();
    info!("Loading configuration from: {}", path.display());

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config: AuthorityConfig = serde_yaml::from_str(&contents)?;
    config.validate()?;

    info!(
        "Configuration loaded: session ttl {}s, sweeper {} ({}s)",
        config.session.ttl_secs,
        if config.sweeper.enabled { "on" } else { "off" },
        config.sweeper.interval_secs
    );

    Ok(config)
}

/// Load configuration with fallback options, ending with the built-in defaults
pub fn load_config_with_fallback() -> AuthorityConfig {
    dotenvy::dotenv().ok();

    if let Ok(config_path) = std::env::var("AUTHORITY_CONFIG_PATH") {
        match load_config(&config_path) {
            Ok(config) => return config,
            Err(e) => warn!(
                "Failed to load config from AUTHORITY_CONFIG_PATH ({}): {}",
                config_path, e
            ),
        }
    }

    for path in ["authority.yaml", "authority.yml"] {
        if Path::new(path).exists() {
            match load_config(path) {
                Ok(config) => return config,
                Err(e) => warn!("Failed to load config from '{}': {}", path, e),
            }
        }
    }

    info!("No configuration file found, using defaults");
    AuthorityConfig::default()
}
