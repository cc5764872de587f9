//! API configuration

use serde::Deserialize;

use core_kernel::CoreError;

/// Prefix of the environment variables read by [`ApiConfig::from_env`]
pub const ENV_PREFIX: &str = "AUDIT";

/// Reports are never kept longer than a week
pub const MAX_SESSION_TTL_SECS: u64 = 7 * 24 * 3600;

/// API configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Log level used when RUST_LOG is unset
    pub log_level: String,
    /// How long a finished report stays retrievable
    pub session_ttl_secs: u64,
    /// How often expired reports are swept
    pub sweep_interval_secs: u64,
    /// Largest accepted request body
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            session_ttl_secs: 3600,
            sweep_interval_secs: 60,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `AUDIT_*` environment variables, e.g.
    /// `AUDIT_PORT` or `AUDIT_SESSION_TTL_SECS`. Unset values keep their defaults.
    pub fn from_env() -> Result<Self, CoreError> {
        let loaded: Self = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CoreError::configuration(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Rejects values the server cannot run with
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.host.trim().is_empty() {
            return Err(CoreError::validation("host must not be empty"));
        }
        if self.max_body_bytes == 0 {
            return Err(CoreError::validation("max_body_bytes must be positive"));
        }
        Ok(())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Report lifetime, capped at [`MAX_SESSION_TTL_SECS`]
    pub fn session_ttl(&self) -> chrono::Duration {
        let secs = self.session_ttl_secs.min(MAX_SESSION_TTL_SECS);
        chrono::Duration::seconds(secs as i64)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}
