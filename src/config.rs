//! Environment configuration.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crm_api::{EnvCredential, Gateway, GatewayConfig, GatewayInitError};

pub const API_URL_ENV: &str = "QUOTE_DESK_API_URL";
pub const API_TOKEN_ENV: &str = "QUOTE_DESK_API_TOKEN";
pub const API_TIMEOUT_ENV: &str = "QUOTE_DESK_API_TIMEOUT_SECS";
pub const LOG_ENV: &str = "QUOTE_DESK_LOG";
pub const LOG_JSON_ENV: &str = "QUOTE_DESK_LOG_JSON";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// `None` falls back to the gateway's default base URL.
    pub api_url: Option<String>,
    /// `None` disables the per-request timeout.
    pub api_timeout: Option<Duration>,
    pub log_filter: Option<String>,
    pub log_json: bool,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: env_string_opt(API_URL_ENV),
            api_timeout: env_timeout(API_TIMEOUT_ENV),
            log_filter: env_string_opt(LOG_ENV),
            log_json: env_flag(LOG_JSON_ENV),
        }
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        let mut config = GatewayConfig::default();
        if let Some(api_url) = &self.api_url {
            config = config.with_base_url(api_url.clone());
        }
        match self.api_timeout {
            Some(timeout) => config.with_timeout(timeout),
            None => config.without_timeout(),
        }
    }

    /// Gateway that reads the bearer token from the environment on every call.
    pub fn build_gateway(&self) -> Result<Gateway, GatewayInitError> {
        Gateway::with_credentials(
            self.gateway_config(),
            Arc::new(EnvCredential::new(API_TOKEN_ENV)),
        )
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value.trim() == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value.trim().to_string())
        }
    })
}

/// Unset or unparseable values keep the gateway default; `0` disables.
fn env_timeout(key: &str) -> Option<Duration> {
    let default = Some(crm_api::config::DEFAULT_TIMEOUT);
    let Some(value) = env_string_opt(key) else {
        return default;
    };

    match value.parse::<u64>() {
        Ok(0) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            tracing::warn!(key, value = %value, "ignoring invalid timeout");
            default
        }
    }
}
