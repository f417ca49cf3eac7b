//! Gateway configuration.
//!
//! All configuration is driven by environment variables.

/// Global configuration for a Keystack server process.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeystackConfig {
    /// Bind address for the gateway.
    pub gateway_listen: String,
    /// Log level.
    pub log_level: String,
}

impl Default for KeystackConfig {
    fn default() -> Self {
        Self {
            gateway_listen: "0.0.0.0:4580".to_owned(),
            log_level: "info".to_owned(),
        }
    }
}

impl KeystackConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }
}
