//! Event access configuration.

use std::time::Duration;

use keystack_auth::EncryptionPassword;
use keystack_core::KeystackError;

/// Default verification cache TTL (one hour).
pub const DEFAULT_SECRET_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default cap on non-deleted secret records per tenant.
pub const DEFAULT_MAX_SECRET_KEYS: usize = 1000;

/// Default tolerance for webhook signature timestamps (five minutes).
pub const DEFAULT_SIGNATURE_TOLERANCE: Duration = Duration::from_secs(300);

/// Event access service configuration.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Password used to issue and verify keys.
    pub encryption_password: EncryptionPassword,
    /// Retired passwords still accepted for verification.
    pub previous_passwords: Vec<EncryptionPassword>,
    /// How long a successful secret lookup is cached.
    pub secret_cache_ttl: Duration,
    /// Cap on non-deleted secret records per tenant.
    pub max_secret_keys: usize,
    /// Namespace used when a request does not name one.
    pub default_namespace: String,
    /// Version segment of published topic prefixes.
    pub topic_version: String,
    /// Accept tenant headers from a trusted upstream gateway.
    pub trust_tenant_header: bool,
    /// Maximum age of a webhook signature timestamp.
    pub signature_tolerance: Duration,
}

impl AccessConfig {
    /// Configuration with defaults around a password.
    #[must_use]
    pub fn new(encryption_password: EncryptionPassword) -> Self {
        Self {
            encryption_password,
            previous_passwords: Vec::new(),
            secret_cache_ttl: DEFAULT_SECRET_CACHE_TTL,
            max_secret_keys: DEFAULT_MAX_SECRET_KEYS,
            default_namespace: "default".to_owned(),
            topic_version: "v1".to_owned(),
            trust_tenant_header: false,
            signature_tolerance: DEFAULT_SIGNATURE_TOLERANCE,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// `ENCRYPTION_PASSWORD` (or `EVENT_ACCESS_ENCRYPTION_PASSWORD`) is
    /// required and must be exactly 32 bytes.
    pub fn from_env() -> Result<Self, KeystackError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, KeystackError> {
        let password = lookup("ENCRYPTION_PASSWORD")
            .or_else(|| lookup("EVENT_ACCESS_ENCRYPTION_PASSWORD"))
            .ok_or_else(|| KeystackError::Config("ENCRYPTION_PASSWORD is not set".to_owned()))?;
        let password = EncryptionPassword::new(password)
            .map_err(|e| KeystackError::Config(format!("ENCRYPTION_PASSWORD: {e}")))?;

        let mut config = Self::new(password);

        if let Some(v) = lookup("ENCRYPTION_PASSWORD_PREVIOUS") {
            config.previous_passwords = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    EncryptionPassword::new(s).map_err(|e| {
                        KeystackError::Config(format!("ENCRYPTION_PASSWORD_PREVIOUS: {e}"))
                    })
                })
                .collect::<Result<_, _>>()?;
        }
        if let Some(v) = lookup("SECRET_CACHE_TTL_SECONDS") {
            config.secret_cache_ttl = Duration::from_secs(parse_number(&v, "SECRET_CACHE_TTL_SECONDS")?);
        }
        if let Some(v) = lookup("MAX_SECRET_KEYS") {
            config.max_secret_keys = parse_number(&v, "MAX_SECRET_KEYS")?;
        }
        if let Some(v) = lookup("DEFAULT_NAMESPACE") {
            config.default_namespace = v;
        }
        if let Some(v) = lookup("TOPIC_VERSION") {
            config.topic_version = v;
        }
        if let Some(v) = lookup("TRUST_TENANT_HEADER") {
            config.trust_tenant_header = parse_bool(&v);
        }
        if let Some(v) = lookup("SIGNATURE_TOLERANCE_SECONDS") {
            config.signature_tolerance =
                Duration::from_secs(parse_number(&v, "SIGNATURE_TOLERANCE_SECONDS")?);
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, KeystackError> {
    value
        .trim()
        .parse()
        .map_err(|_| KeystackError::Config(format!("{key}: expected a number, got {value:?}")))
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "yes" | "TRUE" | "YES")
}
