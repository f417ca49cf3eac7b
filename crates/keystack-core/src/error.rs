//! Error types for the Keystack core.

/// Core error type for Keystack infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum KeystackError {
    /// Invalid tenant identifier.
    #[error("invalid tenant id: {0:?} (must be a non-empty string without whitespace)")]
    InvalidTenantId(String),

    /// Unknown environment name.
    #[error("invalid environment: {0:?} (expected \"test\" or \"live\")")]
    InvalidEnvironment(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for Keystack operations.
pub type KeystackResult<T> = Result<T, KeystackError>;
