//! Event access error types.
//!
//! Errors serialize as `{"name", "message", "code", "type", "data"}` where
//! `code` is the HTTP status and `type` the stable machine-readable tag.

use std::fmt;

/// Well-known event access error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum AccessErrorCode {
    /// Lookup found no matching record.
    NotFound,
    /// Request parameters failed validation.
    #[default]
    InvalidParameters,
    /// Credential could not be authenticated.
    Unauthorized,
    /// A presented secret key is not known.
    InvalidSecret,
    /// A presented identifier key failed verification.
    InvalidIdentifier,
    /// The tenant already holds the maximum number of keys.
    MaximumApiKeysReached,
    /// A named secret is missing one or both environments.
    SecretNotFound,
    /// The requested action is not routed.
    UnknownOperation,
    /// Unexpected failure inside the service.
    InternalError,
    /// A backing dependency is unavailable.
    ServiceUnavailable,
}

impl AccessErrorCode {
    /// Returns the error type tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::InvalidParameters => "invalid-parameters",
            Self::Unauthorized => "unauthorized",
            Self::InvalidSecret => "invalid-secret",
            Self::InvalidIdentifier => "invalid-identifier",
            Self::MaximumApiKeysReached => "maximum-api-keys-reached",
            Self::SecretNotFound => "secret-not-found",
            Self::UnknownOperation => "unknown-operation",
            Self::InternalError => "internal-error",
            Self::ServiceUnavailable => "service-unavailable",
        }
    }

    /// Returns the error class name.
    #[must_use]
    pub fn error_name(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFoundError",
            Self::InvalidParameters => "ParametersValidationError",
            Self::Unauthorized => "UnauthorizedError",
            Self::InvalidSecret => "InvalidSecretError",
            Self::InvalidIdentifier => "InvalidIdentifierError",
            Self::MaximumApiKeysReached => "MaximumAPIKeysReachedError",
            Self::SecretNotFound => "SecretNotFoundError",
            Self::UnknownOperation => "UnknownOperationError",
            Self::InternalError => "InternalError",
            Self::ServiceUnavailable => "ServiceUnavailableError",
        }
    }

    /// Returns the default HTTP status code for this error.
    #[must_use]
    pub fn default_status_code(&self) -> http::StatusCode {
        match self {
            Self::NotFound | Self::SecretNotFound | Self::UnknownOperation => {
                http::StatusCode::NOT_FOUND
            }
            Self::InvalidParameters => http::StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized | Self::InvalidSecret | Self::InvalidIdentifier => {
                http::StatusCode::UNAUTHORIZED
            }
            Self::MaximumApiKeysReached => http::StatusCode::BAD_REQUEST,
            Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => http::StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Whether the error is systemic rather than caused by the caller.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InternalError | Self::ServiceUnavailable)
    }
}

impl fmt::Display for AccessErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event access error response.
#[derive(Debug)]
pub struct AccessError {
    /// The error code.
    pub code: AccessErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
    /// Extra structured detail for the caller.
    pub data: Option<serde_json::Value>,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for AccessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl AccessError {
    /// Create a new `AccessError` from an error code.
    #[must_use]
    pub fn new(code: AccessErrorCode) -> Self {
        Self::with_message(code, code.as_str())
    }

    /// Create a new `AccessError` with a custom message.
    #[must_use]
    pub fn with_message(code: AccessErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.default_status_code(),
            message: message.into(),
            code,
            data: None,
            source: None,
        }
    }

    /// Attach structured detail.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether the error is systemic.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.code.is_fatal()
    }

    /// JSON body for this error.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.code.error_name(),
            "message": self.message,
            "code": self.status_code.as_u16(),
            "type": self.code.as_str(),
            "data": self.data.clone().unwrap_or_else(|| serde_json::json!({})),
        })
    }

    // -- Convenience constructors --

    /// No matching record.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_message(AccessErrorCode::NotFound, message)
    }

    /// Parameter validation failure.
    #[must_use]
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::with_message(AccessErrorCode::InvalidParameters, message)
    }

    /// Credential rejected. The message never says why.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::with_message(
            AccessErrorCode::Unauthorized,
            "Access denied. Invalid access key",
        )
    }

    /// Unknown secret presented to the authorization hook.
    #[must_use]
    pub fn invalid_secret() -> Self {
        Self::with_message(AccessErrorCode::InvalidSecret, "Invalid secret")
    }

    /// Identifier rejected by the authorization hook.
    #[must_use]
    pub fn invalid_identifier() -> Self {
        Self::with_message(AccessErrorCode::InvalidIdentifier, "Invalid identifier")
    }

    /// Tenant key quota exhausted.
    #[must_use]
    pub fn maximum_api_keys_reached(limit: usize) -> Self {
        Self::with_message(
            AccessErrorCode::MaximumApiKeysReached,
            format!("You have reached the maximum number of API Keys ({limit}) that can be created."),
        )
    }

    /// Named secret missing an environment.
    #[must_use]
    pub fn secret_not_found(message: impl Into<String>) -> Self {
        Self::with_message(AccessErrorCode::SecretNotFound, message)
    }

    /// Unrouted request.
    #[must_use]
    pub fn unknown_operation(method: &http::Method, path: &str) -> Self {
        Self::with_message(
            AccessErrorCode::UnknownOperation,
            format!("No action found for {method} {path}"),
        )
    }

    /// Internal failure.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(AccessErrorCode::InternalError, message)
    }

    /// Backing dependency unavailable.
    #[must_use]
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::with_message(AccessErrorCode::ServiceUnavailable, message)
    }
}
