//! Three-state result for service edges.

use crate::error::AccessError;

/// Result of a verification that distinguishes caller errors from systemic
/// failures.
///
/// `Recoverable` errors are terminal for the request and are returned to the
/// caller as-is (4xx). `Fatal` errors indicate a broken dependency and must be
/// logged and escalated (5xx).
#[derive(Debug)]
pub enum Outcome<T> {
    /// Success.
    Ok(T),
    /// Caller-facing failure.
    Recoverable(AccessError),
    /// Systemic failure.
    Fatal(AccessError),
}

impl<T> Outcome<T> {
    /// Whether this is `Ok`.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Whether this is `Fatal`.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Map the success value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Ok(v) => Outcome::Ok(f(v)),
            Self::Recoverable(e) => Outcome::Recoverable(e),
            Self::Fatal(e) => Outcome::Fatal(e),
        }
    }

    /// Replace a recoverable error, leaving fatal errors untouched.
    #[must_use]
    pub fn map_recoverable(self, f: impl FnOnce(AccessError) -> AccessError) -> Self {
        match self {
            Self::Recoverable(e) => Self::Recoverable(f(e)),
            other => other,
        }
    }

    /// Collapse back into a `Result`.
    pub fn into_result(self) -> Result<T, AccessError> {
        match self {
            Self::Ok(v) => Ok(v),
            Self::Recoverable(e) | Self::Fatal(e) => Err(e),
        }
    }
}

impl<T> From<Result<T, AccessError>> for Outcome<T> {
    fn from(result: Result<T, AccessError>) -> Self {
        match result {
            Ok(v) => Self::Ok(v),
            Err(e) if e.is_fatal() => Self::Fatal(e),
            Err(e) => Self::Recoverable(e),
        }
    }
}
