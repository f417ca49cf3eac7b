//! Access key prefixes.
//!
//! A prefix is `<kind>_<environment>`: `id` keys are self-describing and
//! verified locally, `sk` keys are looked up in the record store.

use std::fmt;
use std::str::FromStr;

use keystack_core::Environment;

use crate::error::CodecError;

/// Credential kind encoded in the first prefix segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// `id`: identifier-style key.
    Identifier,
    /// `sk`: secret-style key.
    Secret,
}

impl KeyKind {
    /// Returns the wire segment.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identifier => "id",
            Self::Secret => "sk",
        }
    }
}

/// One of the four access key prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKeyPrefix {
    /// `id_test`
    IdentifierTest,
    /// `id_live`
    IdentifierLive,
    /// `sk_test`
    SecretTest,
    /// `sk_live`
    SecretLive,
}

impl AccessKeyPrefix {
    /// All prefixes.
    pub const ALL: [Self; 4] = [
        Self::IdentifierTest,
        Self::IdentifierLive,
        Self::SecretTest,
        Self::SecretLive,
    ];

    /// Build a prefix from its two segments.
    #[must_use]
    pub fn new(kind: KeyKind, environment: Environment) -> Self {
        match (kind, environment) {
            (KeyKind::Identifier, Environment::Test) => Self::IdentifierTest,
            (KeyKind::Identifier, Environment::Live) => Self::IdentifierLive,
            (KeyKind::Secret, Environment::Test) => Self::SecretTest,
            (KeyKind::Secret, Environment::Live) => Self::SecretLive,
        }
    }

    /// Resolve the prefix from the raw `kind` and `environment` segments.
    pub fn from_segments(kind: &str, environment: &str) -> Result<Self, CodecError> {
        let kind = match kind {
            "id" => KeyKind::Identifier,
            "sk" => KeyKind::Secret,
            other => {
                return Err(CodecError::MalformedKey(format!(
                    "unknown key kind {other:?}"
                )));
            }
        };
        let environment = environment.parse::<Environment>().map_err(|_| {
            CodecError::MalformedKey(format!("unknown key environment {environment:?}"))
        })?;
        Ok(Self::new(kind, environment))
    }

    /// Returns the full prefix string, e.g. `sk_live`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentifierTest => "id_test",
            Self::IdentifierLive => "id_live",
            Self::SecretTest => "sk_test",
            Self::SecretLive => "sk_live",
        }
    }

    /// The credential kind.
    #[must_use]
    pub fn kind(&self) -> KeyKind {
        match self {
            Self::IdentifierTest | Self::IdentifierLive => KeyKind::Identifier,
            Self::SecretTest | Self::SecretLive => KeyKind::Secret,
        }
    }

    /// The environment.
    #[must_use]
    pub fn environment(&self) -> Environment {
        match self {
            Self::IdentifierTest | Self::SecretTest => Environment::Test,
            Self::IdentifierLive | Self::SecretLive => Environment::Live,
        }
    }
}

impl FromStr for AccessKeyPrefix {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, environment) = s
            .split_once('_')
            .ok_or_else(|| CodecError::MalformedKey(format!("invalid prefix {s:?}")))?;
        Self::from_segments(kind, environment)
    }
}

impl fmt::Display for AccessKeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
