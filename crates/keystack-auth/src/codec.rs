//! Access key generation, parsing, and verification.
//!
//! Key layout:
//!
//! ```text
//! <kind>_<environment>_<base64url(content "%" iv "%" hash)>
//! ```
//!
//! `content` and `iv` come from [`crypto::encrypt`]; `hash` is
//! [`hash_message_base64url`] over `content ‖ iv ‖ password`. Only the first
//! two `_` are separators, because the base64url body may itself contain `_`.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::crypto::{self, EncryptionPassword, MESSAGE_PREFIX, hash_message_base64url};
use crate::error::CodecError;
use crate::metadata::AccessKeyMetadata;
use crate::prefix::AccessKeyPrefix;

/// Number of leading characters kept by [`redact`].
const REDACT_HEAD: usize = 7;
/// Number of trailing characters kept by [`redact`].
const REDACT_TAIL: usize = 4;

/// A well-formed, prefixed access key.
///
/// Construction only checks the prefix; use [`AccessKeyCodec::verify`] to
/// authenticate the body.
#[derive(Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ValidAccessKey {
    prefix: AccessKeyPrefix,
    value: String,
}

impl ValidAccessKey {
    /// The key prefix.
    #[must_use]
    pub fn prefix(&self) -> AccessKeyPrefix {
        self.prefix
    }

    /// The full key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Redacted form for listings and logs.
    #[must_use]
    pub fn redacted(&self) -> String {
        redact(&self.value)
    }
}

impl TryFrom<String> for ValidAccessKey {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let (prefix, _) = split_prefix(&value)?;
        Ok(Self { prefix, value })
    }
}

impl From<ValidAccessKey> for String {
    fn from(key: ValidAccessKey) -> Self {
        key.value
    }
}

impl fmt::Debug for ValidAccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValidAccessKey")
            .field(&self.redacted())
            .finish()
    }
}

impl fmt::Display for ValidAccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// The structural pieces of an access key, before authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAccessKey {
    /// Key prefix.
    pub prefix: AccessKeyPrefix,
    /// Ciphertext, base64url.
    pub content: String,
    /// IV, base64url.
    pub iv: String,
    /// Tamper hash, base64url.
    pub hash: String,
}

/// Encodes and verifies access keys under an injected password.
///
/// Keys are always issued with the current password. Previous passwords, if
/// configured, are accepted during verification only.
#[derive(Debug, Clone)]
pub struct AccessKeyCodec {
    password: EncryptionPassword,
    previous: Vec<EncryptionPassword>,
}

impl AccessKeyCodec {
    /// Create a codec for a single password.
    #[must_use]
    pub fn new(password: EncryptionPassword) -> Self {
        Self {
            password,
            previous: Vec::new(),
        }
    }

    /// Also accept keys issued under any of `previous`.
    #[must_use]
    pub fn with_previous_passwords(
        mut self,
        previous: impl IntoIterator<Item = EncryptionPassword>,
    ) -> Self {
        self.previous.extend(previous);
        self
    }

    /// Seal `plaintext` into a new key with the given prefix.
    ///
    /// Two calls with the same input produce different keys.
    #[must_use]
    pub fn generate(&self, prefix: AccessKeyPrefix, plaintext: &str) -> ValidAccessKey {
        let payload = crypto::encrypt(plaintext.as_bytes(), &self.password);
        let hash = tamper_hash(&payload.content, &payload.iv, &self.password);
        let triple = format!("{}%{}%{hash}", payload.content, payload.iv);

        ValidAccessKey {
            prefix,
            value: format!("{prefix}_{}", to_opaque(&triple)),
        }
    }

    /// Seal a metadata tuple into a new key.
    #[must_use]
    pub fn generate_for(&self, prefix: AccessKeyPrefix, metadata: &AccessKeyMetadata) -> ValidAccessKey {
        self.generate(prefix, &metadata.to_json())
    }

    /// Authenticate `key` and return the metadata it carries.
    ///
    /// Performs no I/O. The hash is checked before any decryption.
    pub fn verify(&self, key: &str) -> Result<AccessKeyMetadata, CodecError> {
        let parsed = parse(key)?;

        let password = std::iter::once(&self.password)
            .chain(&self.previous)
            .find(|password| hash_matches(&parsed, password))
            .ok_or(CodecError::TamperedOrWrongPassword)?;

        let plain = crypto::decrypt(&parsed.iv, &parsed.content, password)?;
        let text = String::from_utf8(plain)
            .map_err(|_| CodecError::CorruptPayload("payload is not utf-8".to_owned()))?;
        let metadata = AccessKeyMetadata::from_json(&text)
            .map_err(|e| CodecError::CorruptPayload(e.to_string()))?;

        debug!(
            prefix = %parsed.prefix,
            tenant = %metadata.buildable_id,
            group = %metadata.group,
            "verified access key",
        );
        Ok(metadata)
    }
}

/// Base64url-encode an already assembled `content%iv%hash` triple.
#[must_use]
pub fn to_opaque(triple: &str) -> String {
    URL_SAFE_NO_PAD.encode(triple)
}

/// Split a key into prefix, content, IV, and hash without authenticating it.
pub fn parse(key: &str) -> Result<ParsedAccessKey, CodecError> {
    let (prefix, body) = split_prefix(key)?;

    let decoded = URL_SAFE_NO_PAD
        .decode(body)
        .map_err(|e| CodecError::MalformedKey(format!("invalid body encoding: {e}")))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| CodecError::MalformedKey("body is not utf-8".to_owned()))?;

    let mut parts = decoded.splitn(3, '%');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(content), Some(iv), Some(hash)) => Ok(ParsedAccessKey {
            prefix,
            content: content.to_owned(),
            iv: iv.to_owned(),
            hash: hash.to_owned(),
        }),
        _ => Err(CodecError::MalformedKey(
            "body is not a content%iv%hash triple".to_owned(),
        )),
    }
}

/// Keep the first 7 and last 4 characters: `sk_live...Ab3d`.
#[must_use]
pub fn redact(value: &str) -> String {
    let head: String = value.chars().take(REDACT_HEAD).collect();
    let mut tail: Vec<char> = value.chars().rev().take(REDACT_TAIL).collect();
    tail.reverse();
    format!("{head}...{}", tail.into_iter().collect::<String>())
}

fn split_prefix(key: &str) -> Result<(AccessKeyPrefix, &str), CodecError> {
    let mut segments = key.splitn(3, '_');
    match (segments.next(), segments.next(), segments.next()) {
        (Some(kind), Some(environment), Some(body)) if !body.is_empty() => {
            Ok((AccessKeyPrefix::from_segments(kind, environment)?, body))
        }
        _ => Err(CodecError::MalformedKey(
            "expected <kind>_<environment>_<body>".to_owned(),
        )),
    }
}

fn tamper_hash(content: &str, iv: &str, password: &EncryptionPassword) -> String {
    hash_message_base64url(
        format!("{content}{iv}{}", password.as_str()).as_bytes(),
        MESSAGE_PREFIX,
    )
}

fn hash_matches(parsed: &ParsedAccessKey, password: &EncryptionPassword) -> bool {
    let expected = tamper_hash(&parsed.content, &parsed.iv, password);
    expected.as_bytes().ct_eq(parsed.hash.as_bytes()).into()
}
