//! Error types for the access key codec.

/// Errors from the primitive cryptography layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    /// The encryption password is not a valid AES-256 key.
    #[error("encryption password must be exactly 32 bytes, got {0}")]
    InvalidPasswordLength(usize),

    /// The IV or ciphertext could not be decoded.
    #[error("decryption failed: {0}")]
    Decryption(String),
}

/// Errors from access key parsing and verification.
///
/// Callers outside the codec must not expose which variant occurred: all of
/// them surface as the same unauthorized response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The key does not have the `<kind>_<env>_<base64url>` shape, or the
    /// decoded body is not a `content%iv%hash` triple.
    #[error("malformed access key: {0}")]
    MalformedKey(String),

    /// The tamper hash did not match. Either the key was modified or it was
    /// issued under a different password.
    #[error("access key hash mismatch")]
    TamperedOrWrongPassword,

    /// The hash matched but the payload did not decrypt to a valid metadata tuple.
    #[error("corrupt access key payload: {0}")]
    CorruptPayload(String),
}

impl From<CryptoError> for CodecError {
    fn from(err: CryptoError) -> Self {
        Self::CorruptPayload(err.to_string())
    }
}

/// Errors from webhook signature header verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The header is not of the form `t=<timestamp>,v1=<signature>`.
    #[error("malformed signature header: {0}")]
    MalformedHeader(String),

    /// The recomputed signature does not match.
    #[error("signature mismatch")]
    Mismatch,
}
