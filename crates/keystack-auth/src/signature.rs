//! HMAC-SHA256 signature headers for webhook payloads.
//!
//! The header format is `t=<unix-seconds>,v1=<signature>`, where the signature
//! is computed over `"<timestamp>.<payload>"`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// Text encoding of the HMAC digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureEncoding {
    /// Lowercase hex.
    #[default]
    Hex,
    /// Standard base64 with padding.
    Base64,
}

/// A parsed signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Signing timestamp in unix seconds.
    pub timestamp: i64,
    /// The `v1` signature.
    pub signature: String,
}

impl SignatureHeader {
    /// Parse `t=<timestamp>,v1=<signature>`. Unknown fields are ignored.
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        let mut timestamp = None;
        let mut signature = None;

        for field in header.split(',') {
            match field.trim().split_once('=') {
                Some(("t", value)) => {
                    timestamp = Some(value.parse::<i64>().map_err(|_| {
                        SignatureError::MalformedHeader(format!("invalid timestamp {value:?}"))
                    })?);
                }
                Some(("v1", value)) => signature = Some(value.to_owned()),
                _ => {}
            }
        }

        match (timestamp, signature) {
            (Some(timestamp), Some(signature)) => Ok(Self {
                timestamp,
                signature,
            }),
            _ => Err(SignatureError::MalformedHeader(
                "expected t=<timestamp>,v1=<signature>".to_owned(),
            )),
        }
    }
}

/// HMAC-SHA256 of `data` under `secret`.
#[must_use]
pub fn create_signature(data: &[u8], secret: &str, encoding: SignatureEncoding) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can accept keys of any length");
    mac.update(data);
    let digest = mac.finalize().into_bytes();
    match encoding {
        SignatureEncoding::Hex => hex::encode(digest),
        SignatureEncoding::Base64 => STANDARD.encode(digest),
    }
}

/// Build a `t=<timestamp>,v1=<signature>` header value for `data`.
#[must_use]
pub fn create_signature_header(
    timestamp: i64,
    data: &str,
    secret: &str,
    encoding: SignatureEncoding,
) -> String {
    let signed = format!("{timestamp}.{data}");
    let signature = create_signature(signed.as_bytes(), secret, encoding);
    format!("t={timestamp},v1={signature}")
}

/// Verify a signature header against `data`, returning the signed timestamp.
///
/// Freshness of the timestamp is left to the caller.
pub fn verify_signature_header(
    header: &str,
    data: &str,
    secret: &str,
    encoding: SignatureEncoding,
) -> Result<i64, SignatureError> {
    let parsed = SignatureHeader::parse(header)?;
    let signed = format!("{}.{data}", parsed.timestamp);
    let expected = create_signature(signed.as_bytes(), secret, encoding);

    if expected.as_bytes().ct_eq(parsed.signature.as_bytes()).into() {
        Ok(parsed.timestamp)
    } else {
        debug!(timestamp = parsed.timestamp, "webhook signature mismatch");
        Err(SignatureError::Mismatch)
    }
}
