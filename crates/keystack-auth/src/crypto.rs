//! Symmetric encryption and domain-separated message hashing.
//!
//! Encryption is AES-256-CTR keyed directly by the 32-byte server password.
//! Every binary value that ends up in a key is rendered as unpadded URL-safe
//! base64, so `_` and `%` can be used as separators further up the stack.

use std::fmt;

use aes::Aes256;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ctr::cipher::{KeyIvInit, StreamCipher};
use sha2::Sha256;
use sha3::{Digest, Keccak256};

use crate::error::CryptoError;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Default domain-separation prefix for message hashes.
///
/// Part of the wire format: changing it invalidates every issued key.
pub const MESSAGE_PREFIX: &str = "\x19Buildable Signed Message:\n";

/// Length of the AES-256 key, and therefore of the password, in bytes.
pub const PASSWORD_LEN: usize = 32;

/// Length of the CTR initialization vector in bytes.
pub const IV_LEN: usize = 16;

/// Length of the truncated consistency signature in hex characters.
const SIGNATURE_LEN: usize = 8;

/// Server-held symmetric password.
///
/// The UTF-8 bytes of the password are the AES key, and the password text is
/// mixed into every tamper hash.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionPassword {
    text: String,
    key: [u8; PASSWORD_LEN],
}

impl EncryptionPassword {
    /// Create a password from its text.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidPasswordLength`] unless the text is
    /// exactly 32 bytes long.
    pub fn new(text: impl Into<String>) -> Result<Self, CryptoError> {
        let text = text.into();
        let key: [u8; PASSWORD_LEN] = text
            .as_bytes()
            .try_into()
            .map_err(|_| CryptoError::InvalidPasswordLength(text.len()))?;
        Ok(Self { text, key })
    }

    /// The password text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Debug for EncryptionPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionPassword(***)")
    }
}

/// Output of [`encrypt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    /// Ciphertext, base64url.
    pub content: String,
    /// Initialization vector, base64url.
    pub iv: String,
    /// First 8 hex characters of the Keccak message hash over
    /// `content ‖ iv ‖ password`.
    pub signature: String,
}

/// Encrypt `plaintext` under `password` with a fresh random IV.
#[must_use]
pub fn encrypt(plaintext: &[u8], password: &EncryptionPassword) -> EncryptedPayload {
    let iv: [u8; IV_LEN] = rand::random();
    encrypt_inner(plaintext, password, &iv)
}

/// Encrypt with a caller-chosen IV.
///
/// Reusing an IV under the same password leaks plaintext in CTR mode, so this
/// is only compiled for tests and the `fixed-iv` fixture feature.
#[cfg(any(test, feature = "fixed-iv"))]
#[must_use]
pub fn encrypt_with_iv(
    plaintext: &[u8],
    password: &EncryptionPassword,
    iv: &[u8; IV_LEN],
) -> EncryptedPayload {
    encrypt_inner(plaintext, password, iv)
}

fn encrypt_inner(
    plaintext: &[u8],
    password: &EncryptionPassword,
    iv: &[u8; IV_LEN],
) -> EncryptedPayload {
    let mut buf = plaintext.to_vec();
    let mut cipher = Aes256Ctr::new(&password.key.into(), &(*iv).into());
    cipher.apply_keystream(&mut buf);

    let content = URL_SAFE_NO_PAD.encode(&buf);
    let iv = URL_SAFE_NO_PAD.encode(iv);
    let digest = hash_message(
        format!("{content}{iv}{}", password.as_str()).as_bytes(),
        MESSAGE_PREFIX,
    );
    let signature = digest[2..2 + SIGNATURE_LEN].to_owned();

    EncryptedPayload {
        content,
        iv,
        signature,
    }
}

/// Decrypt base64url `content` with base64url `iv` under `password`.
///
/// Performs no integrity check; callers verify the tamper hash first.
pub fn decrypt(
    iv: &str,
    content: &str,
    password: &EncryptionPassword,
) -> Result<Vec<u8>, CryptoError> {
    let iv = URL_SAFE_NO_PAD
        .decode(iv)
        .map_err(|e| CryptoError::Decryption(format!("invalid iv encoding: {e}")))?;
    let iv: [u8; IV_LEN] = iv
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::Decryption(format!("iv must be {IV_LEN} bytes")))?;
    let mut buf = URL_SAFE_NO_PAD
        .decode(content)
        .map_err(|e| CryptoError::Decryption(format!("invalid content encoding: {e}")))?;

    let mut cipher = Aes256Ctr::new(&password.key.into(), &iv.into());
    cipher.apply_keystream(&mut buf);
    Ok(buf)
}

/// Keccak-256 over `prefix ‖ decimal(len(message)) ‖ message`, as `0x`-prefixed
/// lowercase hex.
#[must_use]
pub fn hash_message(message: &[u8], prefix: &str) -> String {
    let mut hasher = Keccak256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    format!("0x{}", hex::encode(hasher.finalize()))
}

/// SHA-256 over the same framed message as [`hash_message`], as unpadded
/// base64url.
#[must_use]
pub fn hash_message_base64url(message: &[u8], prefix: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}
