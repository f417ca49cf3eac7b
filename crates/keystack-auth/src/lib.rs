//! Access key codec and primitive cryptography for Keystack.
//!
//! An access key is an opaque bearer string that carries the tenant, the
//! environment, and the routing metadata of an event access grant. The
//! metadata is encrypted with AES-256-CTR under a server-held password and
//! protected by a keyed hash, so a key can be checked without touching any
//! datastore.
//!
//! # Usage
//!
//! ```rust,no_run
//! use keystack_auth::{AccessKeyCodec, AccessKeyPrefix, EncryptionPassword};
//!
//! let password = EncryptionPassword::new("0123456789abcdef0123456789abcdef")?;
//! let codec = AccessKeyCodec::new(password);
//! let key = codec.generate(AccessKeyPrefix::SecretLive, r#"[["t_1"]]"#);
//! let parsed = keystack_auth::parse(key.as_str())?;
//! assert_eq!(parsed.prefix, AccessKeyPrefix::SecretLive);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Modules
//!
//! - [`crypto`]: AES-256-CTR encryption and domain-separated message hashing
//! - [`codec`]: Key generation, parsing, and verification
//! - [`prefix`]: The four key prefixes and their kind/environment split
//! - [`metadata`]: The positional metadata tuple carried inside a key
//! - [`signature`]: HMAC signature headers for webhook payloads
//! - [`error`]: Error types

pub mod codec;
pub mod crypto;
pub mod error;
pub mod metadata;
pub mod prefix;
pub mod signature;

pub use codec::{AccessKeyCodec, ParsedAccessKey, ValidAccessKey, parse, redact, to_opaque};
pub use crypto::{EncryptedPayload, EncryptionPassword, hash_message, hash_message_base64url};
pub use error::{CodecError, CryptoError, SignatureError};
pub use metadata::{AccessKeyMetadata, AccessPathTuple};
pub use prefix::{AccessKeyPrefix, KeyKind};
