//! Action outputs.

use keystack_auth::{AccessKeyMetadata, AccessPathTuple, ValidAccessKey};
use keystack_core::Environment;
use serde::Serialize;

use crate::record::SecretRecordView;

/// `VerifyIdentifier`: the decoded tuple plus its routing data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyIdentifierOutput {
    /// The decoded metadata, in tuple form.
    pub data: AccessKeyMetadata,
    /// Topic prefix for events published under the key.
    pub topic_prefix: String,
    /// Payload paths.
    pub paths: AccessPathTuple,
}

/// `Verify`: whichever credential was presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum VerifyOutput {
    /// A secret was presented.
    Secret(SecretRecordView),
    /// An identifier was presented.
    Identifier(VerifyIdentifierOutput),
}

/// `VerifySignature`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerifySignatureOutput {
    /// Whether the handler accepted the signature.
    pub verified: bool,
}

/// `CreateSecret` and `RotateSecret`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretInformation {
    /// Secret name.
    pub name: String,
    /// Creation time, unix milliseconds.
    pub created_at: i64,
    /// Test record id.
    pub test_key_id: String,
    /// Live record id.
    pub live_key_id: String,
    /// Test key.
    pub test_key: ValidAccessKey,
    /// Live key.
    pub live_key: ValidAccessKey,
}

/// `CreateIdentifier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierInformation {
    /// Record id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Identifier key.
    pub identifier: ValidAccessKey,
    /// Environment.
    pub environment: Environment,
    /// Creation time, unix milliseconds.
    pub created_at: i64,
}

/// One row of `ListSecrets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretListing {
    /// Record id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Secret name.
    pub name: String,
    /// Slug of the name.
    pub slug: String,
    /// Access type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Access group.
    pub group: String,
    /// Environment.
    pub environment: Environment,
    /// Creation time, unix milliseconds.
    pub created_at: i64,
    /// Key, redacted unless requested otherwise.
    pub secret: String,
}

/// `ListSecrets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSecretsOutput {
    /// Rows on this page.
    pub rows: Vec<SecretListing>,
    /// Total matching records.
    pub total: usize,
    /// Zero-based page.
    pub page: usize,
    /// Page size.
    pub page_size: usize,
}

/// `GetSecret`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSecretOutput {
    /// Record id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Secret key.
    pub secret: ValidAccessKey,
}

/// `DeleteSecret`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteSecretOutput {
    /// Number of records soft-deleted.
    pub deleted: usize,
}
