//! Action inputs.

use std::collections::BTreeMap;

use keystack_core::Environment;
use serde::Deserialize;

use crate::record::AccessPaths;

/// `Verify`: exactly one of the two must be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyInput {
    /// Secret key.
    #[serde(default)]
    pub secret: Option<String>,
    /// Identifier key.
    #[serde(default)]
    pub identifier: Option<String>,
}

/// `VerifySecret`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifySecretInput {
    /// Secret key.
    pub secret: String,
}

/// `VerifyIdentifier`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyIdentifierInput {
    /// Identifier key.
    pub identifier: String,
}

/// An inbound webhook delivery as seen by an integration handler.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSignaturePayload {
    /// Request headers, lowercase names.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Raw request body.
    #[serde(default)]
    pub body: String,
    /// Signature, when not carried in a header.
    #[serde(default)]
    pub signature: Option<String>,
}

/// `VerifySignature`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySignatureInput {
    /// The delivery to check.
    pub payload: WebhookSignaturePayload,
    /// Integration type tag selecting the handler.
    #[serde(rename = "type")]
    pub integration_type: String,
    /// Webhook signing secret.
    #[serde(default)]
    pub secret: Option<String>,
}

/// `CreateSecret`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSecretInput {
    /// Human-readable name.
    pub name: String,
    /// Access type, default `custom`.
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    /// Access group, default slug of the name.
    #[serde(default)]
    pub group: Option<String>,
    /// Namespace, default from configuration.
    #[serde(default)]
    pub namespace: Option<String>,
}

/// `CreateIdentifier`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIdentifierInput {
    /// Human-readable name.
    pub name: String,
    /// Integration type tag.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Namespace, default from configuration.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Payload paths.
    pub paths: AccessPaths,
    /// Upstream webhook id.
    #[serde(default)]
    pub integration_webhook_id: Option<String>,
    /// Upstream webhook signing secret.
    #[serde(default)]
    pub integration_secret_key: Option<String>,
    /// Environment, default `test`.
    #[serde(default)]
    pub environment: Option<Environment>,
    /// Whether the grant is enabled, default `true`.
    #[serde(default)]
    pub active: Option<bool>,
    /// Re-issue an existing identifier instead of generating one.
    #[serde(default)]
    pub identifier: Option<String>,
}

/// `ListSecrets`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSecretsInput {
    /// Zero-based page.
    #[serde(default)]
    pub page: Option<usize>,
    /// Page size.
    #[serde(default)]
    pub page_size: Option<usize>,
    /// Redact keys, default `true`.
    #[serde(default)]
    pub redacted: Option<bool>,
}

/// `GetSecret`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetSecretInput {
    /// Record id.
    pub id: String,
}

/// `DeleteSecret`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSecretInput {
    /// Secret name.
    pub name: String,
}

/// `RotateSecret`.
#[derive(Debug, Clone, Deserialize)]
pub struct RotateSecretInput {
    /// Secret name.
    pub name: String,
}
