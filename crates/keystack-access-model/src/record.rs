//! Stored event access records.

use chrono::{DateTime, Utc};
use keystack_auth::ValidAccessKey;
use keystack_core::{Environment, Ownership};
use serde::{Deserialize, Serialize};

/// Payload paths stored on a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPaths {
    /// Path to the object identifier.
    pub id: String,
    /// Path to the event name.
    pub event: String,
    /// Path to the event payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Path to the event timestamp.
    pub timestamp: String,
}

impl Default for AccessPaths {
    fn default() -> Self {
        Self {
            id: "_.body.id".to_owned(),
            event: "_.body.event".to_owned(),
            payload: Some("_.body.payload".to_owned()),
            timestamp: "_.body.createdAt".to_owned(),
        }
    }
}

/// The credential a record carries. Exactly one style per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccessCredential {
    /// Named secret looked up in the store.
    #[serde(rename_all = "camelCase")]
    Secret {
        /// Human-readable name.
        name: String,
        /// Slug of the name.
        slug: String,
        /// The `sk_*` key.
        secret: ValidAccessKey,
    },
    /// Self-describing identifier tied to an integration webhook.
    #[serde(rename_all = "camelCase")]
    Identifier {
        /// The `id_*` key.
        identifier: ValidAccessKey,
        /// Webhook registered with the upstream integration.
        integration_webhook_id: Option<String>,
        /// Signing secret of that webhook.
        integration_secret_key: Option<String>,
    },
}

impl AccessCredential {
    /// The key, whichever style.
    #[must_use]
    pub fn key(&self) -> &ValidAccessKey {
        match self {
            Self::Secret { secret, .. } => secret,
            Self::Identifier { identifier, .. } => identifier,
        }
    }
}

/// A persisted event access grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAccessRecord {
    /// Record id, `evt_ac_<uuid>`.
    #[serde(rename = "_id")]
    pub id: String,
    /// Record schema version.
    #[serde(rename = "_v")]
    pub version: String,
    /// `event_access::<type>::<group>`.
    pub key: String,
    /// Event namespace.
    pub namespace: String,
    /// Access type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Access group.
    pub group: String,
    /// Payload paths.
    pub paths: AccessPaths,
    /// Tenant ownership.
    pub ownership: Ownership,
    /// Environment.
    pub environment: Environment,
    /// Whether the grant is enabled.
    pub active: bool,
    /// Soft-delete flag.
    pub deleted: bool,
    /// Creation time, unix milliseconds.
    pub created_at: i64,
    /// Creation time.
    pub created_date: DateTime<Utc>,
    /// Last mutation, unix milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    /// Credential fields.
    #[serde(flatten)]
    pub credential: AccessCredential,
}

impl EventAccessRecord {
    /// The secret key, for secret-style records.
    #[must_use]
    pub fn secret(&self) -> Option<&ValidAccessKey> {
        match &self.credential {
            AccessCredential::Secret { secret, .. } => Some(secret),
            AccessCredential::Identifier { .. } => None,
        }
    }

    /// The secret name, for secret-style records.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.credential {
            AccessCredential::Secret { name, .. } => Some(name),
            AccessCredential::Identifier { .. } => None,
        }
    }

    /// Safe projection returned by secret verification.
    #[must_use]
    pub fn view(&self) -> SecretRecordView {
        SecretRecordView {
            id: self.id.clone(),
            version: self.version.clone(),
            name: self.name().map(ToOwned::to_owned),
            namespace: self.namespace.clone(),
            event_type: self.event_type.clone(),
            group: self.group.clone(),
            paths: self.paths.clone(),
            ownership: self.ownership.clone(),
            environment: self.environment,
            active: self.active,
            created_at: self.created_at,
            created_date: self.created_date,
        }
    }
}

/// A record without its credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRecordView {
    /// Record id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Record schema version.
    #[serde(rename = "_v")]
    pub version: String,
    /// Secret name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Event namespace.
    pub namespace: String,
    /// Access type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Access group.
    pub group: String,
    /// Payload paths.
    pub paths: AccessPaths,
    /// Tenant ownership.
    pub ownership: Ownership,
    /// Environment.
    pub environment: Environment,
    /// Whether the grant is enabled.
    pub active: bool,
    /// Creation time, unix milliseconds.
    pub created_at: i64,
    /// Creation time.
    pub created_date: DateTime<Utc>,
}
