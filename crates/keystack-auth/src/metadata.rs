//! The metadata tuple sealed inside every access key.
//!
//! On the wire the metadata is a fixed positional JSON array:
//!
//! ```text
//! [["<buildableId>"],
//!  ["<namespace>", "<environment>", "<type>", "<group>"],
//!  ["<eventPath>", "<objectIdPath>", "<timestampPath>"]]
//! ```
//!
//! Decoding accepts nothing but this exact shape.

use keystack_core::{Environment, TenantId};
use serde::{Deserialize, Serialize};

/// Payload paths carried by a key: where a consumer finds the event name, the
/// object id, and the timestamp inside an incoming payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPathTuple {
    /// Path to the event name.
    pub event: String,
    /// Path to the object identifier.
    pub object_id: String,
    /// Path to the event timestamp.
    pub timestamp: String,
}

/// Decoded access key metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MetadataWire", into = "MetadataWire")]
pub struct AccessKeyMetadata {
    /// Root tenant.
    pub buildable_id: TenantId,
    /// Event namespace.
    pub namespace: String,
    /// Environment the key is scoped to.
    pub environment: Environment,
    /// Access type, e.g. `custom` or an integration tag.
    pub event_type: String,
    /// Access group (a slug).
    pub group: String,
    /// Payload paths.
    pub paths: AccessPathTuple,
}

#[derive(Serialize, Deserialize)]
struct MetadataWire(
    (String,),
    (String, Environment, String, String),
    (String, String, String),
);

impl TryFrom<MetadataWire> for AccessKeyMetadata {
    type Error = keystack_core::KeystackError;

    fn try_from(wire: MetadataWire) -> Result<Self, Self::Error> {
        let MetadataWire((buildable_id,), (namespace, environment, event_type, group), paths) =
            wire;
        Ok(Self {
            buildable_id: TenantId::new(buildable_id)?,
            namespace,
            environment,
            event_type,
            group,
            paths: AccessPathTuple {
                event: paths.0,
                object_id: paths.1,
                timestamp: paths.2,
            },
        })
    }
}

impl From<AccessKeyMetadata> for MetadataWire {
    fn from(meta: AccessKeyMetadata) -> Self {
        Self(
            (meta.buildable_id.as_str().to_owned(),),
            (meta.namespace, meta.environment, meta.event_type, meta.group),
            (meta.paths.event, meta.paths.object_id, meta.paths.timestamp),
        )
    }
}

impl AccessKeyMetadata {
    /// Compact JSON encoding of the tuple.
    #[must_use]
    pub fn to_json(&self) -> String {
        let wire = MetadataWire::from(self.clone());
        // A tuple of strings always serializes.
        serde_json::to_string(&wire).unwrap_or_default()
    }

    /// Decode the tuple from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Partial topic for events published under this key:
    /// `<version>/<buildableId>.<namespace>.<environment>.<type>.<group>`.
    #[must_use]
    pub fn topic_prefix(&self, version: &str) -> String {
        format!(
            "{version}/{}.{}.{}.{}.{}",
            self.buildable_id, self.namespace, self.environment, self.event_type, self.group
        )
    }
}
