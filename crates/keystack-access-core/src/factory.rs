//! Builds event access records and seals their keys.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use keystack_auth::{AccessKeyCodec, AccessKeyMetadata, AccessKeyPrefix, AccessPathTuple, KeyKind};
use keystack_access_model::{AccessCredential, AccessPaths, EventAccessRecord};
use keystack_core::{Environment, Ownership};
use tracing::debug;

use crate::ids::{new_record_id, record_key, slugify};

/// Schema version stamped on secret records.
pub const SECRET_RECORD_VERSION: &str = "1.0.0";

/// Schema version stamped on identifier records.
pub const IDENTIFIER_RECORD_VERSION: &str = "2.0.0";

/// Access type used for tenant-created secrets.
pub const DEFAULT_EVENT_TYPE: &str = "custom";

/// Parameters for [`AccessKeyFactory::build_secret_record`].
#[derive(Debug, Clone)]
pub struct BuildSecretRecord {
    pub name: String,
    pub namespace: String,
    pub event_type: Option<String>,
    pub group: Option<String>,
    pub ownership: Ownership,
    pub environment: Environment,
    pub paths: Option<AccessPaths>,
}

/// Parameters for [`AccessKeyFactory::build_identifier_record`].
#[derive(Debug, Clone)]
pub struct BuildIdentifierRecord {
    pub name: String,
    pub namespace: String,
    pub event_type: String,
    pub ownership: Ownership,
    pub paths: AccessPaths,
    pub integration_webhook_id: Option<String>,
    pub integration_secret_key: Option<String>,
    pub environment: Environment,
    pub active: bool,
    /// Existing key to re-issue as-is.
    pub identifier: Option<keystack_auth::ValidAccessKey>,
}

/// Assembles records and generates their keys through the codec.
#[derive(Debug, Clone)]
pub struct AccessKeyFactory {
    codec: Arc<AccessKeyCodec>,
}

impl AccessKeyFactory {
    #[must_use]
    pub fn new(codec: Arc<AccessKeyCodec>) -> Self {
        Self { codec }
    }

    /// Build a secret-style record with a fresh `sk_<env>` key.
    #[must_use]
    pub fn build_secret_record(&self, params: BuildSecretRecord, now: DateTime<Utc>) -> EventAccessRecord {
        let slug = slugify(&params.name);
        let group = params.group.unwrap_or_else(|| slug.clone());
        let event_type = params
            .event_type
            .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_owned());
        let paths = params.paths.unwrap_or_default();
        let ownership = params.ownership.normalized();

        let metadata = build_metadata(
            &ownership,
            &params.namespace,
            params.environment,
            &event_type,
            &group,
            &paths,
        );
        let secret = self.codec.generate_for(
            AccessKeyPrefix::new(KeyKind::Secret, params.environment),
            &metadata,
        );

        let record = EventAccessRecord {
            id: new_record_id(),
            version: SECRET_RECORD_VERSION.to_owned(),
            key: record_key(&event_type, &group),
            namespace: params.namespace,
            event_type,
            group,
            paths,
            ownership,
            environment: params.environment,
            active: true,
            deleted: false,
            created_at: now.timestamp_millis(),
            created_date: now,
            updated_at: None,
            credential: AccessCredential::Secret {
                name: params.name,
                slug,
                secret,
            },
        };
        debug!(id = %record.id, key = %record.key, environment = %record.environment, "built secret record");
        record
    }

    /// Build an identifier-style record, generating an `id_<env>` key unless
    /// one is supplied.
    #[must_use]
    pub fn build_identifier_record(
        &self,
        params: BuildIdentifierRecord,
        now: DateTime<Utc>,
    ) -> EventAccessRecord {
        let group = slugify(&params.name);
        let ownership = params.ownership.normalized();

        let identifier = params.identifier.unwrap_or_else(|| {
            let metadata = build_metadata(
                &ownership,
                &params.namespace,
                params.environment,
                &params.event_type,
                &group,
                &params.paths,
            );
            self.codec.generate_for(
                AccessKeyPrefix::new(KeyKind::Identifier, params.environment),
                &metadata,
            )
        });

        let record = EventAccessRecord {
            id: new_record_id(),
            version: IDENTIFIER_RECORD_VERSION.to_owned(),
            key: record_key(&params.event_type, &group),
            namespace: params.namespace,
            event_type: params.event_type,
            group,
            paths: params.paths,
            ownership,
            environment: params.environment,
            active: params.active,
            deleted: false,
            created_at: now.timestamp_millis(),
            created_date: now,
            updated_at: None,
            credential: AccessCredential::Identifier {
                identifier,
                integration_webhook_id: params.integration_webhook_id,
                integration_secret_key: params.integration_secret_key,
            },
        };
        debug!(id = %record.id, key = %record.key, environment = %record.environment, "built identifier record");
        record
    }
}

/// The single place the positional tuple is assembled.
fn build_metadata(
    ownership: &Ownership,
    namespace: &str,
    environment: Environment,
    event_type: &str,
    group: &str,
    paths: &AccessPaths,
) -> AccessKeyMetadata {
    AccessKeyMetadata {
        buildable_id: ownership.buildable_id.clone(),
        namespace: namespace.to_owned(),
        environment,
        event_type: event_type.to_owned(),
        group: group.to_owned(),
        paths: AccessPathTuple {
            event: paths.event.clone(),
            object_id: paths.id.clone(),
            timestamp: paths.timestamp.clone(),
        },
    }
}
