//! Event access provider implementing every action.
//!
//! Secrets are verified by store lookup behind a TTL cache. Identifiers are
//! verified in-process by the codec and never touch the store. Key management
//! actions require a tenant identity established by the authorization hook.

use std::sync::Arc;

use chrono::Utc;
use keystack_access_model::error::AccessError;
use keystack_access_model::identity::{
    IdentitySource, PresentedCredential, RequestContext, RequestIdentity,
};
use keystack_access_model::input::{
    CreateIdentifierInput, CreateSecretInput, DeleteSecretInput, GetSecretInput,
    ListSecretsInput, RotateSecretInput, VerifyIdentifierInput, VerifyInput, VerifySecretInput,
    VerifySignatureInput,
};
use keystack_access_model::output::{
    DeleteSecretOutput, GetSecretOutput, IdentifierInformation, ListSecretsOutput,
    SecretInformation, SecretListing, VerifyIdentifierOutput, VerifyOutput,
    VerifySignatureOutput,
};
use keystack_access_model::{
    AccessCredential, AccessPaths, EventAccessRecord, Outcome, SecretRecordView,
};
use keystack_auth::{AccessKeyCodec, AccessKeyMetadata, KeyKind, ValidAccessKey, redact};
use keystack_core::{Environment, Ownership, TenantId};
use tracing::{debug, info, warn};

use crate::cache::SecretCache;
use crate::config::AccessConfig;
use crate::error::store_error_to_access;
use crate::factory::{
    AccessKeyFactory, BuildIdentifierRecord, BuildSecretRecord, DEFAULT_EVENT_TYPE,
};
use crate::integrations::IntegrationRegistry;
use crate::policy::KeyQuotaPolicy;
use crate::store::{AccessRecordStore, Page, RecordQuery, RecordUpdate};

/// Default `ListSecrets` page size.
const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest accepted `ListSecrets` page size.
const MAX_PAGE_SIZE: usize = 100;

/// The event access provider.
#[derive(Debug)]
pub struct KeystackAccess {
    config: AccessConfig,
    codec: Arc<AccessKeyCodec>,
    factory: AccessKeyFactory,
    store: Arc<dyn AccessRecordStore>,
    cache: SecretCache,
    integrations: Arc<IntegrationRegistry>,
    policy: KeyQuotaPolicy,
}

impl KeystackAccess {
    /// Create a provider with the built-in integration handlers.
    #[must_use]
    pub fn new(config: AccessConfig, store: Arc<dyn AccessRecordStore>) -> Self {
        let integrations = Arc::new(IntegrationRegistry::with_defaults(config.signature_tolerance));
        Self::with_integrations(config, store, integrations)
    }

    /// Create a provider with a caller-supplied integration registry.
    #[must_use]
    pub fn with_integrations(
        config: AccessConfig,
        store: Arc<dyn AccessRecordStore>,
        integrations: Arc<IntegrationRegistry>,
    ) -> Self {
        let codec = Arc::new(
            AccessKeyCodec::new(config.encryption_password.clone())
                .with_previous_passwords(config.previous_passwords.iter().cloned()),
        );
        Self {
            factory: AccessKeyFactory::new(Arc::clone(&codec)),
            cache: SecretCache::new(config.secret_cache_ttl),
            policy: KeyQuotaPolicy::new(config.max_secret_keys),
            codec,
            store,
            integrations,
            config,
        }
    }

    /// The provider configuration.
    #[must_use]
    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// The integration registry.
    #[must_use]
    pub fn integrations(&self) -> &IntegrationRegistry {
        &self.integrations
    }

    /// Drop expired verification cache entries.
    pub fn purge_expired_cache(&self) {
        self.cache.purge_expired();
    }

    // ---------------------------------------------------------------------------
    // Verification
    // ---------------------------------------------------------------------------

    /// Handle `Verify`.
    pub async fn handle_verify(
        &self,
        ctx: &RequestContext,
        input: VerifyInput,
    ) -> Result<VerifyOutput, AccessError> {
        match (input.secret, input.identifier) {
            (None, None) => Err(AccessError::invalid_parameters(
                "No identifier or secret provided.",
            )),
            (Some(_), Some(_)) => Err(AccessError::invalid_parameters(
                "Cannot provide both an identifier and secret.",
            )),
            (Some(secret), None) => self
                .handle_verify_secret(ctx, VerifySecretInput { secret })
                .await
                .map(VerifyOutput::Secret),
            (None, Some(identifier)) => self
                .handle_verify_identifier(VerifyIdentifierInput { identifier })
                .map(VerifyOutput::Identifier),
        }
    }

    /// Handle `VerifySecret`.
    pub async fn handle_verify_secret(
        &self,
        ctx: &RequestContext,
        input: VerifySecretInput,
    ) -> Result<SecretRecordView, AccessError> {
        let tenant = ctx.identity.as_ref().map(|i| &i.buildable_id);
        self.lookup_secret(tenant, &input.secret).await
    }

    /// Handle `VerifyIdentifier`.
    pub fn handle_verify_identifier(
        &self,
        input: VerifyIdentifierInput,
    ) -> Result<VerifyIdentifierOutput, AccessError> {
        let data = self.decode_identifier(&input.identifier)?;
        Ok(VerifyIdentifierOutput {
            topic_prefix: data.topic_prefix(&self.config.topic_version),
            paths: data.paths.clone(),
            data,
        })
    }

    /// Handle `VerifySignature`.
    ///
    /// A handler rejection is reported as `verified: false`, never as an error.
    pub fn handle_verify_signature(
        &self,
        input: VerifySignatureInput,
    ) -> Result<VerifySignatureOutput, AccessError> {
        let handler = self
            .integrations
            .get(&input.integration_type)
            .ok_or_else(|| {
                AccessError::invalid_parameters(format!(
                    "Unsupported integration type: {}",
                    input.integration_type
                ))
            })?;

        let verified = match handler.verify_webhook_signature(&input.payload, input.secret.as_deref())
        {
            Ok(()) => true,
            Err(e) => {
                warn!(integration = %input.integration_type, error = %e, "webhook signature rejected");
                false
            }
        };
        Ok(VerifySignatureOutput { verified })
    }

    /// Secret verification as a three-state outcome.
    pub async fn verify_via_secret(&self, secret: &str) -> Outcome<SecretRecordView> {
        self.lookup_secret(None, secret).await.into()
    }

    /// Identifier verification as a three-state outcome.
    pub fn verify_via_identifier(&self, identifier: &str) -> Outcome<AccessKeyMetadata> {
        self.decode_identifier(identifier).into()
    }

    /// Establish a request identity from a presented credential.
    pub async fn authorize(&self, credential: PresentedCredential) -> Outcome<RequestIdentity> {
        match credential {
            PresentedCredential::Secret(secret) => match self.verify_via_secret(&secret).await {
                Outcome::Ok(view) if !view.active => {
                    debug!(id = %view.id, "inactive secret presented");
                    Outcome::Recoverable(AccessError::invalid_secret())
                }
                outcome => outcome
                    .map(|view| RequestIdentity {
                        user_id: view.ownership.user_or_tenant().to_owned(),
                        buildable_id: view.ownership.buildable_id,
                        source: IdentitySource::Secret,
                    })
                    .map_recoverable(|_| AccessError::invalid_secret()),
            },
            PresentedCredential::Identifier(identifier) => self
                .verify_via_identifier(&identifier)
                .map(|data| RequestIdentity {
                    user_id: data.buildable_id.as_str().to_owned(),
                    buildable_id: data.buildable_id,
                    source: IdentitySource::Identifier,
                })
                .map_recoverable(|_| AccessError::invalid_identifier()),
        }
    }

    async fn lookup_secret(
        &self,
        tenant: Option<&TenantId>,
        secret: &str,
    ) -> Result<SecretRecordView, AccessError> {
        // Anything without a known prefix cannot be stored; skip the store.
        let Ok(key) = ValidAccessKey::try_from(secret.to_owned()) else {
            return Err(AccessError::not_found("Secret not found"));
        };

        if let Some(view) = self.cache.get(tenant, key.as_str()) {
            debug!(secret = %key.redacted(), "secret cache hit");
            return Ok(view);
        }

        let query = RecordQuery {
            secret: Some(key.as_str().to_owned()),
            kind: Some(KeyKind::Secret),
            deleted: Some(false),
            ..RecordQuery::default()
        };
        let record = self
            .store
            .find_one(&query)
            .await
            .map_err(store_error_to_access)?
            .ok_or_else(|| AccessError::not_found("Secret not found"))?;

        let view = record.view();
        self.cache.insert(tenant, key.as_str(), view.clone());
        debug!(secret = %key.redacted(), id = %view.id, "secret verified");
        Ok(view)
    }

    /// Only `id_*` keys are self-describing; any other kind must go through a lookup.
    fn decode_identifier(&self, identifier: &str) -> Result<AccessKeyMetadata, AccessError> {
        let key = ValidAccessKey::try_from(identifier.to_owned()).map_err(|e| {
            debug!(identifier = %redact(identifier), error = %e, "identifier rejected");
            AccessError::unauthorized()
        })?;
        if key.prefix().kind() != KeyKind::Identifier {
            debug!(identifier = %key.redacted(), "non-identifier key presented as identifier");
            return Err(AccessError::unauthorized());
        }
        self.codec.verify(key.as_str()).map_err(|e| {
            debug!(identifier = %key.redacted(), error = %e, "identifier rejected");
            AccessError::unauthorized()
        })
    }

    // ---------------------------------------------------------------------------
    // Key management
    // ---------------------------------------------------------------------------

    /// Handle `CreateSecret`.
    pub async fn handle_create_secret(
        &self,
        ctx: &RequestContext,
        input: CreateSecretInput,
    ) -> Result<SecretInformation, AccessError> {
        let identity = ctx.require_identity()?;
        let tenant = identity.buildable_id.clone();
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AccessError::invalid_parameters("Secret name is required."));
        }

        let secrets = RecordQuery::live_for_tenant(tenant.clone()).kind(KeyKind::Secret);
        let same_name = secrets.clone().name(name);
        if self.count(&same_name).await? > 0 {
            return Err(AccessError::invalid_parameters(format!(
                "A secret named '{name}' already exists."
            )));
        }
        self.policy.check(self.count(&secrets).await?, 2)?;

        let template = SecretTemplate {
            name: name.to_owned(),
            namespace: input
                .namespace
                .unwrap_or_else(|| self.config.default_namespace.clone()),
            event_type: input.event_type,
            group: input.group,
            ownership: identity.ownership(),
            paths: None,
        };
        let info = self.issue_pair(template).await?;
        info!(tenant = %tenant, name = %info.name, "created secret pair");
        Ok(info)
    }

    /// Handle `CreateIdentifier`.
    ///
    /// Re-issuing an identifier already stored for the tenant returns the
    /// existing record.
    pub async fn handle_create_identifier(
        &self,
        ctx: &RequestContext,
        input: CreateIdentifierInput,
    ) -> Result<IdentifierInformation, AccessError> {
        let identity = ctx.require_identity()?;
        if input.name.trim().is_empty() {
            return Err(AccessError::invalid_parameters("Identifier name is required."));
        }

        let supplied = match input.identifier {
            Some(identifier) => {
                Some(self.validate_supplied_identifier(&identity.buildable_id, identifier)?)
            }
            None => None,
        };

        if let Some(identifier) = &supplied {
            let query = RecordQuery {
                identifier: Some(identifier.as_str().to_owned()),
                ..RecordQuery::live_for_tenant(identity.buildable_id.clone())
            };
            if let Some(existing) = self
                .store
                .find_one(&query)
                .await
                .map_err(store_error_to_access)?
            {
                debug!(id = %existing.id, "identifier already stored");
                return Ok(identifier_information(&existing, identifier.clone()));
            }
        }

        let record = self.factory.build_identifier_record(
            BuildIdentifierRecord {
                name: input.name,
                namespace: input
                    .namespace
                    .unwrap_or_else(|| self.config.default_namespace.clone()),
                event_type: input.event_type,
                ownership: identity.ownership(),
                paths: input.paths,
                integration_webhook_id: input.integration_webhook_id,
                integration_secret_key: input.integration_secret_key,
                environment: input.environment.unwrap_or(Environment::Test),
                active: input.active.unwrap_or(true),
                identifier: supplied,
            },
            Utc::now(),
        );
        let key = record.credential.key().clone();
        let info = identifier_information(&record, key);

        self.store
            .insert(vec![record])
            .await
            .map_err(store_error_to_access)?;
        info!(tenant = %identity.buildable_id, id = %info.id, "created identifier");
        Ok(info)
    }

    /// Handle `ListSecrets`.
    pub async fn handle_list_secrets(
        &self,
        ctx: &RequestContext,
        input: ListSecretsInput,
    ) -> Result<ListSecretsOutput, AccessError> {
        let identity = ctx.require_identity()?;
        let page = input.page.unwrap_or(1).max(1);
        let page_size = input
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let redacted = input.redacted.unwrap_or(true);

        let query = RecordQuery {
            active: Some(true),
            event_type: Some(DEFAULT_EVENT_TYPE.to_owned()),
            ..RecordQuery::live_for_tenant(identity.buildable_id.clone()).kind(KeyKind::Secret)
        };
        let total = self.count(&query).await?;
        let records = self
            .store
            .find(
                &query,
                Some(Page {
                    offset: (page - 1).saturating_mul(page_size),
                    limit: page_size,
                }),
            )
            .await
            .map_err(store_error_to_access)?;

        let rows = records
            .iter()
            .filter_map(|record| secret_listing(record, redacted))
            .collect();
        Ok(ListSecretsOutput {
            rows,
            total,
            page,
            page_size,
        })
    }

    /// Handle `GetSecret`.
    pub async fn handle_get_secret(
        &self,
        ctx: &RequestContext,
        input: GetSecretInput,
    ) -> Result<GetSecretOutput, AccessError> {
        let identity = ctx.require_identity()?;
        let query = RecordQuery::live_for_tenant(identity.buildable_id.clone())
            .kind(KeyKind::Secret)
            .ids([input.id]);
        let record = self
            .store
            .find_one(&query)
            .await
            .map_err(store_error_to_access)?;

        let Some((id, secret)) = record.and_then(|r| Some((r.id.clone(), r.secret()?.clone())))
        else {
            return Err(AccessError::not_found("Secret not found"));
        };
        Ok(GetSecretOutput { id, secret })
    }

    /// Handle `DeleteSecret`.
    pub async fn handle_delete_secret(
        &self,
        ctx: &RequestContext,
        input: DeleteSecretInput,
    ) -> Result<DeleteSecretOutput, AccessError> {
        let identity = ctx.require_identity()?;
        let query = RecordQuery::live_for_tenant(identity.buildable_id.clone())
            .kind(KeyKind::Secret)
            .name(input.name.as_str());
        let records = self
            .store
            .find(&query, None)
            .await
            .map_err(store_error_to_access)?;
        ensure_both_environments(&records)?;

        let deleted = self
            .store
            .update_many(&query, &RecordUpdate::soft_delete(Utc::now().timestamp_millis()))
            .await
            .map_err(store_error_to_access)?;
        self.cache.clear();

        info!(tenant = %identity.buildable_id, name = %input.name, deleted, "deleted secret");
        Ok(DeleteSecretOutput { deleted })
    }

    /// Handle `RotateSecret`: issue a new pair, then retire the old one.
    pub async fn handle_rotate_secret(
        &self,
        ctx: &RequestContext,
        input: RotateSecretInput,
    ) -> Result<SecretInformation, AccessError> {
        let identity = ctx.require_identity()?;
        let query = RecordQuery::live_for_tenant(identity.buildable_id.clone())
            .kind(KeyKind::Secret)
            .name(input.name.as_str());
        let records = self
            .store
            .find(&query, None)
            .await
            .map_err(store_error_to_access)?;
        let current = ensure_both_environments(&records)?;

        let template = SecretTemplate {
            name: input.name.clone(),
            namespace: current.namespace.clone(),
            event_type: Some(current.event_type.clone()),
            group: Some(current.group.clone()),
            ownership: current.ownership.clone(),
            paths: Some(current.paths.clone()),
        };
        let info = self.issue_pair(template).await?;

        let retired = RecordQuery::default().ids(records.iter().map(|r| r.id.clone()));
        self.store
            .update_many(&retired, &RecordUpdate::soft_delete(Utc::now().timestamp_millis()))
            .await
            .map_err(store_error_to_access)?;
        self.cache.clear();

        info!(tenant = %identity.buildable_id, name = %input.name, "rotated secret");
        Ok(info)
    }

    async fn count(&self, query: &RecordQuery) -> Result<usize, AccessError> {
        self.store.count(query).await.map_err(store_error_to_access)
    }

    /// A supplied identifier must decode and belong to the caller's tenant.
    fn validate_supplied_identifier(
        &self,
        tenant: &TenantId,
        identifier: String,
    ) -> Result<ValidAccessKey, AccessError> {
        let invalid = || AccessError::invalid_parameters("Invalid identifier.");
        let key = ValidAccessKey::try_from(identifier).map_err(|_| invalid())?;
        if key.prefix().kind() != KeyKind::Identifier {
            return Err(invalid());
        }
        let data = self.codec.verify(key.as_str()).map_err(|_| invalid())?;
        if data.buildable_id != *tenant {
            warn!(tenant = %tenant, owner = %data.buildable_id, "identifier belongs to another tenant");
            return Err(invalid());
        }
        Ok(key)
    }

    /// Build and insert a `test` + `live` secret pair.
    async fn issue_pair(&self, template: SecretTemplate) -> Result<SecretInformation, AccessError> {
        let now = Utc::now();
        let build = |environment| {
            self.factory.build_secret_record(
                BuildSecretRecord {
                    name: template.name.clone(),
                    namespace: template.namespace.clone(),
                    event_type: template.event_type.clone(),
                    group: template.group.clone(),
                    ownership: template.ownership.clone(),
                    environment,
                    paths: template.paths.clone(),
                },
                now,
            )
        };
        let test = build(Environment::Test);
        let live = build(Environment::Live);

        let (Some(test_key), Some(live_key)) = (test.secret().cloned(), live.secret().cloned())
        else {
            return Err(AccessError::internal_error("secret record built without a key"));
        };
        let info = SecretInformation {
            name: template.name,
            created_at: now.timestamp_millis(),
            test_key_id: test.id.clone(),
            live_key_id: live.id.clone(),
            test_key,
            live_key,
        };

        self.store
            .insert(vec![test, live])
            .await
            .map_err(store_error_to_access)?;
        Ok(info)
    }
}

/// Shared fields of the two records in a secret pair.
#[derive(Debug)]
struct SecretTemplate {
    name: String,
    namespace: String,
    event_type: Option<String>,
    group: Option<String>,
    ownership: Ownership,
    paths: Option<AccessPaths>,
}

/// Both environments of a named secret must exist. Returns the live record.
fn ensure_both_environments(records: &[EventAccessRecord]) -> Result<&EventAccessRecord, AccessError> {
    if records.is_empty() {
        return Err(AccessError::secret_not_found("Secret does not exist"));
    }
    let find = |environment| records.iter().find(|r| r.environment == environment);
    if find(Environment::Test).is_none() {
        return Err(AccessError::secret_not_found(
            "Secret does not have a test environment",
        ));
    }
    find(Environment::Live).ok_or_else(|| {
        AccessError::secret_not_found("Secret does not have a live environment")
    })
}

fn identifier_information(record: &EventAccessRecord, identifier: ValidAccessKey) -> IdentifierInformation {
    IdentifierInformation {
        id: record.id.clone(),
        identifier,
        environment: record.environment,
        created_at: record.created_at,
    }
}

fn secret_listing(record: &EventAccessRecord, redacted: bool) -> Option<SecretListing> {
    let AccessCredential::Secret { name, slug, secret } = &record.credential else {
        return None;
    };
    Some(SecretListing {
        id: record.id.clone(),
        name: name.clone(),
        slug: slug.clone(),
        event_type: record.event_type.clone(),
        group: record.group.clone(),
        environment: record.environment,
        created_at: record.created_at,
        secret: if redacted {
            secret.redacted()
        } else {
            secret.as_str().to_owned()
        },
    })
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use keystack_access_model::AccessErrorCode;
    use keystack_access_model::input::WebhookSignaturePayload;
    use keystack_auth::EncryptionPassword;
    use keystack_auth::signature::{SignatureEncoding, create_signature_header};

    use super::*;
    use crate::integrations::SIGNATURE_HEADER;
    use crate::store::{InMemoryRecordStore, StoreError};

    const PASSWORD: &str = "0123456789abcdef0123456789abcdef";

    fn config() -> AccessConfig {
        AccessConfig::new(EncryptionPassword::new(PASSWORD).unwrap())
    }

    fn provider() -> (KeystackAccess, Arc<InMemoryRecordStore>) {
        let store = Arc::new(InMemoryRecordStore::new());
        let access = KeystackAccess::new(config(), Arc::clone(&store) as Arc<dyn AccessRecordStore>);
        (access, store)
    }

    fn tenant_ctx(tenant: &str) -> RequestContext {
        RequestContext::authenticated(
            "req-1",
            RequestIdentity {
                buildable_id: TenantId::new(tenant).unwrap(),
                user_id: tenant.to_owned(),
                source: IdentitySource::TrustedHeader,
            },
        )
    }

    fn create_input(name: &str) -> CreateSecretInput {
        CreateSecretInput {
            name: name.to_owned(),
            event_type: None,
            group: None,
            namespace: None,
        }
    }

    fn identifier_input() -> CreateIdentifierInput {
        CreateIdentifierInput {
            name: "Stripe Payments".to_owned(),
            event_type: "stripe".to_owned(),
            namespace: None,
            paths: AccessPaths {
                id: "_.body.data.object.id".to_owned(),
                event: "_.body.type".to_owned(),
                payload: None,
                timestamp: "_.body.created".to_owned(),
            },
            integration_webhook_id: None,
            integration_secret_key: None,
            environment: Some(Environment::Live),
            active: None,
            identifier: None,
        }
    }

    #[derive(Debug)]
    struct FailingStore;

    #[async_trait]
    impl AccessRecordStore for FailingStore {
        async fn find(
            &self,
            _query: &RecordQuery,
            _page: Option<Page>,
        ) -> Result<Vec<EventAccessRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_owned()))
        }

        async fn count(&self, _query: &RecordQuery) -> Result<usize, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_owned()))
        }

        async fn insert(&self, _records: Vec<EventAccessRecord>) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_owned()))
        }

        async fn update_many(
            &self,
            _query: &RecordQuery,
            _update: &RecordUpdate,
        ) -> Result<usize, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_owned()))
        }
    }

    #[tokio::test]
    async fn test_should_verify_orders_webhook_secret() {
        let (access, _store) = provider();
        let ctx = tenant_ctx("t_1");
        let info = access
            .handle_create_secret(&ctx, create_input("Orders Webhook"))
            .await
            .unwrap();
        assert!(info.live_key.as_str().starts_with("sk_live_"));
        assert!(info.test_key.as_str().starts_with("sk_test_"));

        let view = access
            .handle_verify_secret(
                &RequestContext::default(),
                VerifySecretInput {
                    secret: info.live_key.as_str().to_owned(),
                },
            )
            .await
            .unwrap();
        assert_eq!(view.group, "orders-webhook");
        assert_eq!(view.event_type, "custom");
        assert_eq!(view.environment, Environment::Live);
        assert_eq!(view.ownership.buildable_id.as_str(), "t_1");
        assert_eq!(view.name.as_deref(), Some("Orders Webhook"));
    }

    #[tokio::test]
    async fn test_should_return_not_found_on_empty_store() {
        let (access, store) = provider();
        let other = provider().0;
        let info = other
            .handle_create_secret(&tenant_ctx("t_1"), create_input("Orders Webhook"))
            .await
            .unwrap();
        assert!(store.is_empty());

        let err = access
            .handle_verify_secret(
                &RequestContext::default(),
                VerifySecretInput {
                    secret: info.live_key.as_str().to_owned(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, AccessErrorCode::NotFound);
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_should_not_hit_store_for_unprefixed_secret() {
        let access = KeystackAccess::new(config(), Arc::new(FailingStore));
        let err = access
            .handle_verify_secret(
                &RequestContext::default(),
                VerifySecretInput {
                    secret: "not-a-key".to_owned(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, AccessErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_should_serve_cached_secret_after_store_reset() {
        let (access, store) = provider();
        let info = access
            .handle_create_secret(&tenant_ctx("t_1"), create_input("Orders"))
            .await
            .unwrap();
        let secret = info.test_key.as_str();

        assert!(access.verify_via_secret(secret).await.is_ok());
        store.reset();
        assert!(access.verify_via_secret(secret).await.is_ok());
    }

    #[tokio::test]
    async fn test_should_require_exactly_one_credential() {
        let (access, _store) = provider();
        let ctx = RequestContext::default();

        let err = access
            .handle_verify(&ctx, VerifyInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.message, "No identifier or secret provided.");
        assert_eq!(err.status_code, http::StatusCode::UNPROCESSABLE_ENTITY);

        let both = VerifyInput {
            secret: Some("sk_test_a".to_owned()),
            identifier: Some("id_test_b".to_owned()),
        };
        let err = access.handle_verify(&ctx, both).await.unwrap_err();
        assert_eq!(err.message, "Cannot provide both an identifier and secret.");
    }

    #[tokio::test]
    async fn test_should_verify_identifier_without_store() {
        let (issuer, _store) = provider();
        let info = issuer
            .handle_create_identifier(&tenant_ctx("t_1"), identifier_input())
            .await
            .unwrap();

        let access = KeystackAccess::new(config(), Arc::new(FailingStore));
        let out = access
            .handle_verify(
                &RequestContext::default(),
                VerifyInput {
                    secret: None,
                    identifier: Some(info.identifier.as_str().to_owned()),
                },
            )
            .await
            .unwrap();
        let VerifyOutput::Identifier(out) = out else {
            panic!("expected identifier output");
        };
        assert_eq!(out.topic_prefix, "v1/t_1.default.live.stripe.stripe-payments");
        assert_eq!(out.paths.event, "_.body.type");
        assert_eq!(out.data.buildable_id.as_str(), "t_1");
    }

    #[tokio::test]
    async fn test_should_reject_bad_identifiers_uniformly() {
        let (access, _store) = provider();
        let info = access
            .handle_create_identifier(&tenant_ctx("t_1"), identifier_input())
            .await
            .unwrap();

        let other = AccessConfig::new(EncryptionPassword::new("fedcba9876543210fedcba9876543210").unwrap());
        let foreign = KeystackAccess::new(other, Arc::new(InMemoryRecordStore::new()));

        let inputs = ["", "id_live_", "garbage", "id_live_JSUl"];
        let mut messages: Vec<String> = inputs
            .iter()
            .map(|i| {
                access
                    .handle_verify_identifier(VerifyIdentifierInput {
                        identifier: (*i).to_owned(),
                    })
                    .unwrap_err()
                    .message
            })
            .collect();
        messages.push(
            foreign
                .handle_verify_identifier(VerifyIdentifierInput {
                    identifier: info.identifier.as_str().to_owned(),
                })
                .unwrap_err()
                .message,
        );
        assert!(messages.iter().all(|m| m == "Access denied. Invalid access key"));
    }

    #[tokio::test]
    async fn test_should_surface_store_failure_as_fatal() {
        let access = KeystackAccess::new(config(), Arc::new(FailingStore));
        let issuer = provider().0;
        let info = issuer
            .handle_create_secret(&tenant_ctx("t_1"), create_input("Orders"))
            .await
            .unwrap();

        let outcome = access.verify_via_secret(info.live_key.as_str()).await;
        assert!(outcome.is_fatal());

        let outcome = access
            .authorize(PresentedCredential::Secret(info.live_key.as_str().to_owned()))
            .await;
        let Outcome::Fatal(err) = outcome else {
            panic!("expected fatal outcome");
        };
        assert_eq!(err.status_code, http::StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_should_authorize_from_secret_and_identifier() {
        let (access, _store) = provider();
        let ctx = tenant_ctx("t_1");
        let secret = access
            .handle_create_secret(&ctx, create_input("Orders"))
            .await
            .unwrap();
        let identifier = access
            .handle_create_identifier(&ctx, identifier_input())
            .await
            .unwrap();

        let Outcome::Ok(identity) = access
            .authorize(PresentedCredential::Secret(secret.live_key.as_str().to_owned()))
            .await
        else {
            panic!("expected secret identity");
        };
        assert_eq!(identity.buildable_id.as_str(), "t_1");
        assert_eq!(identity.source, IdentitySource::Secret);

        let Outcome::Ok(identity) = access
            .authorize(PresentedCredential::Identifier(
                identifier.identifier.as_str().to_owned(),
            ))
            .await
        else {
            panic!("expected identifier identity");
        };
        assert_eq!(identity.source, IdentitySource::Identifier);

        let Outcome::Recoverable(err) = access
            .authorize(PresentedCredential::Secret("sk_live_unknown".to_owned()))
            .await
        else {
            panic!("expected recoverable outcome");
        };
        assert_eq!(err.code, AccessErrorCode::InvalidSecret);

        let Outcome::Recoverable(err) = access
            .authorize(PresentedCredential::Identifier("id_live_nope".to_owned()))
            .await
        else {
            panic!("expected recoverable outcome");
        };
        assert_eq!(err.code, AccessErrorCode::InvalidIdentifier);
    }

    #[tokio::test]
    async fn test_should_enforce_key_quota() {
        let store = Arc::new(InMemoryRecordStore::new());
        let mut config = config();
        config.max_secret_keys = 2;
        let access = KeystackAccess::new(config, store);
        let ctx = tenant_ctx("t_1");

        access.handle_create_secret(&ctx, create_input("A")).await.unwrap();
        let err = access
            .handle_create_secret(&ctx, create_input("B"))
            .await
            .unwrap_err();
        assert_eq!(err.code, AccessErrorCode::MaximumApiKeysReached);
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_should_not_exceed_quota_with_a_pair() {
        let store = Arc::new(InMemoryRecordStore::new());
        let mut config = config();
        config.max_secret_keys = 3;
        let access = KeystackAccess::new(config, Arc::clone(&store) as Arc<dyn AccessRecordStore>);
        let ctx = tenant_ctx("t_1");

        access.handle_create_secret(&ctx, create_input("A")).await.unwrap();
        let err = access
            .handle_create_secret(&ctx, create_input("B"))
            .await
            .unwrap_err();
        assert_eq!(err.code, AccessErrorCode::MaximumApiKeysReached);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_should_reject_duplicate_and_empty_names() {
        let (access, _store) = provider();
        let ctx = tenant_ctx("t_1");
        access.handle_create_secret(&ctx, create_input("Orders")).await.unwrap();

        let err = access
            .handle_create_secret(&ctx, create_input("Orders"))
            .await
            .unwrap_err();
        assert_eq!(err.code, AccessErrorCode::InvalidParameters);

        let err = access
            .handle_create_secret(&ctx, create_input("  "))
            .await
            .unwrap_err();
        assert_eq!(err.code, AccessErrorCode::InvalidParameters);

        // Other tenants may reuse the name.
        assert!(
            access
                .handle_create_secret(&tenant_ctx("t_2"), create_input("Orders"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_should_require_identity_for_management() {
        let (access, _store) = provider();
        let err = access
            .handle_create_secret(&RequestContext::default(), create_input("Orders"))
            .await
            .unwrap_err();
        assert_eq!(err.code, AccessErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn test_should_list_redacted_secrets_by_default() {
        let (access, _store) = provider();
        let ctx = tenant_ctx("t_1");
        access.handle_create_secret(&ctx, create_input("A")).await.unwrap();
        access.handle_create_secret(&ctx, create_input("B")).await.unwrap();
        access
            .handle_create_secret(&tenant_ctx("t_2"), create_input("C"))
            .await
            .unwrap();

        let out = access
            .handle_list_secrets(&ctx, ListSecretsInput::default())
            .await
            .unwrap();
        assert_eq!(out.total, 4);
        assert_eq!(out.rows.len(), 4);
        assert_eq!(out.page, 1);
        assert_eq!(out.page_size, 20);
        assert!(out.rows.iter().all(|r| r.secret.contains("...")));

        let out = access
            .handle_list_secrets(
                &ctx,
                ListSecretsInput {
                    page: Some(0),
                    page_size: Some(3),
                    redacted: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(out.page, 1);
        assert_eq!(out.rows.len(), 3);

        let out = access
            .handle_list_secrets(
                &ctx,
                ListSecretsInput {
                    page: Some(2),
                    page_size: Some(3),
                    redacted: Some(false),
                },
            )
            .await
            .unwrap();
        assert_eq!(out.rows.len(), 1);
        assert!(out.rows[0].secret.starts_with("sk_"));
        assert!(!out.rows[0].secret.contains("..."));
    }

    #[tokio::test]
    async fn test_should_get_secret_within_tenant_only() {
        let (access, _store) = provider();
        let info = access
            .handle_create_secret(&tenant_ctx("t_1"), create_input("Orders"))
            .await
            .unwrap();

        let out = access
            .handle_get_secret(
                &tenant_ctx("t_1"),
                GetSecretInput {
                    id: info.live_key_id.clone(),
                },
            )
            .await
            .unwrap();
        assert_eq!(out.secret, info.live_key);

        let err = access
            .handle_get_secret(
                &tenant_ctx("t_2"),
                GetSecretInput {
                    id: info.live_key_id,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, AccessErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_should_delete_both_environments_and_clear_cache() {
        let (access, _store) = provider();
        let ctx = tenant_ctx("t_1");
        let info = access.handle_create_secret(&ctx, create_input("Orders")).await.unwrap();
        assert!(access.verify_via_secret(info.live_key.as_str()).await.is_ok());

        let out = access
            .handle_delete_secret(
                &ctx,
                DeleteSecretInput {
                    name: "Orders".to_owned(),
                },
            )
            .await
            .unwrap();
        assert_eq!(out.deleted, 2);

        let Outcome::Recoverable(err) = access.verify_via_secret(info.live_key.as_str()).await
        else {
            panic!("expected recoverable outcome");
        };
        assert_eq!(err.code, AccessErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_should_report_missing_environments_on_delete() {
        let (access, store) = provider();
        let ctx = tenant_ctx("t_1");

        let err = access
            .handle_delete_secret(
                &ctx,
                DeleteSecretInput {
                    name: "Nope".to_owned(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, AccessErrorCode::SecretNotFound);
        assert_eq!(err.message, "Secret does not exist");

        let info = access.handle_create_secret(&ctx, create_input("Orders")).await.unwrap();
        store
            .update_many(
                &RecordQuery::default().ids([info.test_key_id]),
                &RecordUpdate::soft_delete(1),
            )
            .await
            .unwrap();
        let err = access
            .handle_delete_secret(
                &ctx,
                DeleteSecretInput {
                    name: "Orders".to_owned(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.message, "Secret does not have a test environment");
    }

    #[tokio::test]
    async fn test_should_rotate_secret_pair() {
        let (access, _store) = provider();
        let ctx = tenant_ctx("t_1");
        let mut input = create_input("Orders");
        input.group = Some("billing".to_owned());
        let old = access.handle_create_secret(&ctx, input).await.unwrap();

        let new = access
            .handle_rotate_secret(
                &ctx,
                RotateSecretInput {
                    name: "Orders".to_owned(),
                },
            )
            .await
            .unwrap();
        assert_ne!(new.live_key, old.live_key);

        assert!(!access.verify_via_secret(old.live_key.as_str()).await.is_ok());
        let Outcome::Ok(view) = access.verify_via_secret(new.live_key.as_str()).await else {
            panic!("expected rotated key to verify");
        };
        assert_eq!(view.group, "billing");
    }

    #[tokio::test]
    async fn test_should_reissue_existing_identifier_idempotently() {
        let (access, store) = provider();
        let ctx = tenant_ctx("t_1");
        let first = access
            .handle_create_identifier(&ctx, identifier_input())
            .await
            .unwrap();

        let mut input = identifier_input();
        input.identifier = Some(first.identifier.as_str().to_owned());
        let second = access.handle_create_identifier(&ctx, input).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(store.len(), 1);

        let mut input = identifier_input();
        input.identifier = Some("sk_live_abc".to_owned());
        let err = access.handle_create_identifier(&ctx, input).await.unwrap_err();
        assert_eq!(err.code, AccessErrorCode::InvalidParameters);
    }

    #[tokio::test]
    async fn test_should_refuse_identifier_owned_by_another_tenant() {
        let (access, store) = provider();
        let owned = access
            .handle_create_identifier(&tenant_ctx("t_1"), identifier_input())
            .await
            .unwrap();

        let mut input = identifier_input();
        input.identifier = Some(owned.identifier.as_str().to_owned());
        let err = access
            .handle_create_identifier(&tenant_ctx("t_2"), input)
            .await
            .unwrap_err();
        assert_eq!(err.code, AccessErrorCode::InvalidParameters);
        assert_eq!(err.message, "Invalid identifier.");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_should_not_accept_deleted_secret_as_identifier() {
        let (access, _store) = provider();
        let ctx = tenant_ctx("t_1");
        let info = access.handle_create_secret(&ctx, create_input("Orders")).await.unwrap();
        let live_key = info.live_key.as_str().to_owned();

        let Outcome::Recoverable(err) = access
            .authorize(PresentedCredential::Identifier(live_key.clone()))
            .await
        else {
            panic!("secret key must not pass as identifier");
        };
        assert_eq!(err.code, AccessErrorCode::InvalidIdentifier);

        access
            .handle_delete_secret(
                &ctx,
                DeleteSecretInput {
                    name: "Orders".to_owned(),
                },
            )
            .await
            .unwrap();

        assert!(!access.authorize(PresentedCredential::Secret(live_key.clone())).await.is_ok());
        assert!(
            !access
                .authorize(PresentedCredential::Identifier(live_key.clone()))
                .await
                .is_ok()
        );

        let err = access
            .handle_verify_identifier(VerifyIdentifierInput {
                identifier: live_key.clone(),
            })
            .unwrap_err();
        assert_eq!(err.code, AccessError::unauthorized().code);
        assert_eq!(err.message, "Access denied. Invalid access key");
        assert!(!access.verify_via_identifier(&live_key).is_ok());
    }

    #[test]
    fn test_should_report_signature_results() {
        let (access, _store) = provider();
        let now = Utc::now().timestamp();
        let mut payload = WebhookSignaturePayload {
            body: r#"{"id":"evt_1"}"#.to_owned(),
            ..WebhookSignaturePayload::default()
        };
        payload.headers.insert(
            SIGNATURE_HEADER.to_owned(),
            create_signature_header(now, &payload.body, "whsec", SignatureEncoding::Hex),
        );

        let input = |secret: &str| VerifySignatureInput {
            payload: payload.clone(),
            integration_type: "custom".to_owned(),
            secret: Some(secret.to_owned()),
        };
        assert!(access.handle_verify_signature(input("whsec")).unwrap().verified);
        assert!(!access.handle_verify_signature(input("wrong")).unwrap().verified);

        let err = access
            .handle_verify_signature(VerifySignatureInput {
                integration_type: "unknown".to_owned(),
                ..input("whsec")
            })
            .unwrap_err();
        assert_eq!(err.status_code, http::StatusCode::UNPROCESSABLE_ENTITY);
    }
}
