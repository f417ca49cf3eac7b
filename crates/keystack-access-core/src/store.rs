//! Record store contract and the in-memory implementation.

use std::fmt;

use async_trait::async_trait;
use dashmap::DashMap;
use keystack_access_model::{AccessCredential, EventAccessRecord};
use keystack_auth::KeyKind;
use keystack_core::{Environment, TenantId};

/// Record store failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store cannot be reached.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// A write violated a uniqueness constraint.
    #[error("record store conflict: {0}")]
    Conflict(String),
}

/// Equality filter over records. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub ids: Vec<String>,
    pub buildable_id: Option<TenantId>,
    pub kind: Option<KeyKind>,
    pub secret: Option<String>,
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub event_type: Option<String>,
    pub environment: Option<Environment>,
    pub active: Option<bool>,
    pub deleted: Option<bool>,
}

impl RecordQuery {
    /// Non-deleted records of a tenant.
    #[must_use]
    pub fn live_for_tenant(tenant: TenantId) -> Self {
        Self {
            buildable_id: Some(tenant),
            deleted: Some(false),
            ..Self::default()
        }
    }

    /// Restrict to one credential style.
    #[must_use]
    pub fn kind(mut self, kind: KeyKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restrict to a secret name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restrict to record ids.
    #[must_use]
    pub fn ids(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.ids = ids.into_iter().collect();
        self
    }

    /// Whether `record` satisfies every set field.
    #[must_use]
    pub fn matches(&self, record: &EventAccessRecord) -> bool {
        if !self.ids.is_empty() && !self.ids.contains(&record.id) {
            return false;
        }
        if self
            .buildable_id
            .as_ref()
            .is_some_and(|t| *t != record.ownership.buildable_id)
        {
            return false;
        }
        if self.event_type.as_ref().is_some_and(|t| *t != record.event_type)
            || self.environment.is_some_and(|e| e != record.environment)
            || self.active.is_some_and(|a| a != record.active)
            || self.deleted.is_some_and(|d| d != record.deleted)
        {
            return false;
        }

        match &record.credential {
            AccessCredential::Secret { name, secret, .. } => {
                self.kind.is_none_or(|k| k == KeyKind::Secret)
                    && self.identifier.is_none()
                    && self.secret.as_deref().is_none_or(|s| s == secret.as_str())
                    && self.name.as_ref().is_none_or(|n| n == name)
            }
            AccessCredential::Identifier { identifier, .. } => {
                self.kind.is_none_or(|k| k == KeyKind::Identifier)
                    && self.secret.is_none()
                    && self.name.is_none()
                    && self
                        .identifier
                        .as_deref()
                        .is_none_or(|i| i == identifier.as_str())
            }
        }
    }
}

/// Fields a bulk update may change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    pub active: Option<bool>,
    pub deleted: Option<bool>,
    /// Unix milliseconds.
    pub updated_at: i64,
}

impl RecordUpdate {
    /// Soft delete at `now_ms`.
    #[must_use]
    pub fn soft_delete(now_ms: i64) -> Self {
        Self {
            active: None,
            deleted: Some(true),
            updated_at: now_ms,
        }
    }

    fn apply(&self, record: &mut EventAccessRecord) {
        if let Some(active) = self.active {
            record.active = active;
        }
        if let Some(deleted) = self.deleted {
            record.deleted = deleted;
        }
        record.updated_at = Some(self.updated_at);
    }
}

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

/// Persistence for event access records.
///
/// Implementations must return records in a stable order (creation time,
/// then id) so pagination is deterministic.
#[async_trait]
pub trait AccessRecordStore: Send + Sync + fmt::Debug + 'static {
    /// Records matching `query`, optionally paginated.
    async fn find(
        &self,
        query: &RecordQuery,
        page: Option<Page>,
    ) -> Result<Vec<EventAccessRecord>, StoreError>;

    /// The first record matching `query`.
    async fn find_one(&self, query: &RecordQuery) -> Result<Option<EventAccessRecord>, StoreError> {
        Ok(self
            .find(query, Some(Page { offset: 0, limit: 1 }))
            .await?
            .into_iter()
            .next())
    }

    /// Number of records matching `query`.
    async fn count(&self, query: &RecordQuery) -> Result<usize, StoreError>;

    /// Insert all records or none.
    async fn insert(&self, records: Vec<EventAccessRecord>) -> Result<(), StoreError>;

    /// Apply `update` to every record matching `query`; returns the count.
    async fn update_many(&self, query: &RecordQuery, update: &RecordUpdate)
    -> Result<usize, StoreError>;
}

/// `DashMap`-backed store keyed by record id.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: DashMap<String, EventAccessRecord>,
}

impl InMemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, deleted ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop all records (for testing).
    pub fn reset(&self) {
        self.records.clear();
    }

    fn key_in_use(&self, record: &EventAccessRecord) -> bool {
        let key = record.credential.key();
        self.records
            .iter()
            .any(|r| !r.deleted && r.credential.key() == key)
    }
}

#[async_trait]
impl AccessRecordStore for InMemoryRecordStore {
    async fn find(
        &self,
        query: &RecordQuery,
        page: Option<Page>,
    ) -> Result<Vec<EventAccessRecord>, StoreError> {
        let mut matched: Vec<EventAccessRecord> = self
            .records
            .iter()
            .filter(|r| query.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(match page {
            Some(page) => matched
                .into_iter()
                .skip(page.offset)
                .take(page.limit)
                .collect(),
            None => matched,
        })
    }

    async fn count(&self, query: &RecordQuery) -> Result<usize, StoreError> {
        Ok(self.records.iter().filter(|r| query.matches(r.value())).count())
    }

    async fn insert(&self, records: Vec<EventAccessRecord>) -> Result<(), StoreError> {
        for (i, record) in records.iter().enumerate() {
            if self.records.contains_key(&record.id)
                || records[..i].iter().any(|r| r.id == record.id)
            {
                return Err(StoreError::Conflict(format!("duplicate record id {}", record.id)));
            }
            if self.key_in_use(record) {
                return Err(StoreError::Conflict(format!(
                    "key already active on another record ({})",
                    record.credential.key().redacted()
                )));
            }
        }
        for record in records {
            self.records.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn update_many(
        &self,
        query: &RecordQuery,
        update: &RecordUpdate,
    ) -> Result<usize, StoreError> {
        let mut updated = 0;
        for mut entry in self.records.iter_mut() {
            if query.matches(entry.value()) {
                update.apply(entry.value_mut());
                updated += 1;
            }
        }
        Ok(updated)
    }
}
