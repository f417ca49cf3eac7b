//! TTL cache for successful secret lookups.
//!
//! Entries are keyed by `(caller tenant, secret)`. Only hits are cached, so a
//! newly created secret is visible immediately; a deleted one may stay
//! accepted until its entry expires in processes that did not perform the
//! delete.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use keystack_access_model::SecretRecordView;
use keystack_core::TenantId;

type CacheKey = (Option<TenantId>, String);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: SecretRecordView,
    expires_at: Instant,
}

/// Verified-secret cache.
#[derive(Debug)]
pub struct SecretCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl SecretCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Cached view, if present and not expired.
    #[must_use]
    pub fn get(&self, tenant: Option<&TenantId>, secret: &str) -> Option<SecretRecordView> {
        let key = (tenant.cloned(), secret.to_owned());
        let entry = self.entries.get(&key)?;
        if Instant::now() < entry.expires_at {
            return Some(entry.value.clone());
        }
        drop(entry);
        self.entries.remove(&key);
        None
    }

    pub fn insert(&self, tenant: Option<&TenantId>, secret: &str, value: SecretRecordView) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.insert(
            (tenant.cloned(), secret.to_owned()),
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drop expired entries.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| now < entry.expires_at);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
