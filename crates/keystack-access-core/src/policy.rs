//! Issuance policy.

use keystack_access_model::AccessError;

/// Caps the number of non-deleted secret records a tenant may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyQuotaPolicy {
    max_keys: usize,
}

impl KeyQuotaPolicy {
    #[must_use]
    pub fn new(max_keys: usize) -> Self {
        Self { max_keys }
    }

    #[must_use]
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    /// Refuse issuing `requested` more keys when that would exceed the cap.
    pub fn check(&self, existing: usize, requested: usize) -> Result<(), AccessError> {
        if existing.saturating_add(requested) > self.max_keys {
            return Err(AccessError::maximum_api_keys_reached(self.max_keys));
        }
        Ok(())
    }
}
