//! Conversions from internal errors into [`AccessError`].

use keystack_access_model::AccessError;

use crate::store::StoreError;

/// Convert a store error into a service error.
///
/// Takes `e` by value because this is used as a closure argument to `.map_err()`.
#[must_use]
#[allow(clippy::needless_pass_by_value)]
pub fn store_error_to_access(e: StoreError) -> AccessError {
    match e {
        StoreError::Unavailable(_) => {
            AccessError::service_unavailable("Event access store is unavailable").with_source(e)
        }
        StoreError::Conflict(_) => AccessError::internal_error(e.to_string()).with_source(e),
    }
}
