//! Integration tests for Keystack server.
//!
//! These tests require a running Keystack server at `localhost:4580`
//! started with `TRUST_TENANT_HEADER=true`.
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p keystack-integration -- --ignored
//! ```

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("KEYSTACK_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4580".to_owned())
}

/// Create an HTTP client for the local server.
#[must_use]
pub fn http_client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// Build a full URL for an event access route.
#[must_use]
pub fn access_url(path: &str) -> String {
    format!("{}/v1/event-access{path}", endpoint_url())
}

/// Generate a unique tenant id so tests don't interfere with each other.
#[must_use]
pub fn test_tenant(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

mod test_event_access;
mod test_health;
