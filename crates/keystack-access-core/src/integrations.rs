//! Integration handlers for webhook signature checks.
//!
//! Handlers are registered under a string type tag (`custom`, `stripe`, ...)
//! and looked up per request.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use keystack_access_model::input::WebhookSignaturePayload;
use keystack_auth::signature::{SignatureEncoding, verify_signature_header};
use parking_lot::RwLock;

/// Header carrying the signature for the built-in HMAC handler.
pub const SIGNATURE_HEADER: &str = "x-keystack-signature";

/// Type tag of the built-in HMAC handler.
pub const CUSTOM_INTEGRATION: &str = "custom";

/// Checks the signature of a webhook delivery.
pub trait WebhookSignatureVerifier: Send + Sync + fmt::Debug {
    /// `Ok` if the delivery is authentic.
    fn verify_webhook_signature(
        &self,
        payload: &WebhookSignaturePayload,
        secret: Option<&str>,
    ) -> anyhow::Result<()>;
}

/// HMAC-SHA256 `t=<ts>,v1=<sig>` verifier.
#[derive(Debug, Clone)]
pub struct HmacSignatureVerifier {
    header: String,
    encoding: SignatureEncoding,
    tolerance: Option<Duration>,
}

impl HmacSignatureVerifier {
    #[must_use]
    pub fn new(header: impl Into<String>, encoding: SignatureEncoding) -> Self {
        Self {
            header: header.into(),
            encoding,
            tolerance: None,
        }
    }

    /// Reject signatures older (or further in the future) than `tolerance`.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
}

impl WebhookSignatureVerifier for HmacSignatureVerifier {
    fn verify_webhook_signature(
        &self,
        payload: &WebhookSignaturePayload,
        secret: Option<&str>,
    ) -> anyhow::Result<()> {
        let secret = secret.context("missing webhook secret")?;
        let header = payload
            .signature
            .as_deref()
            .or_else(|| payload.headers.get(&self.header).map(String::as_str))
            .with_context(|| format!("missing {} header", self.header))?;

        let timestamp = verify_signature_header(header, &payload.body, secret, self.encoding)?;

        if let Some(tolerance) = self.tolerance {
            let age = chrono::Utc::now().timestamp().abs_diff(timestamp);
            if age > tolerance.as_secs() {
                bail!("signature timestamp outside tolerance ({age}s)");
            }
        }
        Ok(())
    }
}

/// Type tag to handler map.
#[derive(Debug, Default)]
pub struct IntegrationRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn WebhookSignatureVerifier>>>,
}

impl IntegrationRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `custom` HMAC handler.
    #[must_use]
    pub fn with_defaults(tolerance: Duration) -> Self {
        let registry = Self::new();
        registry.register(
            CUSTOM_INTEGRATION,
            Arc::new(
                HmacSignatureVerifier::new(SIGNATURE_HEADER, SignatureEncoding::Hex)
                    .with_tolerance(tolerance),
            ),
        );
        registry
    }

    /// Register or replace the handler for `integration_type`.
    pub fn register(
        &self,
        integration_type: impl Into<String>,
        handler: Arc<dyn WebhookSignatureVerifier>,
    ) {
        self.handlers.write().insert(integration_type.into(), handler);
    }

    #[must_use]
    pub fn get(&self, integration_type: &str) -> Option<Arc<dyn WebhookSignatureVerifier>> {
        self.handlers.read().get(integration_type).cloned()
    }

    /// Registered type tags, sorted.
    #[must_use]
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.read().keys().cloned().collect();
        types.sort();
        types
    }
}
