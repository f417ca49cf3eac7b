//! Caller identity attached to a request by the authorization hook.

use keystack_core::{Ownership, TenantId};

use crate::error::AccessError;

/// How the caller proved its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// `sk_*` key found in the record store.
    Secret,
    /// `id_*` key verified in-process.
    Identifier,
    /// Tenant header set by a trusted upstream gateway.
    TrustedHeader,
}

/// A credential presented in request headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentedCredential {
    /// `sk_*` key.
    Secret(String),
    /// `id_*` key.
    Identifier(String),
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    /// Tenant the caller acts for.
    pub buildable_id: TenantId,
    /// Acting user; the tenant id when unknown.
    pub user_id: String,
    /// How the identity was established.
    pub source: IdentitySource,
}

impl RequestIdentity {
    /// Ownership stamped onto records the caller creates.
    #[must_use]
    pub fn ownership(&self) -> Ownership {
        Ownership {
            buildable_id: self.buildable_id.clone(),
            client_id: None,
            organization_id: None,
            project_id: None,
            user_id: Some(self.user_id.clone()),
        }
        .normalized()
    }
}

/// Per-request context passed from the HTTP layer to the service.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Request id echoed in response headers.
    pub request_id: String,
    /// Caller identity, if established.
    pub identity: Option<RequestIdentity>,
}

impl RequestContext {
    /// Context for an anonymous request.
    #[must_use]
    pub fn anonymous(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            identity: None,
        }
    }

    /// Context for an authenticated request.
    #[must_use]
    pub fn authenticated(request_id: impl Into<String>, identity: RequestIdentity) -> Self {
        Self {
            request_id: request_id.into(),
            identity: Some(identity),
        }
    }

    /// The identity, or `unauthorized`.
    pub fn require_identity(&self) -> Result<&RequestIdentity, AccessError> {
        self.identity.as_ref().ok_or_else(AccessError::unauthorized)
    }
}
