//! Authorization hook run before dispatch.
//!
//! Credential headers are resolved in order:
//!
//! 1. `x-keystack-secret`: store-backed secret lookup
//! 2. `x-keystack-identifier`: in-process identifier verification
//! 3. `x-keystack-tenant` (+ `x-keystack-user`): trusted only when the
//!    upstream gateway is trusted to set it
//!
//! Public actions run without an identity.

use keystack_access_model::error::AccessError;
use keystack_access_model::identity::{
    IdentitySource, PresentedCredential, RequestContext, RequestIdentity,
};
use keystack_access_model::operations::AccessOperation;
use keystack_access_model::outcome::Outcome;
use keystack_core::TenantId;
use tracing::{debug, error, warn};

use crate::dispatch::AccessHandler;

/// Header carrying an `sk_*` key.
pub const SECRET_HEADER: &str = "x-keystack-secret";

/// Header carrying an `id_*` key.
pub const IDENTIFIER_HEADER: &str = "x-keystack-identifier";

/// Header carrying a tenant id set by a trusted gateway.
pub const TENANT_HEADER: &str = "x-keystack-tenant";

/// Header carrying the acting user set by a trusted gateway.
pub const USER_HEADER: &str = "x-keystack-user";

/// Read the presented credential, if any. Both at once is rejected.
pub fn extract_credential(
    headers: &http::HeaderMap,
) -> Result<Option<PresentedCredential>, AccessError> {
    let secret = header_str(headers, SECRET_HEADER)?;
    let identifier = header_str(headers, IDENTIFIER_HEADER)?;
    match (secret, identifier) {
        (Some(_), Some(_)) => Err(AccessError::invalid_parameters(
            "Cannot provide both an identifier and secret.",
        )),
        (Some(secret), None) => Ok(Some(PresentedCredential::Secret(secret.to_owned()))),
        (None, Some(identifier)) => Ok(Some(PresentedCredential::Identifier(identifier.to_owned()))),
        (None, None) => Ok(None),
    }
}

/// Build the request context for `op`.
pub async fn authorize_request<H: AccessHandler>(
    handler: &H,
    headers: &http::HeaderMap,
    op: AccessOperation,
    trust_tenant_header: bool,
    request_id: &str,
) -> Result<RequestContext, AccessError> {
    if let Some(credential) = extract_credential(headers)? {
        return match handler.authorize(credential).await {
            Outcome::Ok(identity) => {
                debug!(tenant = %identity.buildable_id, source = ?identity.source, "request authorized");
                Ok(RequestContext::authenticated(request_id, identity))
            }
            Outcome::Recoverable(err) => {
                warn!(operation = %op, request_id, error = %err, "credential rejected");
                Err(err)
            }
            Outcome::Fatal(err) => {
                error!(operation = %op, request_id, error = %err, "authorization failed");
                Err(err)
            }
        };
    }

    if trust_tenant_header {
        if let Some(tenant) = header_str(headers, TENANT_HEADER)? {
            let buildable_id = TenantId::new(tenant)
                .map_err(|e| AccessError::invalid_parameters(e.to_string()))?;
            let user_id = header_str(headers, USER_HEADER)?
                .map_or_else(|| buildable_id.as_str().to_owned(), ToOwned::to_owned);
            let identity = RequestIdentity {
                buildable_id,
                user_id,
                source: IdentitySource::TrustedHeader,
            };
            return Ok(RequestContext::authenticated(request_id, identity));
        }
    }

    if op.is_public() {
        return Ok(RequestContext::anonymous(request_id));
    }
    warn!(operation = %op, request_id, "missing credentials");
    Err(AccessError::unauthorized())
}

fn header_str<'a>(headers: &'a http::HeaderMap, name: &str) -> Result<Option<&'a str>, AccessError> {
    headers
        .get(name)
        .map(|v| {
            v.to_str()
                .map(str::trim)
                .map_err(|_| AccessError::invalid_parameters(format!("Invalid {name} header")))
        })
        .transpose()
        .map(|v| v.filter(|s| !s.is_empty()))
}
