//! Event access handler bridging HTTP to business logic.

use std::sync::Arc;

use bytes::Bytes;
use keystack_access_http::body::AccessResponseBody;
use keystack_access_http::dispatch::{AccessHandler, AuthorizeFuture, HandlerFuture};
use keystack_access_http::response::json_response;
use keystack_access_model::error::AccessError;
use keystack_access_model::identity::{PresentedCredential, RequestContext};
use keystack_access_model::operations::AccessOperation;

use crate::provider::KeystackAccess;

/// Handler that bridges the HTTP layer to the event access provider.
#[derive(Debug)]
pub struct KeystackAccessHandler {
    provider: Arc<KeystackAccess>,
}

impl KeystackAccessHandler {
    /// Create a new handler wrapping a provider.
    #[must_use]
    pub fn new(provider: Arc<KeystackAccess>) -> Self {
        Self { provider }
    }
}

impl AccessHandler for KeystackAccessHandler {
    fn handle_operation(
        &self,
        op: AccessOperation,
        ctx: RequestContext,
        body: Bytes,
    ) -> HandlerFuture {
        let provider = Arc::clone(&self.provider);
        Box::pin(async move { dispatch(provider.as_ref(), op, &ctx, &body).await })
    }

    fn authorize(&self, credential: PresentedCredential) -> AuthorizeFuture {
        let provider = Arc::clone(&self.provider);
        Box::pin(async move { provider.authorize(credential).await })
    }
}

/// Dispatch an action to the matching provider method.
async fn dispatch(
    provider: &KeystackAccess,
    op: AccessOperation,
    ctx: &RequestContext,
    body: &[u8],
) -> Result<http::Response<AccessResponseBody>, AccessError> {
    let request_id = ctx.request_id.as_str();

    match op {
        AccessOperation::Verify => {
            let input = deserialize(body)?;
            let output = provider.handle_verify(ctx, input).await?;
            serialize(&output, request_id)
        }
        AccessOperation::VerifySecret => {
            let input = deserialize(body)?;
            let output = provider.handle_verify_secret(ctx, input).await?;
            serialize(&output, request_id)
        }
        AccessOperation::VerifyIdentifier => {
            let input = deserialize(body)?;
            let output = provider.handle_verify_identifier(input)?;
            serialize(&output, request_id)
        }
        AccessOperation::VerifySignature => {
            let input = deserialize(body)?;
            let output = provider.handle_verify_signature(input)?;
            serialize(&output, request_id)
        }
        AccessOperation::CreateSecret => {
            let input = deserialize(body)?;
            let output = provider.handle_create_secret(ctx, input).await?;
            serialize(&output, request_id)
        }
        AccessOperation::CreateIdentifier => {
            let input = deserialize(body)?;
            let output = provider.handle_create_identifier(ctx, input).await?;
            serialize(&output, request_id)
        }
        AccessOperation::ListSecrets => {
            let input = deserialize(body)?;
            let output = provider.handle_list_secrets(ctx, input).await?;
            serialize(&output, request_id)
        }
        AccessOperation::GetSecret => {
            let input = deserialize(body)?;
            let output = provider.handle_get_secret(ctx, input).await?;
            serialize(&output, request_id)
        }
        AccessOperation::DeleteSecret => {
            let input = deserialize(body)?;
            let output = provider.handle_delete_secret(ctx, input).await?;
            serialize(&output, request_id)
        }
        AccessOperation::RotateSecret => {
            let input = deserialize(body)?;
            let output = provider.handle_rotate_secret(ctx, input).await?;
            serialize(&output, request_id)
        }
    }
}

/// Deserialize a JSON request body into the input type.
fn deserialize<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, AccessError> {
    serde_json::from_slice(body).map_err(|e| {
        AccessError::invalid_parameters(format!("Failed to deserialize request body: {e}"))
    })
}

/// Serialize an output type into a JSON HTTP response.
fn serialize<T: serde::Serialize>(
    output: &T,
    request_id: &str,
) -> Result<http::Response<AccessResponseBody>, AccessError> {
    let json = serde_json::to_vec(output)
        .map_err(|e| AccessError::internal_error(format!("Failed to serialize response: {e}")))?;
    Ok(json_response(json, request_id))
}
