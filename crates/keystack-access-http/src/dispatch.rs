//! Event access handler trait and operation dispatch.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use keystack_access_model::error::{AccessError, AccessErrorCode};
use keystack_access_model::identity::{PresentedCredential, RequestContext, RequestIdentity};
use keystack_access_model::operations::AccessOperation;
use keystack_access_model::outcome::Outcome;

use crate::body::AccessResponseBody;

/// Boxed future returned by [`AccessHandler::handle_operation`].
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<AccessResponseBody>, AccessError>> + Send>>;

/// Boxed future returned by [`AccessHandler::authorize`].
pub type AuthorizeFuture = Pin<Box<dyn Future<Output = Outcome<RequestIdentity>> + Send>>;

/// Trait that the event access business logic must implement.
///
/// The handler receives the resolved action, the request context carrying the
/// caller identity, and a JSON body in which path and query parameters have
/// already been merged.
pub trait AccessHandler: Send + Sync + 'static {
    /// Handle an action and produce an HTTP response.
    fn handle_operation(
        &self,
        op: AccessOperation,
        ctx: RequestContext,
        body: Bytes,
    ) -> HandlerFuture;

    /// Resolve a presented credential to a caller identity.
    fn authorize(&self, credential: PresentedCredential) -> AuthorizeFuture;
}

/// Dispatch an action to the handler.
pub async fn dispatch_operation<H: AccessHandler>(
    handler: &H,
    op: AccessOperation,
    ctx: RequestContext,
    body: Bytes,
) -> Result<http::Response<AccessResponseBody>, AccessError> {
    tracing::debug!(operation = %op, request_id = %ctx.request_id, "dispatching event access operation");
    handler.handle_operation(op, ctx, body).await
}

/// Default handler that rejects everything.
#[derive(Debug, Clone, Default)]
pub struct NotImplementedHandler;

impl AccessHandler for NotImplementedHandler {
    fn handle_operation(
        &self,
        op: AccessOperation,
        _ctx: RequestContext,
        _body: Bytes,
    ) -> HandlerFuture {
        Box::pin(async move {
            Err(AccessError::with_message(
                AccessErrorCode::UnknownOperation,
                format!("{op} is not implemented"),
            ))
        })
    }

    fn authorize(&self, _credential: PresentedCredential) -> AuthorizeFuture {
        Box::pin(async { Outcome::Recoverable(AccessError::unauthorized()) })
    }
}
