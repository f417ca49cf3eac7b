//! Event access HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use keystack_access_model::error::AccessError;
use serde_json::{Map, Value};

use crate::auth::authorize_request;
use crate::body::AccessResponseBody;
use crate::dispatch::{AccessHandler, dispatch_operation};
use crate::response::{CONTENT_TYPE, REQUEST_ID_HEADER, error_to_response};
use crate::router::resolve;

/// Configuration for the event access HTTP service.
#[derive(Clone)]
pub struct AccessHttpConfig {
    /// Accept `x-keystack-tenant` from a trusted upstream gateway.
    pub trust_tenant_header: bool,
}

impl std::fmt::Debug for AccessHttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessHttpConfig")
            .field("trust_tenant_header", &self.trust_tenant_header)
            .finish()
    }
}

impl Default for AccessHttpConfig {
    fn default() -> Self {
        Self {
            trust_tenant_header: false,
        }
    }
}

/// Hyper `Service` implementation for event access.
///
/// Wraps an [`AccessHandler`] implementation and routes incoming HTTP
/// requests to the matching action.
#[derive(Debug)]
pub struct AccessHttpService<H: AccessHandler> {
    handler: Arc<H>,
    config: Arc<AccessHttpConfig>,
}

impl<H: AccessHandler> AccessHttpService<H> {
    /// Create a new `AccessHttpService`.
    pub fn new(handler: Arc<H>, config: AccessHttpConfig) -> Self {
        Self {
            handler,
            config: Arc::new(config),
        }
    }
}

impl<H: AccessHandler> Clone for AccessHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H: AccessHandler> hyper::service::Service<http::Request<Incoming>> for AccessHttpService<H> {
    type Response = http::Response<AccessResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let config = Arc::clone(&self.config);
        let request_id = uuid::Uuid::new_v4().to_string();

        Box::pin(async move {
            let (parts, incoming) = req.into_parts();
            let response = match collect_body(incoming).await {
                Ok(body) => process_request(&parts, body, handler.as_ref(), &config, &request_id).await,
                Err(err) => error_to_response(&err, &request_id),
            };
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Process a single request through route, auth, body merge and dispatch.
pub async fn process_request<H: AccessHandler>(
    parts: &http::request::Parts,
    body: Bytes,
    handler: &H,
    config: &AccessHttpConfig,
    request_id: &str,
) -> http::Response<AccessResponseBody> {
    // 1. Route.
    let route = match resolve(&parts.method, parts.uri.path(), parts.uri.query()) {
        Ok(route) => route,
        Err(err) => return error_to_response(&err, request_id),
    };

    // 2. Authorize.
    let ctx = match authorize_request(
        handler,
        &parts.headers,
        route.operation,
        config.trust_tenant_header,
        request_id,
    )
    .await
    {
        Ok(ctx) => ctx,
        Err(err) => return error_to_response(&err, request_id),
    };

    // 3. Merge path and query parameters into the body.
    let body = match merge_params(&body, route.params) {
        Ok(body) => body,
        Err(err) => return error_to_response(&err, request_id),
    };

    // 4. Dispatch.
    match dispatch_operation(handler, route.operation, ctx, body).await {
        Ok(response) => response,
        Err(err) => {
            if err.is_fatal() {
                tracing::error!(operation = %route.operation, request_id, error = %err, "operation failed");
            }
            error_to_response(&err, request_id)
        }
    }
}

/// Merge `params` into a JSON object body. Path parameters win.
fn merge_params(body: &[u8], params: Map<String, Value>) -> Result<Bytes, AccessError> {
    let mut object = if body.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        match serde_json::from_slice(body) {
            Ok(Value::Object(object)) => object,
            Ok(_) => {
                return Err(AccessError::invalid_parameters(
                    "Request body must be a JSON object",
                ));
            }
            Err(e) => {
                return Err(AccessError::invalid_parameters(format!(
                    "Failed to parse request body: {e}"
                )));
            }
        }
    };
    object.extend(params);

    serde_json::to_vec(&object)
        .map(Bytes::from)
        .map_err(|e| AccessError::internal_error(format!("Failed to encode request body: {e}")))
}

/// Collect the incoming body into a single `Bytes` buffer.
async fn collect_body(incoming: Incoming) -> Result<Bytes, AccessError> {
    incoming
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| AccessError::internal_error(format!("Failed to read request body: {e}")))
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<AccessResponseBody>,
    request_id: &str,
) -> http::Response<AccessResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry(REQUEST_ID_HEADER).or_insert(hv);
    }

    headers
        .entry("content-type")
        .or_insert(http::HeaderValue::from_static(CONTENT_TYPE));

    headers.insert("server", http::HeaderValue::from_static("Keystack"));

    response
}
