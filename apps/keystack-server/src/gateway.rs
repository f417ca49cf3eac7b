//! Gateway service in front of the event access service.
//!
//! Health-check probes (`/_keystack/health`, `/_health`, `/health`) are
//! answered here; everything else goes to the event access service.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use hyper::body::Incoming;
use hyper::service::Service;
use keystack_access_http::body::AccessResponseBody;
use keystack_access_http::dispatch::AccessHandler;
use keystack_access_http::response::CONTENT_TYPE;
use keystack_access_http::service::AccessHttpService;

/// Server version reported in health check responses.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Gateway wrapping the event access service.
#[derive(Debug)]
pub struct GatewayService<H: AccessHandler> {
    access: AccessHttpService<H>,
}

impl<H: AccessHandler> GatewayService<H> {
    /// Create a new gateway.
    pub fn new(access: AccessHttpService<H>) -> Self {
        Self { access }
    }
}

impl<H: AccessHandler> Clone for GatewayService<H> {
    fn clone(&self) -> Self {
        Self {
            access: self.access.clone(),
        }
    }
}

impl<H: AccessHandler> Service<http::Request<Incoming>> for GatewayService<H> {
    type Response = http::Response<AccessResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        if is_health_check(req.method(), req.uri().path()) {
            return Box::pin(async { Ok(health_check_response()) });
        }
        self.access.call(req)
    }
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET
        && (path == "/_keystack/health" || path == "/_health" || path == "/health")
}

/// Health check response body.
fn health_check_json() -> serde_json::Value {
    serde_json::json!({
        "services": { "event-access": "running" },
        "version": VERSION,
    })
}

fn health_check_response() -> http::Response<AccessResponseBody> {
    let body = serde_json::to_vec(&health_check_json()).unwrap_or_default();
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("content-type", CONTENT_TYPE)
        .body(AccessResponseBody::from_json(body))
        .expect("static health response should be valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_detect_health_check_paths() {
        assert!(is_health_check(&http::Method::GET, "/_keystack/health"));
        assert!(is_health_check(&http::Method::GET, "/_health"));
        assert!(is_health_check(&http::Method::GET, "/health"));
        assert!(!is_health_check(&http::Method::POST, "/_health"));
        assert!(!is_health_check(&http::Method::GET, "/v1/event-access/secrets"));
    }

    #[test]
    fn test_should_report_running_service() {
        let json = health_check_json();
        assert_eq!(json["services"]["event-access"], "running");
        assert_eq!(json["version"], VERSION);

        let resp = health_check_response();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get("content-type").unwrap(), CONTENT_TYPE);
    }
}
