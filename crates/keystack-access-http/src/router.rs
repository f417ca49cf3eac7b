//! Event access request router.
//!
//! Routes are REST-style under `/v1/event-access`:
//!
//! ```text
//! POST   /v1/event-access/verify                   Verify
//! POST   /v1/event-access/verify/secret            VerifySecret
//! POST   /v1/event-access/verify/identifier        VerifyIdentifier
//! POST   /v1/event-access/verify/signature         VerifySignature
//! POST   /v1/event-access/secrets                  CreateSecret
//! GET    /v1/event-access/secrets                  ListSecrets
//! GET    /v1/event-access/secrets/{id}             GetSecret
//! DELETE /v1/event-access/secrets/{name}           DeleteSecret
//! POST   /v1/event-access/secrets/{name}/rotate    RotateSecret
//! POST   /v1/event-access/identifiers              CreateIdentifier
//! ```

use http::Method;
use keystack_access_model::error::AccessError;
use keystack_access_model::operations::AccessOperation;
use percent_encoding::percent_decode_str;
use serde_json::{Map, Value};

/// Path prefix shared by every route.
pub const ROUTE_PREFIX: &str = "/v1/event-access";

/// A resolved route.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingContext {
    /// The identified action.
    pub operation: AccessOperation,
    /// Path and query parameters, to be merged into the request body.
    pub params: Map<String, Value>,
}

/// Resolve a method, path and query string to an action.
pub fn resolve(method: &Method, path: &str, query: Option<&str>) -> Result<RoutingContext, AccessError> {
    let unknown = || AccessError::unknown_operation(method, path);

    let rest = path.strip_prefix(ROUTE_PREFIX).ok_or_else(unknown)?;
    let segments: Vec<&str> = rest
        .trim_end_matches('/')
        .split('/')
        .skip(1)
        .collect();

    let mut params = parse_query(query.unwrap_or(""));
    let operation = match (method, segments.as_slice()) {
        (&Method::POST, ["verify"]) => AccessOperation::Verify,
        (&Method::POST, ["verify", "secret"]) => AccessOperation::VerifySecret,
        (&Method::POST, ["verify", "identifier"]) => AccessOperation::VerifyIdentifier,
        (&Method::POST, ["verify", "signature"]) => AccessOperation::VerifySignature,
        (&Method::POST, ["secrets"]) => AccessOperation::CreateSecret,
        (&Method::GET, ["secrets"]) => AccessOperation::ListSecrets,
        (&Method::GET, ["secrets", id]) => {
            params.insert("id".to_owned(), Value::String(decode_segment(id)?));
            AccessOperation::GetSecret
        }
        (&Method::DELETE, ["secrets", name]) => {
            params.insert("name".to_owned(), Value::String(decode_segment(name)?));
            AccessOperation::DeleteSecret
        }
        (&Method::POST, ["secrets", name, "rotate"]) => {
            params.insert("name".to_owned(), Value::String(decode_segment(name)?));
            AccessOperation::RotateSecret
        }
        (&Method::POST, ["identifiers"]) => AccessOperation::CreateIdentifier,
        _ => return Err(unknown()),
    };

    Ok(RoutingContext { operation, params })
}

fn decode_segment(segment: &str) -> Result<String, AccessError> {
    if segment.is_empty() {
        return Err(AccessError::invalid_parameters("Empty path parameter"));
    }
    percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| AccessError::invalid_parameters("Path parameter is not valid UTF-8"))
}

/// Parse a query string, turning numbers and booleans into JSON scalars.
fn parse_query(query: &str) -> Map<String, Value> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| {
            let value = match v.as_ref() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                s => s
                    .parse::<u64>()
                    .map_or_else(|_| Value::String(s.to_owned()), Value::from),
            };
            (k.into_owned(), value)
        })
        .collect()
}
