//! Event access response serialization and error formatting.

use keystack_access_model::error::AccessError;

use crate::body::AccessResponseBody;

/// Content type for every event access response.
pub const CONTENT_TYPE: &str = "application/json";

/// Response header echoing the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Serialize an error into a JSON body.
///
/// ```json
/// {
///   "name": "UnauthorizedError",
///   "message": "Access denied. Invalid access key",
///   "code": 401,
///   "type": "unauthorized",
///   "data": {}
/// }
/// ```
#[must_use]
pub fn error_to_json(error: &AccessError) -> Vec<u8> {
    serde_json::to_vec(&error.to_json()).expect("JSON serialization of error cannot fail")
}

/// Convert an `AccessError` into a complete HTTP error response.
#[must_use]
pub fn error_to_response(error: &AccessError, request_id: &str) -> http::Response<AccessResponseBody> {
    http::Response::builder()
        .status(error.status_code)
        .header("content-type", CONTENT_TYPE)
        .header(REQUEST_ID_HEADER, request_id)
        .body(AccessResponseBody::from_json(error_to_json(error)))
        .expect("valid error response")
}

/// Build a success response from JSON bytes.
#[must_use]
pub fn json_response(json: Vec<u8>, request_id: &str) -> http::Response<AccessResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("content-type", CONTENT_TYPE)
        .header(REQUEST_ID_HEADER, request_id)
        .body(AccessResponseBody::from_json(json))
        .expect("valid JSON response")
}
