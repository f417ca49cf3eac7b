//! Event access HTTP service layer for Keystack.
//!
//! - **Router**: maps method + path to an [`AccessOperation`] and its path
//!   and query parameters
//! - **Auth**: turns credential headers into a request identity before dispatch
//! - **Handler trait**: the boundary between HTTP and business logic
//! - **Service**: hyper `Service` implementation
//! - **Response helpers**: JSON success/error response formatting
//!
//! [`AccessOperation`]: keystack_access_model::AccessOperation
#![allow(missing_docs)]

pub mod auth;
pub mod body;
pub mod dispatch;
pub mod response;
pub mod router;
pub mod service;

pub use body::AccessResponseBody;
pub use dispatch::{AccessHandler, NotImplementedHandler};
pub use service::{AccessHttpConfig, AccessHttpService};
