//! Event access model types for Keystack.
//!
//! Records as stored, action inputs and outputs as they travel over the wire,
//! the error taxonomy with its HTTP status mapping, and the three-state
//! [`Outcome`] used at the edges of the verification service.
#![allow(clippy::doc_markdown)]

pub mod error;
pub mod identity;
pub mod input;
pub mod operations;
pub mod outcome;
pub mod output;
pub mod record;

pub use error::{AccessError, AccessErrorCode};
pub use identity::{IdentitySource, PresentedCredential, RequestContext, RequestIdentity};
pub use operations::AccessOperation;
pub use outcome::Outcome;
pub use record::{AccessCredential, AccessPaths, EventAccessRecord, SecretRecordView};
