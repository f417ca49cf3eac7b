//! Core types, configuration, and errors for Keystack.
//!
//! This crate provides the building blocks shared by the access key codec and
//! the event access service: tenant identifiers, the `test`/`live` environment
//! split, tenant ownership, and the process-wide gateway configuration.

mod config;
mod error;
mod types;

pub use config::KeystackConfig;
pub use error::{KeystackError, KeystackResult};
pub use types::{Environment, Ownership, TenantId};
