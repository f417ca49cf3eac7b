//! Event access business logic for Keystack.
//!
//! Issues secret and identifier access keys, persists them through an
//! [`store::AccessRecordStore`], and verifies presented credentials: secrets
//! by cached store lookup, identifiers entirely in-process through the key
//! codec.
#![allow(missing_docs, clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod error;
pub mod factory;
pub mod handler;
pub mod ids;
pub mod integrations;
pub mod policy;
pub mod provider;
pub mod store;
