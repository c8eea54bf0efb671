//! Logical operations abstraction for vaultkv.
//!
//! This module provides the trait every secrets engine facade talks through,
//! the generic secret envelope it returns, an HTTP implementation against the
//! Vault API and a recording mock for tests.
//!
//! # Design Principles
//! - Engine isolation: no engine-specific path logic lives here
//! - Async operations: every call is a single awaited request
//! - Unified error semantics: all implementations report `vaultkv_common::Error`

pub mod config;
pub mod http;
pub mod logical;
pub mod mock;
pub mod secret;

pub use config::ClientConfig;
pub use http::HttpLogical;
pub use logical::LogicalClient;
pub use mock::{Call, MockLogical};
pub use secret::{QueryData, Secret, SecretData, WrapInfo};
