//! Common utilities and types shared across the vaultkv crates.
//!
//! This module provides the error taxonomy every engine facade reports
//! through, the mount-relative path builder and the sensitive token wrapper.

pub mod error;
pub mod types;

pub use error::{Error, NoSecretData, Result};
pub use types::{join_path, mount_or_default, secret_path, VaultToken};
