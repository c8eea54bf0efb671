//! Logical client trait definition.

use async_trait::async_trait;

use vaultkv_common::Result;

use crate::secret::{QueryData, Secret, SecretData};

/// Logical operations against a secrets backend.
///
/// Every method issues exactly one request and returns the raw envelope.
/// `Ok(None)` means the backend answered without a payload (for example a
/// `204 No Content`, or a `404` on a read). Implementations handle their own
/// authentication; callers never retry.
#[async_trait]
pub trait LogicalClient: Send + Sync {
    /// Read the secret at `path`.
    async fn read(&self, path: &str) -> Result<Option<Secret>>;

    /// Read the secret at `path` with query parameters.
    async fn read_with_data(&self, path: &str, data: &QueryData) -> Result<Option<Secret>>;

    /// List the keys below `path`.
    async fn list(&self, path: &str) -> Result<Option<Secret>>;

    /// Write `data` to `path`.
    async fn write(&self, path: &str, data: SecretData) -> Result<Option<Secret>>;

    /// Delete the secret at `path`.
    async fn delete(&self, path: &str) -> Result<Option<Secret>>;

    /// Delete the secret at `path` with query parameters.
    async fn delete_with_data(&self, path: &str, data: &QueryData) -> Result<Option<Secret>>;

    /// Unwrap a response-wrapped secret.
    ///
    /// An empty `wrapping_token` unwraps using the client's own token.
    async fn unwrap_token(&self, wrapping_token: &str) -> Result<Option<Secret>>;
}
