//! Client for the Cubbyhole secrets engine.
//!
//! Cubbyhole stores unversioned secrets scoped to the calling token. Reads
//! and listings of an empty path fail with [`Error::PathNotFound`].

use std::sync::Arc;
use tracing::{debug, info};

use vaultkv_common::{mount_or_default, secret_path, Error, Result};
use vaultkv_logical::{HttpLogical, LogicalClient, SecretData};

use crate::decode::{decode, payload, KeyList};

/// Mount path used when none is configured.
pub const DEFAULT_MOUNT_PATH: &str = "/cubbyhole";

/// Client for a Cubbyhole secrets engine mount.
#[derive(Clone)]
pub struct CubbyholeClient {
    mount_path: String,
    client: Arc<dyn LogicalClient>,
}

impl CubbyholeClient {
    /// Create a client for the engine mounted at `mount_path`.
    ///
    /// An empty mount path selects [`DEFAULT_MOUNT_PATH`].
    pub fn new(mount_path: impl Into<String>, client: Arc<dyn LogicalClient>) -> Self {
        Self {
            mount_path: mount_or_default(mount_path, DEFAULT_MOUNT_PATH),
            client,
        }
    }

    /// Create a client backed by an HTTP transport configured from the environment.
    pub fn from_env(mount_path: impl Into<String>) -> Result<Self> {
        Ok(Self::new(mount_path, Arc::new(HttpLogical::from_env()?)))
    }

    /// The mount path this client operates under.
    pub fn mount_path(&self) -> &str {
        &self.mount_path
    }

    /// Read the secret at `path`.
    pub async fn read_secret(&self, path: &str) -> Result<SecretData> {
        let path = secret_path(&self.mount_path, None, path)?;
        debug!(path = %path, "Reading cubbyhole secret");

        let secret = self.client.read(&path).await?;
        payload(secret).ok_or_else(|| Error::not_found("read_secret", path))
    }

    /// List the secret keys at `path`.
    pub async fn list_secrets(&self, path: &str) -> Result<Vec<String>> {
        let path = secret_path(&self.mount_path, None, path)?;
        debug!(path = %path, "Listing cubbyhole secrets");

        let secret = self.client.list(&path).await?;
        let data = payload(secret).ok_or_else(|| Error::not_found("list_secrets", path))?;
        Ok(decode::<KeyList>(data)?.keys)
    }

    /// Create or replace the secret at `path`.
    pub async fn write_secret(&self, path: &str, data: SecretData) -> Result<()> {
        let path = secret_path(&self.mount_path, None, path)?;
        debug!(path = %path, keys = data.len(), "Writing cubbyhole secret");

        self.client.write(&path, data).await?;
        info!(path = %path, "Secret written");
        Ok(())
    }

    /// Delete the secret at `path`.
    pub async fn delete_secret(&self, path: &str) -> Result<()> {
        let path = secret_path(&self.mount_path, None, path)?;
        debug!(path = %path, "Deleting cubbyhole secret");

        self.client.delete(&path).await?;
        info!(path = %path, "Secret deleted");
        Ok(())
    }
}
