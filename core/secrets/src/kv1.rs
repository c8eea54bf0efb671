//! Client for the KV version 1 secrets engine.
//!
//! Unlike Cubbyhole, reading or listing an empty path is not an error: the
//! result is simply empty.

use std::sync::Arc;
use tracing::{debug, info};

use vaultkv_common::{mount_or_default, secret_path, Result};
use vaultkv_logical::{HttpLogical, LogicalClient, SecretData};

use crate::decode::{decode, payload, KeyList};

/// Mount path used when none is configured.
pub const DEFAULT_MOUNT_PATH: &str = "/secret";

/// Client for a KV v1 secrets engine mount.
#[derive(Clone)]
pub struct KvV1Client {
    mount_path: String,
    client: Arc<dyn LogicalClient>,
}

impl KvV1Client {
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

    /// Read the secret at `path`; empty if nothing is stored there.
    pub async fn read_secret(&self, path: &str) -> Result<SecretData> {
        let path = secret_path(&self.mount_path, None, path)?;
        debug!(path = %path, "Reading kv secret");

        let secret = self.client.read(&path).await?;
        Ok(payload(secret).unwrap_or_default())
    }

    /// List the secret keys at `path`; empty if there are none.
    pub async fn list_secrets(&self, path: &str) -> Result<Vec<String>> {
        let path = secret_path(&self.mount_path, None, path)?;
        debug!(path = %path, "Listing kv secrets");

        match payload(self.client.list(&path).await?) {
            Some(data) => Ok(decode::<KeyList>(data)?.keys),
            None => Ok(Vec::new()),
        }
    }

    /// Create or replace the secret at `path`.
    pub async fn write_secret(&self, path: &str, data: SecretData) -> Result<()> {
        let path = secret_path(&self.mount_path, None, path)?;
        debug!(path = %path, keys = data.len(), "Writing kv secret");

        self.client.write(&path, data).await?;
        info!(path = %path, "Secret written");
        Ok(())
    }

    /// Delete the secret at `path`.
    pub async fn delete_secret(&self, path: &str) -> Result<()> {
        let path = secret_path(&self.mount_path, None, path)?;
        debug!(path = %path, "Deleting kv secret");

        self.client.delete(&path).await?;
        info!(path = %path, "Secret deleted");
        Ok(())
    }
}
