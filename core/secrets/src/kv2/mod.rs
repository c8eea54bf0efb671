//! Client for the KV version 2 secrets engine.
//!
//! Secret data lives under `<mount>/data/`, per-secret metadata under
//! `<mount>/metadata/` and the version lifecycle endpoints under
//! `<mount>/{delete,undelete,destroy}/`. Reads of empty paths return typed
//! empty values rather than errors.

mod types;

pub use types::{KvSecret, SecretConfig, SecretMetadata, SecretVersion};

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use vaultkv_common::{join_path, mount_or_default, secret_path, Error, Result};
use vaultkv_logical::{HttpLogical, LogicalClient, QueryData, SecretData};

use crate::decode::{decode, encode, payload, KeyList};

/// Mount path used when none is configured.
pub const DEFAULT_MOUNT_PATH: &str = "/secret";

/// Version lifecycle endpoints that take a list of versions.
#[derive(Debug, Clone, Copy)]
enum VersionAction {
    Delete,
    Undelete,
    Destroy,
}

impl VersionAction {
    fn segment(self) -> &'static str {
        match self {
            VersionAction::Delete => "delete",
            VersionAction::Undelete => "undelete",
            VersionAction::Destroy => "destroy",
        }
    }
}

/// Client for a KV v2 secrets engine mount.
#[derive(Clone)]
pub struct KvV2Client {
    mount_path: String,
    client: Arc<dyn LogicalClient>,
}

impl KvV2Client {
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

    fn config_path(&self) -> String {
        join_path(&[&self.mount_path, "config"])
    }

    /// Read the engine-wide configuration.
    pub async fn engine_config(&self) -> Result<SecretConfig> {
        let path = self.config_path();
        debug!(path = %path, "Reading engine config");

        match payload(self.client.read(&path).await?) {
            Some(data) => decode(data),
            None => Ok(SecretConfig::default()),
        }
    }

    /// Replace the engine-wide configuration.
    pub async fn set_engine_config(&self, config: &SecretConfig) -> Result<()> {
        let path = self.config_path();
        debug!(path = %path, max_versions = config.max_versions, "Writing engine config");

        self.client.write(&path, encode(config)?).await?;
        info!(path = %path, "Engine config updated");
        Ok(())
    }

    /// Read version `version` of the secret at `path`.
    ///
    /// A negative version reads the latest one.
    pub async fn read_secret_version(&self, path: &str, version: i64) -> Result<KvSecret> {
        let path = secret_path(&self.mount_path, Some("data"), path)?;
        debug!(path = %path, version, "Reading secret version");

        let secret = if version < 0 {
            self.client.read(&path).await?
        } else {
            let mut query = QueryData::new();
            query.insert("version".to_string(), vec![version.to_string()]);
            self.client.read_with_data(&path, &query).await?
        };

        match payload(secret) {
            Some(data) => decode(data),
            None => Ok(KvSecret::default()),
        }
    }

    /// Read the latest version of the secret at `path`.
    pub async fn read_secret_latest(&self, path: &str) -> Result<KvSecret> {
        self.read_secret_version(path, -1).await
    }

    /// Write a new version of the secret at `path`.
    ///
    /// A non-negative `cas` makes the write conditional: it only succeeds if
    /// the current version equals `cas` (0 means the secret must not exist).
    pub async fn write_secret_version(
        &self,
        path: &str,
        cas: i64,
        data: SecretData,
    ) -> Result<SecretVersion> {
        let path = secret_path(&self.mount_path, Some("data"), path)?;
        debug!(path = %path, cas, keys = data.len(), "Writing secret version");

        let mut body = SecretData::new();
        body.insert("data".to_string(), Value::Object(data));
        if cas >= 0 {
            body.insert("options".to_string(), json!({ "cas": cas }));
        }

        let written = match payload(self.client.write(&path, body).await?) {
            Some(data) => decode::<SecretVersion>(data)?,
            None => SecretVersion::default(),
        };
        info!(path = %path, version = written.version, "Secret version written");
        Ok(written)
    }

    /// Write a new version of the secret at `path` unconditionally.
    pub async fn write_secret_latest(&self, path: &str, data: SecretData) -> Result<SecretVersion> {
        self.write_secret_version(path, -1, data).await
    }

    /// Soft-delete the latest version of the secret at `path`.
    pub async fn delete_secret_latest(&self, path: &str) -> Result<()> {
        let path = secret_path(&self.mount_path, Some("data"), path)?;
        debug!(path = %path, "Deleting latest secret version");

        self.client.delete(&path).await?;
        info!(path = %path, "Latest secret version deleted");
        Ok(())
    }

    /// Soft-delete the given versions of the secret at `path`.
    pub async fn delete_secret_version(&self, path: &str, versions: &[u64]) -> Result<()> {
        self.version_action(VersionAction::Delete, path, versions)
            .await
    }

    /// Restore soft-deleted versions of the secret at `path`.
    pub async fn undelete_secret_version(&self, path: &str, versions: &[u64]) -> Result<()> {
        self.version_action(VersionAction::Undelete, path, versions)
            .await
    }

    /// Permanently remove the data of the given versions of the secret at `path`.
    pub async fn destroy_secret_version(&self, path: &str, versions: &[u64]) -> Result<()> {
        self.version_action(VersionAction::Destroy, path, versions)
            .await
    }

    async fn version_action(
        &self,
        action: VersionAction,
        path: &str,
        versions: &[u64],
    ) -> Result<()> {
        let path = secret_path(&self.mount_path, Some(action.segment()), path)?;
        if versions.is_empty() {
            return Err(Error::MissingVersions);
        }
        debug!(path = %path, ?versions, action = action.segment(), "Updating secret versions");

        let mut body = SecretData::new();
        body.insert("versions".to_string(), json!(versions));
        self.client.write(&path, body).await?;

        info!(path = %path, ?versions, action = action.segment(), "Secret versions updated");
        Ok(())
    }

    /// List the secret keys at `path`; empty if there are none.
    pub async fn list_secrets(&self, path: &str) -> Result<Vec<String>> {
        let path = secret_path(&self.mount_path, Some("metadata"), path)?;
        debug!(path = %path, "Listing kv secrets");

        match payload(self.client.list(&path).await?) {
            Some(data) => Ok(decode::<KeyList>(data)?.keys),
            None => Ok(Vec::new()),
        }
    }

    /// Read the metadata and version history of the secret at `path`.
    ///
    /// Issued as a `list` call on the metadata endpoint.
    pub async fn read_secret_metadata(&self, path: &str) -> Result<SecretMetadata> {
        let path = secret_path(&self.mount_path, Some("metadata"), path)?;
        debug!(path = %path, "Reading secret metadata");

        match payload(self.client.list(&path).await?) {
            Some(data) => decode(data),
            None => Ok(SecretMetadata::default()),
        }
    }

    /// Set the per-secret configuration of the secret at `path`.
    pub async fn write_secret_metadata(&self, path: &str, config: &SecretConfig) -> Result<()> {
        let path = secret_path(&self.mount_path, Some("metadata"), path)?;
        debug!(path = %path, max_versions = config.max_versions, "Writing secret metadata");

        self.client.write(&path, encode(config)?).await?;
        info!(path = %path, "Secret metadata written");
        Ok(())
    }

    /// Delete the metadata and every version of the secret at `path`.
    pub async fn delete_secret_metadata(&self, path: &str) -> Result<()> {
        let path = secret_path(&self.mount_path, Some("metadata"), path)?;
        debug!(path = %path, "Deleting secret metadata");

        self.client.delete(&path).await?;
        info!(path = %path, "Secret metadata deleted");
        Ok(())
    }
}
