//! Client configuration for the HTTP transport.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use vaultkv_common::{Error, Result, VaultToken};

/// Address used when `VAULT_ADDR` is unset.
pub const DEFAULT_ADDRESS: &str = "https://127.0.0.1:8200";

/// Request timeout used when `VAULT_CLIENT_TIMEOUT` is unset or invalid.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Connection settings for a Vault server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server address, e.g. `https://vault.example.com:8200`.
    #[serde(default = "default_address")]
    pub address: String,
    /// Access token. Never serialized.
    #[serde(default, skip_serializing)]
    pub token: VaultToken,
    /// Enterprise namespace sent with every request.
    #[serde(default)]
    pub namespace: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// PEM or DER encoded CA certificate to trust.
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
    /// Disable TLS certificate verification.
    #[serde(default)]
    pub tls_skip_verify: bool,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            token: VaultToken::default(),
            namespace: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            ca_cert: None,
            tls_skip_verify: false,
        }
    }
}

impl ClientConfig {
    /// Build a configuration from the standard `VAULT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let config = Self {
            address: var("VAULT_ADDR").unwrap_or_else(default_address),
            token: var("VAULT_TOKEN").map(VaultToken::new).unwrap_or_default(),
            namespace: var("VAULT_NAMESPACE"),
            timeout_secs: var("VAULT_CLIENT_TIMEOUT")
                .and_then(|value| parse_timeout(&value))
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ca_cert: var("VAULT_CACERT").map(PathBuf::from),
            tls_skip_verify: var("VAULT_SKIP_VERIFY")
                .map(|value| parse_bool(&value))
                .unwrap_or(false),
        };
        config.base_url()?;
        Ok(config)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("Invalid client config: {}", e)))?;
        config.base_url()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize configuration to JSON, without the token.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Decode(e.to_string()))
    }

    /// Parsed server address, always ending in `/`.
    pub fn base_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.address)
            .map_err(|e| Error::InvalidInput(format!("Invalid address {:?}: {}", self.address, e)))?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidInput(format!(
                "Invalid address {:?}: not a base URL",
                self.address
            )));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Accepts `30` or `30s`; zero and garbage are rejected.
fn parse_timeout(value: &str) -> Option<u64> {
    value
        .trim()
        .trim_end_matches('s')
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "t" | "T" | "true" | "TRUE" | "True")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.address, DEFAULT_ADDRESS);
        assert!(config.token.is_empty());
        assert_eq!(config.namespace, None);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(!config.tls_skip_verify);
    }

    #[test]
    fn test_from_env_values() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("VAULT_ADDR", "http://vault.internal:8200"),
            ("VAULT_TOKEN", "hvs.root"),
            ("VAULT_NAMESPACE", "team-a"),
            ("VAULT_CLIENT_TIMEOUT", "15s"),
            ("VAULT_CACERT", "/etc/vault/ca.pem"),
            ("VAULT_SKIP_VERIFY", "true"),
        ]))
        .unwrap();

        assert_eq!(config.address, "http://vault.internal:8200");
        assert_eq!(config.token.expose(), "hvs.root");
        assert_eq!(config.namespace.as_deref(), Some("team-a"));
        assert_eq!(config.timeout_secs, 15);
        assert_eq!(config.ca_cert, Some(PathBuf::from("/etc/vault/ca.pem")));
        assert!(config.tls_skip_verify);
    }

    #[test]
    fn test_invalid_timeout_falls_back() {
        for value in ["0", "-5", "soon"] {
            let config =
                ClientConfig::from_lookup(lookup(&[("VAULT_CLIENT_TIMEOUT", value)])).unwrap();
            assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        }
    }

    #[test]
    fn test_invalid_address_rejected() {
        let result = ClientConfig::from_lookup(lookup(&[("VAULT_ADDR", "not a url")]));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig {
            address: "https://vault.example.com/proxy".to_string(),
            ..ClientConfig::default()
        };
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "https://vault.example.com/proxy/"
        );
    }

    #[test]
    fn test_json_roundtrip_drops_token() {
        let config = ClientConfig::from_json(
            r#"{"address": "http://127.0.0.1:8200", "token": "hvs.secret", "timeout_secs": 5}"#,
        )
        .unwrap();
        assert_eq!(config.token.expose(), "hvs.secret");
        assert_eq!(config.timeout_secs, 5);

        let json = config.to_json().unwrap();
        assert!(!json.contains("hvs.secret"));

        let restored = ClientConfig::from_json(&json).unwrap();
        assert!(restored.token.is_empty());
        assert_eq!(restored.address, config.address);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"address": "http://10.0.0.1:8200", "namespace": "ns1"}}"#).unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.address, "http://10.0.0.1:8200");
        assert_eq!(config.namespace.as_deref(), Some("ns1"));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ClientConfig::from_file(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
