//! Default-mounted facades for every supported engine.

use std::sync::Arc;

use vaultkv_common::Result;
use vaultkv_logical::{ClientConfig, HttpLogical, LogicalClient};

use crate::cubbyhole::CubbyholeClient;
use crate::kv1::KvV1Client;
use crate::kv2::KvV2Client;

/// One facade per engine at its default mount, sharing a single transport.
#[derive(Clone)]
pub struct Engines {
    pub cubbyhole: CubbyholeClient,
    pub kv1: KvV1Client,
    pub kv2: KvV2Client,
    client: Arc<dyn LogicalClient>,
}

impl Engines {
    /// Build the default facades over `client`.
    pub fn new(client: Arc<dyn LogicalClient>) -> Self {
        Self {
            cubbyhole: CubbyholeClient::new("", client.clone()),
            kv1: KvV1Client::new("", client.clone()),
            kv2: KvV2Client::new("", client.clone()),
            client,
        }
    }

    /// Build the default facades over an HTTP transport for `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpLogical::new(config)?)))
    }

    /// Build the default facades over an HTTP transport configured from the
    /// environment.
    pub fn from_env() -> Result<Self> {
        Self::from_config(&ClientConfig::from_env()?)
    }

    /// The shared transport, for mounting facades at non-default paths or
    /// issuing raw calls.
    pub fn logical(&self) -> Arc<dyn LogicalClient> {
        self.client.clone()
    }
}
