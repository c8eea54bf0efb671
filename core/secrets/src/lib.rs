//! Secrets engine facades for vaultkv.
//!
//! Each facade binds an engine mount path to a shared
//! [`LogicalClient`](vaultkv_logical::LogicalClient) and exposes the engine's
//! operations as typed async methods:
//!
//! - [`CubbyholeClient`]: per-token single-value store
//! - [`KvV1Client`]: unversioned key/value store
//! - [`KvV2Client`]: versioned key/value store
//!
//! [`Engines`] bundles one default-mounted facade per engine.

pub mod cubbyhole;
pub mod decode;
pub mod engines;
pub mod kv1;
pub mod kv2;

pub use cubbyhole::CubbyholeClient;
pub use engines::Engines;
pub use kv1::KvV1Client;
pub use kv2::{KvSecret, KvV2Client, SecretConfig, SecretMetadata, SecretVersion};
