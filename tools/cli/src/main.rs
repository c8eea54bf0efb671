//! vaultkv CLI - Command line interface for Vault secrets engines.
//!
//! This tool reads and writes secrets in the Cubbyhole, KV v1 and KV v2
//! engines of a Vault server and prints the results as JSON.

use anyhow::{bail, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use vaultkv_common::VaultToken;
use vaultkv_logical::{ClientConfig, HttpLogical, LogicalClient, SecretData};
use vaultkv_secrets::{CubbyholeClient, KvV1Client, KvV2Client, SecretConfig};

#[derive(Parser)]
#[command(name = "vaultkv")]
#[command(about = "vaultkv - Vault secrets engine client")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON client configuration file (default: VAULT_* environment).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server address, overriding the configuration.
    #[arg(long, global = true)]
    address: Option<String>,

    /// Namespace, overriding the configuration.
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// Prompt for the access token instead of reading VAULT_TOKEN.
    #[arg(long, global = true)]
    ask_token: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Operate on a Cubbyhole engine.
    Cubbyhole {
        /// Engine mount path (default: /cubbyhole).
        #[arg(short, long, global = true, default_value = "")]
        mount: String,

        #[command(subcommand)]
        command: KvCommand,
    },

    /// Operate on a KV version 1 engine.
    Kv1 {
        /// Engine mount path (default: /secret).
        #[arg(short, long, global = true, default_value = "")]
        mount: String,

        #[command(subcommand)]
        command: KvCommand,
    },

    /// Operate on a KV version 2 engine.
    Kv2 {
        /// Engine mount path (default: /secret).
        #[arg(short, long, global = true, default_value = "")]
        mount: String,

        #[command(subcommand)]
        command: Kv2Command,
    },

    /// Unwrap a response-wrapping token.
    Unwrap {
        /// Wrapping token (empty unwraps the current token).
        #[arg(default_value = "")]
        token: String,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

/// Operations shared by the unversioned engines.
#[derive(Subcommand)]
enum KvCommand {
    /// Read a secret.
    Read { path: String },

    /// List secret keys under a path.
    List { path: String },

    /// Create or replace a secret.
    Write {
        path: String,

        #[command(flatten)]
        payload: Payload,
    },

    /// Delete a secret.
    Delete { path: String },
}

#[derive(Subcommand)]
enum Kv2Command {
    /// Read a secret version.
    Read {
        path: String,

        /// Version to read (default: latest).
        #[arg(long)]
        version: Option<u64>,
    },

    /// Write a new secret version.
    Write {
        path: String,

        /// Only write if the current version equals this (0: must not exist).
        #[arg(long)]
        cas: Option<u64>,

        #[command(flatten)]
        payload: Payload,
    },

    /// List secret keys under a path.
    List { path: String },

    /// Show a secret's metadata and version history.
    Metadata { path: String },

    /// Soft-delete versions of a secret (default: the latest).
    Delete {
        path: String,

        /// Comma-separated versions to delete.
        #[arg(long, value_delimiter = ',')]
        versions: Vec<u64>,
    },

    /// Restore soft-deleted versions of a secret.
    Undelete {
        path: String,

        /// Comma-separated versions to restore.
        #[arg(long, value_delimiter = ',', required = true)]
        versions: Vec<u64>,
    },

    /// Permanently destroy versions of a secret.
    Destroy {
        path: String,

        /// Comma-separated versions to destroy.
        #[arg(long, value_delimiter = ',', required = true)]
        versions: Vec<u64>,
    },

    /// Delete a secret's metadata and all of its versions.
    DeleteMetadata { path: String },

    /// Set per-secret settings.
    SetMetadata {
        path: String,

        #[command(flatten)]
        settings: Settings,
    },

    /// Show the engine configuration.
    Config,

    /// Replace the engine configuration.
    SetConfig {
        #[command(flatten)]
        settings: Settings,
    },
}

/// Secret content given on the command line.
#[derive(Args)]
struct Payload {
    /// Key/value pairs as key=value.
    #[arg(conflicts_with = "json")]
    pairs: Vec<String>,

    /// Secret content as a JSON object.
    #[arg(long)]
    json: Option<String>,
}

/// Engine or per-secret settings.
#[derive(Args)]
struct Settings {
    /// Versions to keep (0: engine default).
    #[arg(long, default_value_t = 0)]
    max_versions: u32,

    /// Require check-and-set on every write.
    #[arg(long)]
    cas_required: bool,

    /// Soft-delete versions older than this, e.g. "72h" (0s: never).
    #[arg(long, default_value = "0s")]
    delete_version_after: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "vaultkv", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    debug!(address = %config.address, namespace = ?config.namespace, "Connecting");
    let client: Arc<dyn LogicalClient> =
        Arc::new(HttpLogical::new(&config).context("Failed to create client")?);

    match cli.command {
        Commands::Cubbyhole { mount, command } => {
            cmd_cubbyhole(CubbyholeClient::new(mount, client), command).await
        }

        Commands::Kv1 { mount, command } => cmd_kv1(KvV1Client::new(mount, client), command).await,

        Commands::Kv2 { mount, command } => cmd_kv2(KvV2Client::new(mount, client), command).await,

        Commands::Unwrap { token } => cmd_unwrap(client.as_ref(), &token).await,

        Commands::Completions { .. } => Ok(()),
    }
}

/// Resolve the client configuration from the file or environment plus flags.
fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = ClientConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            if config.token.is_empty() {
                if let Ok(token) = std::env::var("VAULT_TOKEN") {
                    config.token = VaultToken::new(token);
                }
            }
            config
        }
        None => ClientConfig::from_env().context("Invalid VAULT_* environment")?,
    };

    if let Some(address) = &cli.address {
        config.address = address.clone();
    }
    if let Some(namespace) = &cli.namespace {
        config.namespace = Some(namespace.clone());
    }
    if cli.ask_token {
        let token = rpassword::prompt_password("Vault token: ").context("Failed to read token")?;
        config.token = VaultToken::new(token);
    }

    Ok(config)
}

/// Build secret data from key=value pairs or a JSON object.
fn parse_payload(payload: &Payload) -> Result<SecretData> {
    if let Some(json) = &payload.json {
        return match serde_json::from_str(json).context("Invalid --json payload")? {
            Value::Object(map) => Ok(map),
            _ => bail!("--json payload must be a JSON object"),
        };
    }

    let mut data = SecretData::new();
    for pair in &payload.pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("Expected key=value, got {:?}", pair))?;
        if key.is_empty() {
            bail!("Empty key in {:?}", pair);
        }
        data.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(data)
}

/// Build an engine or per-secret configuration from flags.
fn parse_settings(settings: &Settings) -> Result<SecretConfig> {
    serde_json::from_value(json!({
        "max_versions": settings.max_versions,
        "cas_required": settings.cas_required,
        "delete_version_after": settings.delete_version_after,
    }))
    .context("Invalid --delete-version-after")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run a Cubbyhole command.
async fn cmd_cubbyhole(engine: CubbyholeClient, command: KvCommand) -> Result<()> {
    match command {
        KvCommand::Read { path } => {
            let data = engine
                .read_secret(&path)
                .await
                .context("Failed to read secret")?;
            print_json(&data)
        }
        KvCommand::List { path } => {
            let keys = engine
                .list_secrets(&path)
                .await
                .context("Failed to list secrets")?;
            print_json(&keys)
        }
        KvCommand::Write { path, payload } => {
            let data = parse_payload(&payload)?;
            engine
                .write_secret(&path, data)
                .await
                .context("Failed to write secret")?;
            println!("Secret written: {}", path);
            Ok(())
        }
        KvCommand::Delete { path } => {
            engine
                .delete_secret(&path)
                .await
                .context("Failed to delete secret")?;
            println!("Secret deleted: {}", path);
            Ok(())
        }
    }
}

/// Run a KV v1 command.
async fn cmd_kv1(engine: KvV1Client, command: KvCommand) -> Result<()> {
    match command {
        KvCommand::Read { path } => {
            let data = engine
                .read_secret(&path)
                .await
                .context("Failed to read secret")?;
            print_json(&data)
        }
        KvCommand::List { path } => {
            let keys = engine
                .list_secrets(&path)
                .await
                .context("Failed to list secrets")?;
            print_json(&keys)
        }
        KvCommand::Write { path, payload } => {
            let data = parse_payload(&payload)?;
            engine
                .write_secret(&path, data)
                .await
                .context("Failed to write secret")?;
            println!("Secret written: {}", path);
            Ok(())
        }
        KvCommand::Delete { path } => {
            engine
                .delete_secret(&path)
                .await
                .context("Failed to delete secret")?;
            println!("Secret deleted: {}", path);
            Ok(())
        }
    }
}

/// Run a KV v2 command.
async fn cmd_kv2(engine: KvV2Client, command: Kv2Command) -> Result<()> {
    match command {
        Kv2Command::Read { path, version } => {
            let version = version.map(version_arg).transpose()?.unwrap_or(-1);
            let secret = engine
                .read_secret_version(&path, version)
                .await
                .context("Failed to read secret")?;
            print_json(&secret)
        }
        Kv2Command::Write { path, cas, payload } => {
            let data = parse_payload(&payload)?;
            let cas = cas.map(version_arg).transpose()?.unwrap_or(-1);
            let written = engine
                .write_secret_version(&path, cas, data)
                .await
                .context("Failed to write secret")?;
            print_json(&written)
        }
        Kv2Command::List { path } => {
            let keys = engine
                .list_secrets(&path)
                .await
                .context("Failed to list secrets")?;
            print_json(&keys)
        }
        Kv2Command::Metadata { path } => {
            let metadata = engine
                .read_secret_metadata(&path)
                .await
                .context("Failed to read metadata")?;
            print_json(&metadata)
        }
        Kv2Command::Delete { path, versions } => {
            let result = if versions.is_empty() {
                engine.delete_secret_latest(&path).await
            } else {
                engine.delete_secret_version(&path, &versions).await
            };
            result.context("Failed to delete secret")?;
            println!("Secret deleted: {}", path);
            Ok(())
        }
        Kv2Command::Undelete { path, versions } => {
            engine
                .undelete_secret_version(&path, &versions)
                .await
                .context("Failed to undelete secret")?;
            println!("Versions restored: {}", path);
            Ok(())
        }
        Kv2Command::Destroy { path, versions } => {
            engine
                .destroy_secret_version(&path, &versions)
                .await
                .context("Failed to destroy secret")?;
            println!("Versions destroyed: {}", path);
            Ok(())
        }
        Kv2Command::DeleteMetadata { path } => {
            engine
                .delete_secret_metadata(&path)
                .await
                .context("Failed to delete metadata")?;
            println!("Metadata deleted: {}", path);
            Ok(())
        }
        Kv2Command::SetMetadata { path, settings } => {
            let config = parse_settings(&settings)?;
            engine
                .write_secret_metadata(&path, &config)
                .await
                .context("Failed to write metadata")?;
            println!("Metadata written: {}", path);
            Ok(())
        }
        Kv2Command::Config => {
            let config = engine
                .engine_config()
                .await
                .context("Failed to read engine config")?;
            print_json(&config)
        }
        Kv2Command::SetConfig { settings } => {
            let config = parse_settings(&settings)?;
            engine
                .set_engine_config(&config)
                .await
                .context("Failed to write engine config")?;
            println!("Engine config updated");
            Ok(())
        }
    }
}

fn version_arg(version: u64) -> Result<i64> {
    i64::try_from(version).context("Version out of range")
}

/// Unwrap a response-wrapping token.
async fn cmd_unwrap(client: &dyn LogicalClient, token: &str) -> Result<()> {
    let secret = client
        .unwrap_token(token)
        .await
        .context("Failed to unwrap token")?;
    print_json(&secret)
}
