//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::config::{KeySource, Settings};
use crate::errors::Result;
use crate::service::Vault;
use crate::vault::Database;

/// KekVault CLI: versioned secrets with envelope encryption.
#[derive(Parser)]
#[command(
    name = "kekvault",
    about = "Versioned secrets vault with envelope encryption and KEK rotation",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database file (default: db_path from .kekvault.toml, else kekvault.db)
    #[arg(long, env = "KEKVAULT_DB", global = true)]
    pub db: Option<String>,

    /// KEK id used for new wraps (default: first configured key)
    #[arg(long, env = "MASTER_KEK_PRIMARY_ID", global = true)]
    pub primary_kek_id: Option<String>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Store a new version of a secret
    Write {
        /// Secret name (e.g. db/password)
        name: String,
        /// Secret value (omit for piped stdin or an interactive prompt)
        value: Option<String>,
        /// Identity recorded in the audit trail
        #[arg(long, env = "KEKVAULT_ACTOR")]
        actor: String,
    },

    /// Print a secret's value (latest version unless --version is given)
    Read {
        /// Secret name
        name: String,
        /// Specific version to read
        #[arg(long)]
        version: Option<u32>,
        /// Identity recorded in the audit trail
        #[arg(long, env = "KEKVAULT_ACTOR")]
        actor: String,
    },

    /// List all versions of a secret (no values)
    History {
        /// Secret name
        name: String,
    },

    /// List all secret names with their latest version
    List,

    /// Re-wrap every stored DEK under the primary KEK
    Rotate,

    /// View the audit trail
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Delete audit records older than the retention window
    PruneAudit {
        /// Retention in days (default: audit_retention_days from settings)
        #[arg(long)]
        days: Option<u32>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load `.kekvault.toml` from the current directory.
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::load(&cwd)
}

/// Resolve the database path: `--db` wins over the settings file.
pub fn db_path(cli: &Cli, settings: &Settings) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match &cli.db {
        Some(path) => cwd.join(path),
        None => settings.db_path(&cwd),
    })
}

/// Open the database named by the CLI arguments and settings.
pub fn open_database(cli: &Cli, settings: &Settings) -> Result<Arc<Database>> {
    let path = db_path(cli, settings)?;
    Ok(Arc::new(Database::open(&path, settings.busy_timeout())?))
}

/// Build a `Vault` from the environment's master keys and the database.
///
/// The primary KEK id comes from `--primary-kek-id` /
/// `MASTER_KEK_PRIMARY_ID`, falling back to `primary_kek_id` in settings.
pub fn open_vault(cli: &Cli) -> Result<Vault> {
    let settings = load_settings()?;

    let mut source = KeySource::from_env();
    source.primary_id = cli
        .primary_kek_id
        .clone()
        .filter(|id| !id.is_empty())
        .or_else(|| settings.primary_kek_id.clone());
    let keys = Arc::new(source.key_ring()?);

    let db = open_database(cli, &settings)?;
    Ok(Vault::new(keys, db))
}
