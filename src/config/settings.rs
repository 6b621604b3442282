use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

/// Project-level configuration, loaded from `.kekvault.toml`.
///
/// Every field has a default so KekVault works without any config file.
/// Key material is never read from here; see `KeySource`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// SQLite database holding secret versions and the audit trail,
    /// relative to the project directory unless absolute.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// KEK used for new wraps. Overridden by `MASTER_KEK_PRIMARY_ID`.
    #[serde(default)]
    pub primary_kek_id: Option<String>,

    /// Age in days after which `prune-audit` removes audit records.
    #[serde(default = "default_audit_retention_days")]
    pub audit_retention_days: u32,

    /// How long a writer waits for the database write lock.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_db_path() -> String {
    "kekvault.db".to_string()
}

fn default_audit_retention_days() -> u32 {
    180
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            primary_kek_id: None,
            audit_retention_days: default_audit_retention_days(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".kekvault.toml";

    /// Load settings from `<project_dir>/.kekvault.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Resolve the database path against the project directory.
    pub fn db_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.db_path)
    }

    pub fn busy_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.busy_timeout_ms)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
