//! Where master keys come from.
//!
//! Keys are read from the environment, never from the settings file:
//! - `MASTER_KEKS_JSON`: JSON array of `{"id", "key"}` entries;
//! - `MASTER_KEK_B64`: single legacy key, used only when the list is unset;
//! - `MASTER_KEK_PRIMARY_ID`: optional explicit primary.
//!
//! Empty variables count as unset.

use crate::crypto::{KeyRing, MasterKeySet};
use crate::errors::{Result, VaultError};

pub const KEKS_JSON_VAR: &str = "MASTER_KEKS_JSON";
pub const LEGACY_KEK_VAR: &str = "MASTER_KEK_B64";
pub const PRIMARY_ID_VAR: &str = "MASTER_KEK_PRIMARY_ID";

/// Raw master key configuration, before decoding.
#[derive(Default, Clone)]
pub struct KeySource {
    pub keks_json: Option<String>,
    pub legacy_b64: Option<String>,
    pub primary_id: Option<String>,
}

impl KeySource {
    /// Read the three variables from the process environment.
    pub fn from_env() -> Self {
        Self {
            keks_json: non_empty_var(KEKS_JSON_VAR),
            legacy_b64: non_empty_var(LEGACY_KEK_VAR),
            primary_id: non_empty_var(PRIMARY_ID_VAR),
        }
    }

    /// Decode and validate the configured master keys.
    ///
    /// The JSON list takes precedence over the legacy single key. Having
    /// neither configured is a `ConfigError`.
    pub fn load(&self) -> Result<MasterKeySet> {
        if let Some(json) = self.keks_json.as_deref().filter(|s| !s.trim().is_empty()) {
            return MasterKeySet::from_json(json);
        }
        if let Some(b64) = self.legacy_b64.as_deref().filter(|s| !s.trim().is_empty()) {
            return MasterKeySet::from_legacy_b64(b64);
        }
        Err(VaultError::ConfigError(format!(
            "no master key configured — set {KEKS_JSON_VAR} or {LEGACY_KEK_VAR}"
        )))
    }

    /// Load the keys and build the key ring, honouring the primary override.
    pub fn key_ring(&self) -> Result<KeyRing> {
        let masters = self.load()?;
        KeyRing::new(masters, self.primary_id.as_deref())
    }
}

impl std::fmt::Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySource")
            .field("keks_json", &self.keks_json.as_ref().map(|_| "<redacted>"))
            .field("legacy_b64", &self.legacy_b64.as_ref().map(|_| "<redacted>"))
            .field("primary_id", &self.primary_id)
            .finish()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
