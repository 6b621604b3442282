//! Master keys: the raw 256-bit roots every KEK is derived from.
//!
//! Two input shapes are accepted:
//! - a JSON array `[{"id": "...", "key": "<base64>"}, ...]` (`b64` is an
//!   accepted alias of `key`), whose order is kept and decides the default
//!   primary;
//! - a single unlabelled base64 key, loaded under the id `"primary"`.

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::encryption::KEY_LEN;
use crate::errors::{Result, VaultError};

/// Id given to a key loaded from the single-key legacy source.
pub const LEGACY_KEY_ID: &str = "primary";

/// A 32-byte master key tagged with a stable id. Zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    id: String,
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    pub fn new(id: impl Into<String>, bytes: [u8; KEY_LEN]) -> Self {
        Self {
            id: id.into(),
            bytes,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Access the raw key bytes (only ever fed into HKDF).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKey")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Non-empty, load-ordered set of master keys with unique ids.
#[derive(Debug)]
pub struct MasterKeySet {
    keys: Vec<MasterKey>,
}

#[derive(Deserialize)]
struct KeyEntry {
    id: Option<String>,
    #[serde(alias = "b64")]
    key: Option<String>,
}

impl MasterKeySet {
    /// Build a set from already-decoded keys, enforcing non-empty and unique ids.
    pub fn new(keys: Vec<MasterKey>) -> Result<Self> {
        if keys.is_empty() {
            return Err(VaultError::ConfigError(
                "at least one master key must be configured".into(),
            ));
        }
        for (i, key) in keys.iter().enumerate() {
            if key.id.is_empty() {
                return Err(VaultError::ConfigError("master key id cannot be empty".into()));
            }
            if keys[..i].iter().any(|k| k.id == key.id) {
                return Err(VaultError::ConfigError(format!(
                    "duplicate master key id '{}'",
                    key.id
                )));
            }
        }
        Ok(Self { keys })
    }

    /// Parse the structured JSON list form.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<KeyEntry> = serde_json::from_str(json).map_err(|e| {
            VaultError::ConfigError(format!("master key list must be a JSON array: {e}"))
        })?;

        let mut keys = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            let (Some(id), Some(encoded)) = (entry.id, entry.key) else {
                return Err(VaultError::ConfigError(format!(
                    "master key entry #{index} requires both `id` and `key`"
                )));
            };
            let encoded = Zeroizing::new(encoded);
            let bytes = decode_key(&encoded, &id)?;
            keys.push(MasterKey::new(id, bytes));
        }

        Self::new(keys)
    }

    /// Load the single unlabelled legacy key under id `"primary"`.
    pub fn from_legacy_b64(encoded: &str) -> Result<Self> {
        let bytes = decode_key(encoded, LEGACY_KEY_ID)?;
        Self::new(vec![MasterKey::new(LEGACY_KEY_ID, bytes)])
    }

    pub fn get(&self, id: &str) -> Option<&MasterKey> {
        self.keys.iter().find(|k| k.id == id)
    }

    /// The first key in load order.
    pub fn first(&self) -> &MasterKey {
        // `new` rejects empty sets.
        &self.keys[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &MasterKey> {
        self.keys.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Decode a base64 key and insist on exactly 32 bytes.
fn decode_key(encoded: &str, id: &str) -> Result<[u8; KEY_LEN]> {
    let decoded = Zeroizing::new(BASE64.decode(encoded.trim()).map_err(|_| {
        VaultError::ConfigError(format!("master key '{id}' is not valid base64"))
    })?);

    if decoded.len() != KEY_LEN {
        return Err(VaultError::ConfigError(format!(
            "master key '{id}' must decode to exactly {KEY_LEN} bytes, got {}",
            decoded.len()
        )));
    }

    let mut bytes = [0u8; KEY_LEN];
    bytes.copy_from_slice(&decoded);
    Ok(bytes)
}
