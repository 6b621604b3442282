//! Key-encrypting keys derived from master keys with HKDF-SHA256.
//!
//! Each master key yields exactly one KEK:
//! `HKDF-SHA256(ikm = master, salt = "", info = "wrap:v1", L = 32)`.
//! The derivation is deterministic, so a KEK never has to be stored.
//!
//! `KeyRing` is the process-wide key state. It is built once at startup
//! and handed by reference (usually inside an `Arc`) to every component
//! that wraps or unwraps DEKs. The derived set is computed lazily on first
//! use, at most once, and is read-only afterwards.

use std::fmt;

use hkdf::Hkdf;
use once_cell::sync::OnceCell;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::encryption::KEY_LEN;
use super::master::{MasterKey, MasterKeySet};
use crate::errors::{Result, VaultError};

/// HKDF `info` label binding derived keys to the DEK-wrapping purpose.
pub const WRAP_INFO: &[u8] = b"wrap:v1";

/// A derived wrapping key. Zeroed on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKek {
    id: String,
    key: [u8; KEY_LEN],
}

impl DerivedKek {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

impl fmt::Debug for DerivedKek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKek")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Derive the wrapping KEK for one master key.
pub fn derive_kek(master: &MasterKey) -> Result<DerivedKek> {
    // An empty salt makes HKDF-Extract use a zero-filled salt, same as
    // any other HKDF-SHA256 implementation given "".
    let hk = Hkdf::<Sha256>::new(Some(&[]), master.as_bytes());

    let mut key = [0u8; KEY_LEN];
    hk.expand(WRAP_INFO, &mut key)
        .map_err(|e| VaultError::InternalCryptoError(format!("HKDF expand failed: {e}")))?;

    Ok(DerivedKek {
        id: master.id().to_string(),
        key,
    })
}

/// Loaded master keys, the chosen primary, and the lazily derived KEKs.
pub struct KeyRing {
    masters: MasterKeySet,
    primary_id: String,
    derived: OnceCell<Vec<DerivedKek>>,
}

impl KeyRing {
    /// Build a key ring. `primary_id` picks the KEK used for new wraps;
    /// `None` means the first key in load order.
    ///
    /// A primary id that names no loaded key is a `ConfigError`.
    pub fn new(masters: MasterKeySet, primary_id: Option<&str>) -> Result<Self> {
        let primary_id = match primary_id.filter(|id| !id.is_empty()) {
            Some(id) => {
                if masters.get(id).is_none() {
                    return Err(VaultError::ConfigError(format!(
                        "primary KEK id '{id}' is not among the loaded master keys"
                    )));
                }
                id.to_string()
            }
            None => masters.first().id().to_string(),
        };

        tracing::debug!(
            primary = %primary_id,
            keys = masters.len(),
            "key ring configured"
        );

        Ok(Self {
            masters,
            primary_id,
            derived: OnceCell::new(),
        })
    }

    /// Id of the KEK every new wrap uses.
    pub fn primary_id(&self) -> &str {
        &self.primary_id
    }

    /// Loaded key ids in load order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.masters.ids()
    }

    /// All derived KEKs in load order.
    ///
    /// The first caller derives the set; concurrent first callers block
    /// until that single computation finishes and then share its result.
    pub fn derived(&self) -> Result<&[DerivedKek]> {
        let keks = self.derived.get_or_try_init(|| {
            tracing::debug!("deriving KEK set");
            self.masters.iter().map(derive_kek).collect::<Result<Vec<_>>>()
        })?;
        Ok(keks.as_slice())
    }

    /// Look up a derived KEK by id.
    pub fn find(&self, id: &str) -> Result<Option<&DerivedKek>> {
        Ok(self.derived()?.iter().find(|k| k.id == id))
    }

    /// The KEK used for new wraps.
    pub fn primary(&self) -> Result<&DerivedKek> {
        self.find(&self.primary_id)?
            .ok_or_else(|| VaultError::KeyNotFound(self.primary_id.clone()))
    }
}

impl fmt::Debug for KeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRing")
            .field("ids", &self.masters.ids().collect::<Vec<_>>())
            .field("primary_id", &self.primary_id)
            .finish_non_exhaustive()
    }
}
