//! DEK wrapping: AES-256-GCM of a 32-byte DEK under a KEK, no AAD.
//!
//! A wrap always uses the key ring's primary KEK and records its id, so
//! unwrap and rotation know which key to use without guessing.

use zeroize::Zeroizing;

use super::encryption::{self, KEY_LEN, NONCE_LEN};
use super::kek::KeyRing;
use crate::errors::{Result, VaultError};

/// A DEK encrypted under a KEK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedDek {
    pub nonce: [u8; NONCE_LEN],
    /// Encrypted DEK followed by the 16-byte tag.
    pub ciphertext: Vec<u8>,
    /// KEK that produced this wrap. `None` only for legacy rows that were
    /// written before ids were recorded.
    pub kek_id: Option<String>,
}

/// Wrap `dek` under the primary KEK with a fresh nonce.
pub fn wrap_dek(ring: &KeyRing, dek: &[u8; KEY_LEN]) -> Result<WrappedDek> {
    let kek = ring.primary()?;
    let sealed = encryption::seal(kek.key(), dek, b"")?;

    let mut ciphertext = sealed.ciphertext;
    ciphertext.extend_from_slice(&sealed.tag);

    Ok(WrappedDek {
        nonce: sealed.nonce,
        ciphertext,
        kek_id: Some(kek.id().to_string()),
    })
}

/// Recover the DEK from a wrap.
///
/// With a `kek_id`, only that KEK is tried: an unknown id is `KeyNotFound`
/// even when some other loaded KEK would have opened the wrap.
///
/// Without one, every loaded KEK is tried in load order and the first that
/// authenticates wins. That loop returns as soon as a key matches, so its
/// running time reveals which candidate (if any) opened the wrap. It is an
/// administrative fallback for rows that predate recorded ids and must not
/// sit behind an attacker-reachable path.
pub fn unwrap_dek(
    ring: &KeyRing,
    kek_id: Option<&str>,
    nonce: &[u8; NONCE_LEN],
    wrapped: &[u8],
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if let Some(id) = kek_id {
        let kek = ring
            .find(id)?
            .ok_or_else(|| VaultError::KeyNotFound(id.to_string()))?;
        let plain = Zeroizing::new(encryption::open_combined(kek.key(), nonce, wrapped, b"")?);
        return to_dek(&plain);
    }

    for kek in ring.derived()? {
        if let Ok(plain) = encryption::open_combined(kek.key(), nonce, wrapped, b"") {
            let plain = Zeroizing::new(plain);
            tracing::debug!(kek_id = kek.id(), "legacy wrap opened by fallback search");
            return to_dek(&plain);
        }
    }

    Err(VaultError::AuthenticationFailed)
}

fn to_dek(plain: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    // An authenticated plaintext of the wrong size means the row was not
    // produced by `wrap_dek`.
    if plain.len() != KEY_LEN {
        return Err(VaultError::AuthenticationFailed);
    }
    let mut dek = Zeroizing::new([0u8; KEY_LEN]);
    dek.copy_from_slice(plain);
    Ok(dek)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::master::{MasterKey, MasterKeySet};

    fn ring(primary: Option<&str>) -> KeyRing {
        let keys = vec![
            MasterKey::new("primary", [0x01; KEY_LEN]),
            MasterKey::new("legacy", [0x02; KEY_LEN]),
        ];
        KeyRing::new(MasterKeySet::new(keys).unwrap(), primary).unwrap()
    }

    #[test]
    fn wrap_records_primary_and_appends_tag() {
        let ring = ring(None);
        let wrapped = wrap_dek(&ring, &[7u8; KEY_LEN]).unwrap();
        assert_eq!(wrapped.kek_id.as_deref(), Some("primary"));
        assert_eq!(wrapped.ciphertext.len(), KEY_LEN + encryption::TAG_LEN);
    }

    #[test]
    fn unwrap_with_recorded_id_roundtrips() {
        let ring = ring(None);
        let dek = [9u8; KEY_LEN];
        let w = wrap_dek(&ring, &dek).unwrap();
        let out = unwrap_dek(&ring, w.kek_id.as_deref(), &w.nonce, &w.ciphertext).unwrap();
        assert_eq!(*out, dek);
    }

    #[test]
    fn unknown_id_is_key_not_found() {
        let ring = ring(None);
        let w = wrap_dek(&ring, &[1u8; KEY_LEN]).unwrap();
        let result = unwrap_dek(&ring, Some("retired"), &w.nonce, &w.ciphertext);
        assert!(matches!(result, Err(VaultError::KeyNotFound(id)) if id == "retired"));
    }

    #[test]
    fn wrong_id_fails_authentication() {
        let ring = ring(None);
        let w = wrap_dek(&ring, &[1u8; KEY_LEN]).unwrap();
        let result = unwrap_dek(&ring, Some("legacy"), &w.nonce, &w.ciphertext);
        assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
    }

    #[test]
    fn fallback_finds_non_primary_key() {
        let legacy_ring = ring(Some("legacy"));
        let dek = [3u8; KEY_LEN];
        let w = wrap_dek(&legacy_ring, &dek).unwrap();
        assert_eq!(w.kek_id.as_deref(), Some("legacy"));

        let ring = ring(None);
        let out = unwrap_dek(&ring, None, &w.nonce, &w.ciphertext).unwrap();
        assert_eq!(*out, dek);
    }

    #[test]
    fn fallback_fails_when_no_key_matches() {
        let ring = ring(None);
        let mut w = wrap_dek(&ring, &[3u8; KEY_LEN]).unwrap();
        w.ciphertext[0] ^= 0x01;
        let result = unwrap_dek(&ring, None, &w.nonce, &w.ciphertext);
        assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
    }
}
