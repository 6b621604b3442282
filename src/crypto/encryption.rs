//! AES-256-GCM authenticated encryption.
//!
//! Unlike a self-describing blob, callers here keep the nonce and the
//! auth tag in their own columns, so `seal` hands the three parts back
//! separately and `open` takes them separately.
//!
//! Every failure to open (bad key, bad nonce, bad tag, wrong AAD) maps to
//! `AuthenticationFailed`.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::errors::{Result, VaultError};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM auth tag in bytes.
pub const TAG_LEN: usize = 16;

/// Size of every key handled by this crate (master keys, KEKs, DEKs).
pub const KEY_LEN: usize = 32;

/// Output of a single `seal` call.
pub struct Sealed {
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

/// Fill a fixed-size buffer from the operating system CSPRNG.
pub fn random_bytes<const N: usize>() -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| VaultError::InternalCryptoError(format!("OS random source: {e}")))?;
    Ok(buf)
}

/// Encrypt `plaintext` under `key` with a fresh random nonce, binding `aad`.
pub fn seal(key: &[u8; KEY_LEN], plaintext: &[u8], aad: &[u8]) -> Result<Sealed> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| VaultError::InternalCryptoError(format!("invalid key length: {e}")))?;

    let nonce = random_bytes::<NONCE_LEN>()?;

    let mut output = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| VaultError::InternalCryptoError(format!("encryption error: {e}")))?;

    // aes-gcm appends the tag; split it off into its own field.
    let split = output.len() - TAG_LEN;
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&output[split..]);
    output.truncate(split);

    Ok(Sealed {
        nonce,
        ciphertext: output,
        tag,
    })
}

/// Decrypt a ciphertext produced by `seal`, verifying the tag and `aad`.
pub fn open(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let mut combined = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);
    open_combined(key, nonce, &combined, aad)
}

/// Decrypt `ciphertext || tag` as one buffer (the wrapped-DEK layout).
pub fn open_combined(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext_and_tag: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    if ciphertext_and_tag.len() < TAG_LEN {
        return Err(VaultError::AuthenticationFailed);
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| VaultError::AuthenticationFailed)?;

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext_and_tag,
                aad,
            },
        )
        .map_err(|_| VaultError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip_with_aad() {
        let key = [0x11u8; KEY_LEN];
        let sealed = seal(&key, b"hello", b"db/password:1").unwrap();
        assert_eq!(sealed.ciphertext.len(), 5);

        let plain = open(&key, &sealed.nonce, &sealed.ciphertext, &sealed.tag, b"db/password:1")
            .unwrap();
        assert_eq!(plain, b"hello");
    }

    #[test]
    fn open_rejects_different_aad() {
        let key = [0x22u8; KEY_LEN];
        let sealed = seal(&key, b"value", b"a:1").unwrap();
        let result = open(&key, &sealed.nonce, &sealed.ciphertext, &sealed.tag, b"a:2");
        assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
    }

    #[test]
    fn seal_uses_fresh_nonce_each_time() {
        let key = [0x33u8; KEY_LEN];
        let a = seal(&key, b"same", b"").unwrap();
        let b = seal(&key, b"same", b"").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn open_combined_rejects_short_input() {
        let key = [0x44u8; KEY_LEN];
        let result = open_combined(&key, &[0u8; NONCE_LEN], &[0u8; 5], b"");
        assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
    }

    #[test]
    fn empty_plaintext_still_authenticates() {
        let key = [0x55u8; KEY_LEN];
        let sealed = seal(&key, b"", b"ctx").unwrap();
        assert!(sealed.ciphertext.is_empty());
        let plain = open(&key, &sealed.nonce, &sealed.ciphertext, &sealed.tag, b"ctx").unwrap();
        assert!(plain.is_empty());
    }
}
