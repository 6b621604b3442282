//! Envelope encryption of secret payloads.
//!
//! Every `encrypt_secret` call draws a fresh DEK, wraps it under the
//! primary KEK, and seals the payload under the DEK with the caller's AAD.
//! The DEK lives only inside this call and is zeroed when it goes out of
//! scope.
//!
//! Stored secrets bind their AAD to `"{name}:{version}"` (see
//! [`secret_aad`]); moving a ciphertext to another name or version then
//! fails authentication instead of decrypting to the wrong value.

use zeroize::Zeroizing;

use super::encryption::{self, KEY_LEN, NONCE_LEN, TAG_LEN};
use super::kek::KeyRing;
use super::wrap::{self, WrappedDek};
use crate::errors::{Result, VaultError};

/// Everything needed to decrypt one secret, apart from the KEKs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretEnvelope {
    pub wrapped_dek: WrappedDek,
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

/// The AAD a stored secret version is sealed with.
pub fn secret_aad(name: &str, version: u32) -> String {
    format!("{name}:{version}")
}

/// Encrypt `plaintext` under a new DEK, binding `aad`.
pub fn encrypt_secret(ring: &KeyRing, plaintext: &[u8], aad: &[u8]) -> Result<SecretEnvelope> {
    let dek = Zeroizing::new(encryption::random_bytes::<KEY_LEN>()?);

    let wrapped_dek = wrap::wrap_dek(ring, &dek)?;
    let sealed = encryption::seal(&dek, plaintext, aad)?;

    Ok(SecretEnvelope {
        wrapped_dek,
        nonce: sealed.nonce,
        tag: sealed.tag,
        ciphertext: sealed.ciphertext,
    })
}

/// Decrypt an envelope with the same AAD it was sealed with.
///
/// A failed unwrap and a failed payload check both come back as
/// `AuthenticationFailed`, so callers cannot tell which layer rejected the
/// input. `KeyNotFound` is still reported as such: it describes the key
/// configuration, not the ciphertext.
pub fn decrypt_secret(
    ring: &KeyRing,
    envelope: &SecretEnvelope,
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let wrapped = &envelope.wrapped_dek;
    let dek = match wrap::unwrap_dek(
        ring,
        wrapped.kek_id.as_deref(),
        &wrapped.nonce,
        &wrapped.ciphertext,
    ) {
        Ok(dek) => dek,
        Err(VaultError::KeyNotFound(id)) => return Err(VaultError::KeyNotFound(id)),
        Err(_) => return Err(VaultError::AuthenticationFailed),
    };

    encryption::open(&dek, &envelope.nonce, &envelope.ciphertext, &envelope.tag, aad)
        .map(Zeroizing::new)
        .map_err(|_| VaultError::AuthenticationFailed)
}
