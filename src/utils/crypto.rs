//! # Envelope Crypto
//!
//! Password records and authenticated encryption for stored items.
//!
//! ## Password records
//! PBKDF2-HMAC-SHA256 with [`PBKDF2_ITERATIONS`] rounds over a fresh
//! 16-byte salt. Hash and salt are stored as standard base64.
//!
//! ## Envelopes
//! ChaCha20-Poly1305 with a random 12-byte nonce per call:
//!
//! ```text
//! [ nonce (12 bytes) | ciphertext | tag (16 bytes) ]
//! ```
//!
//! Every decryption failure (short input, wrong key, tampering) surfaces as
//! the same `DecryptionFailure` so callers cannot tell them apart.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{ProtocolError, Result};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const SALT_LEN: usize = 16;
pub const PBKDF2_ITERATIONS: u32 = 10_000;

const ITEM_KEY_SALT_LABEL: &[u8] = b"vault-protocol/item-key/v1";

/// Stored credential: base64 PBKDF2 output and base64 salt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordRecord {
    pub hash: String,
    pub salt: String,
}

/// PBKDF2-HMAC-SHA256 of `password` over `salt`.
pub fn derive_key(password: &[u8], salt: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ITERATIONS, &mut key[..]);
    key
}

/// Hash `password` under a fresh random salt.
///
/// # Errors
/// Returns `KeyDerivation` if the OS random source is unavailable.
pub fn hash_password(password: &str) -> Result<PasswordRecord> {
    let mut salt = [0u8; SALT_LEN];
    fill_random(&mut salt)?;

    let key = derive_key(password.as_bytes(), &salt);
    Ok(PasswordRecord {
        hash: STANDARD.encode(&key[..]),
        salt: STANDARD.encode(salt),
    })
}

/// Re-derive and compare in constant time. Malformed base64 never verifies.
pub fn verify_password(password: &str, hash: &str, salt: &str) -> bool {
    let (Ok(expected), Ok(salt)) = (STANDARD.decode(hash), STANDARD.decode(salt)) else {
        return false;
    };

    let derived = derive_key(password.as_bytes(), &salt);
    derived[..].ct_eq(&expected[..]).into()
}

/// Seal `plaintext` under `key`, prepending a fresh nonce.
pub fn encrypt(plaintext: &[u8], key: &[u8; KEY_LEN]) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));

    let mut nonce = [0u8; NONCE_LEN];
    fill_random(&mut nonce)?;

    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| ProtocolError::EncryptionFailure)?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Open an envelope produced by [`encrypt`].
pub fn decrypt(ciphertext: &[u8], key: &[u8; KEY_LEN]) -> Result<Zeroizing<Vec<u8>>> {
    if ciphertext.len() < NONCE_LEN + TAG_LEN {
        return Err(ProtocolError::DecryptionFailure);
    }

    let (nonce, sealed) = ciphertext.split_at(NONCE_LEN);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));

    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map(Zeroizing::new)
        .map_err(|_| ProtocolError::DecryptionFailure)
}

/// Random opaque session token, hex encoded.
pub fn session_token() -> Result<String> {
    let mut raw = [0u8; 32];
    fill_random(&mut raw)?;
    Ok(hex::encode(raw))
}

fn fill_random(buf: &mut [u8]) -> Result<()> {
    getrandom::fill(buf)
        .map_err(|e| ProtocolError::KeyDerivation(format!("OS random source failed: {e}")))
}

/// Client-side key for item envelopes. Never leaves client memory.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ItemKey([u8; KEY_LEN]);

impl ItemKey {
    /// Derive from the login credentials.
    ///
    /// The salt is a SHA-256 digest of the username under a fixed label, so the
    /// same account always yields the same key on every client.
    pub fn from_credentials(username: &str, password: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(ITEM_KEY_SALT_LABEL);
        hasher.update(username.as_bytes());
        let salt = hasher.finalize();

        let derived = derive_key(password.as_bytes(), &salt);
        Self(*derived)
    }

    /// Username-only SHA-256 key used by older clients.
    ///
    /// Anyone who knows the username can compute it; only use it to read
    /// items written before keys were password-derived.
    pub fn legacy_from_username(username: &str) -> Self {
        let digest = Sha256::digest(username.as_bytes());
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&digest);
        Self(key)
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        encrypt(plaintext, &self.0)
    }

    pub fn open(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        decrypt(ciphertext, &self.0)
    }
}

impl std::fmt::Debug for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ItemKey(<redacted>)")
    }
}
