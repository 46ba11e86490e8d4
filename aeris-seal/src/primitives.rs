//! Shared cryptographic primitives for the sealing backends.
//!
//! Ciphertexts are AES-256-GCM with a random 12-byte nonce; signatures are
//! HMAC-SHA512 over the exact canonical bytes. Encodings: ciphertext/nonce as
//! hex, capsules and signatures as base64.

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};

use aeris_core::seal::SealError;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

type HmacSha512 = Hmac<Sha512>;

pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut buf);
    buf
}

pub fn random_key() -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut key);
    key
}

/// Deterministic 32-byte key from a namespace tag. Only the simulated
/// backend derives keys this way; the keyed backend takes provisioned keys.
pub fn derive_key(namespace: &str) -> [u8; KEY_LEN] {
    let digest = Sha256::digest(namespace.as_bytes());
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&digest);
    key
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

pub fn b64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

pub fn b64_decode(data: &str) -> Result<Vec<u8>, SealError> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|_| SealError::Malformed("invalid base64".to_string()))
}

pub fn decode_key_b64(data: &str) -> Result<[u8; KEY_LEN], SealError> {
    let bytes = b64_decode(data)?;
    if bytes.len() != KEY_LEN {
        return Err(SealError::Malformed(format!(
            "key wrong length: {} (expected {KEY_LEN})",
            bytes.len()
        )));
    }
    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&bytes);
    Ok(key)
}

/// Encrypt plaintext, returning (ciphertext-with-tag, nonce).
pub fn aes_encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<(Vec<u8>, [u8; NONCE_LEN]), SealError> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| SealError::Encrypt("invalid key".to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| SealError::Encrypt("encryption failed".to_string()))?;

    Ok((ciphertext, nonce_bytes))
}

pub fn aes_decrypt(key: &[u8; KEY_LEN], ciphertext: &[u8], nonce: &[u8]) -> Result<Vec<u8>, SealError> {
    if nonce.len() != NONCE_LEN {
        return Err(SealError::Malformed("nonce wrong length".to_string()));
    }
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| SealError::Decrypt("invalid key".to_string()))?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| SealError::Decrypt("wrong key or tampered data".to_string()))
}

pub fn hmac_sign(key: &[u8], payload: &[u8]) -> Result<Vec<u8>, SealError> {
    let mut mac = <HmacSha512 as Mac>::new_from_slice(key)
        .map_err(|_| SealError::Sign("invalid signing key".to_string()))?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time signature check. Any malformed input is simply invalid.
pub fn hmac_verify(key: &[u8], payload: &[u8], signature: &[u8]) -> bool {
    let Ok(mut mac) = <HmacSha512 as Mac>::new_from_slice(key) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(signature).is_ok()
}
