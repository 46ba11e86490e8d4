//! Operator-keyed sealing backend.
//!
//! Same primitives as the simulated backend, but the key-wrapping and signing
//! keys are provisioned 32-byte secrets from configuration, and the content
//! key travels inside a proper envelope (nonce || AES-GCM-wrapped key) rather
//! than behind a derived mask. Artifacts carry `simulated: false`.

use async_trait::async_trait;
use zeroize::Zeroize;

use aeris_core::seal::{
    CryptoSealer, EncryptSeal, ReferenceSeal, SealError, SealerBackend, SignatureSeal, VerifySeal,
};

use crate::primitives::{
    aes_decrypt, aes_encrypt, b64, b64_decode, decode_key_b64, hmac_sign, random_key, sha256_hex,
    KEY_LEN, NONCE_LEN,
};
use crate::reference::random_reference;
use crate::verify_detached;

const REFERENCE_ALGORITHM: &str = "os-entropy";
const ENCRYPT_ALGORITHM: &str = "aes-256-gcm (envelope)";
const SIGN_ALGORITHM: &str = "hmac-sha512";

pub struct KeyedSealer {
    master_key: [u8; KEY_LEN],
    signing_key: [u8; KEY_LEN],
}

impl Drop for KeyedSealer {
    fn drop(&mut self) {
        self.master_key.zeroize();
        self.signing_key.zeroize();
    }
}

impl KeyedSealer {
    /// Both keys arrive base64-encoded, 32 bytes each.
    pub fn new(master_key_b64: &str, signing_key_b64: &str) -> Result<Self, SealError> {
        Ok(KeyedSealer {
            master_key: decode_key_b64(master_key_b64)?,
            signing_key: decode_key_b64(signing_key_b64)?,
        })
    }

    /// base64(wrap_nonce || AES-GCM(master_key, content_key))
    fn wrap_content_key(&self, content_key: &[u8; KEY_LEN]) -> Result<String, SealError> {
        let (wrapped, nonce) = aes_encrypt(&self.master_key, content_key)?;
        let mut capsule = Vec::with_capacity(NONCE_LEN + wrapped.len());
        capsule.extend_from_slice(&nonce);
        capsule.extend_from_slice(&wrapped);
        Ok(b64(&capsule))
    }

    fn unwrap_content_key(&self, capsule: &str) -> Result<[u8; KEY_LEN], SealError> {
        let bytes = b64_decode(capsule)?;
        if bytes.len() <= NONCE_LEN {
            return Err(SealError::Malformed("capsule too short".to_string()));
        }
        let unwrapped = aes_decrypt(&self.master_key, &bytes[NONCE_LEN..], &bytes[..NONCE_LEN])?;
        if unwrapped.len() != KEY_LEN {
            return Err(SealError::Malformed("unwrapped key wrong length".to_string()));
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&unwrapped);
        Ok(key)
    }
}

#[async_trait]
impl CryptoSealer for KeyedSealer {
    fn backend(&self) -> SealerBackend {
        SealerBackend::Keyed
    }

    async fn generate_reference(&self, length: usize) -> Result<ReferenceSeal, SealError> {
        Ok(ReferenceSeal {
            code: random_reference(length)?,
            algorithm: REFERENCE_ALGORITHM.to_string(),
            simulated: false,
        })
    }

    async fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptSeal, SealError> {
        let content_key = random_key();
        let (ciphertext, nonce) = aes_encrypt(&content_key, plaintext)?;

        Ok(EncryptSeal {
            ciphertext: hex::encode(ciphertext),
            key_capsule: self.wrap_content_key(&content_key)?,
            nonce: hex::encode(nonce),
            algorithm: ENCRYPT_ALGORITHM.to_string(),
            simulated: false,
        })
    }

    async fn decrypt(&self, sealed: &EncryptSeal) -> Result<Vec<u8>, SealError> {
        let content_key = self.unwrap_content_key(&sealed.key_capsule)?;
        let ciphertext = hex::decode(&sealed.ciphertext)
            .map_err(|_| SealError::Malformed("invalid ciphertext hex".to_string()))?;
        let nonce = hex::decode(&sealed.nonce)
            .map_err(|_| SealError::Malformed("invalid nonce hex".to_string()))?;
        aes_decrypt(&content_key, &ciphertext, &nonce)
    }

    async fn sign(&self, payload: &[u8]) -> Result<SignatureSeal, SealError> {
        let signature = hmac_sign(&self.signing_key, payload)?;
        Ok(SignatureSeal {
            signature: b64(&signature),
            verification_key: b64(&self.signing_key),
            content_hash: sha256_hex(payload),
            algorithm: SIGN_ALGORITHM.to_string(),
            simulated: false,
        })
    }

    async fn verify(
        &self,
        payload: &[u8],
        signature: &str,
        verification_key: &str,
    ) -> Result<VerifySeal, SealError> {
        Ok(VerifySeal {
            valid: verify_detached(payload, signature, verification_key),
            algorithm: SIGN_ALGORITHM.to_string(),
            simulated: false,
        })
    }
}
