//! Mock-mode sealing backend.
//!
//! Stands in for the post-quantum stack when no provisioned key material
//! exists: keys are derived from fixed namespace tags, and the key capsule
//! carries KEM-ciphertext-sized random padding ahead of the masked content
//! key. Every artifact is flagged `simulated`. NOT suitable for production
//! data.

use async_trait::async_trait;

use aeris_core::seal::{
    CryptoSealer, EncryptSeal, ReferenceSeal, SealError, SealerBackend, SignatureSeal, VerifySeal,
};

use crate::primitives::{
    aes_decrypt, aes_encrypt, b64, b64_decode, derive_key, hmac_sign, random_bytes, random_key,
    sha256_hex, KEY_LEN,
};
use crate::reference::random_reference;
use crate::verify_detached;

const REFERENCE_ALGORITHM: &str = "qrng-sim (os-entropy)";
const ENCRYPT_ALGORITHM: &str = "kyber512-sim (aes-256-gcm)";
const SIGN_ALGORITHM: &str = "dilithium3-sim (hmac-sha512)";

/// Size of the random padding that stands in for a KEM ciphertext.
const CAPSULE_PAD_LEN: usize = 768;

const KEM_MASK_NAMESPACE: &str = "aeris/simulated/kem-mask";
const SIGNING_NAMESPACE: &str = "aeris/simulated/signing-key";

pub struct SimulatedSealer {
    kem_mask: [u8; KEY_LEN],
    signing_key: [u8; KEY_LEN],
}

impl SimulatedSealer {
    pub fn new() -> Self {
        SimulatedSealer {
            kem_mask: derive_key(KEM_MASK_NAMESPACE),
            signing_key: derive_key(SIGNING_NAMESPACE),
        }
    }

    fn wrap_content_key(&self, content_key: &[u8; KEY_LEN]) -> String {
        let mut capsule = random_bytes(CAPSULE_PAD_LEN);
        for (byte, mask) in content_key.iter().zip(self.kem_mask.iter()) {
            capsule.push(byte ^ mask);
        }
        b64(&capsule)
    }

    fn unwrap_content_key(&self, capsule: &str) -> Result<[u8; KEY_LEN], SealError> {
        let bytes = b64_decode(capsule)?;
        if bytes.len() != CAPSULE_PAD_LEN + KEY_LEN {
            return Err(SealError::Malformed("capsule wrong length".to_string()));
        }
        let mut key = [0u8; KEY_LEN];
        for (i, byte) in bytes[CAPSULE_PAD_LEN..].iter().enumerate() {
            key[i] = byte ^ self.kem_mask[i];
        }
        Ok(key)
    }
}

impl Default for SimulatedSealer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CryptoSealer for SimulatedSealer {
    fn backend(&self) -> SealerBackend {
        SealerBackend::Simulated
    }

    async fn generate_reference(&self, length: usize) -> Result<ReferenceSeal, SealError> {
        Ok(ReferenceSeal {
            code: random_reference(length)?,
            algorithm: REFERENCE_ALGORITHM.to_string(),
            simulated: true,
        })
    }

    async fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptSeal, SealError> {
        let content_key = random_key();
        let (ciphertext, nonce) = aes_encrypt(&content_key, plaintext)?;

        Ok(EncryptSeal {
            ciphertext: hex::encode(ciphertext),
            key_capsule: self.wrap_content_key(&content_key),
            nonce: hex::encode(nonce),
            algorithm: ENCRYPT_ALGORITHM.to_string(),
            simulated: true,
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
            simulated: true,
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
            simulated: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn encrypt_decrypt_round_trip() {
        let sealer = SimulatedSealer::new();
        let sealed = sealer.encrypt(b"P12345678").await.unwrap();
        assert!(sealed.simulated);
        assert_ne!(sealed.ciphertext, hex::encode(b"P12345678"));

        let plaintext = sealer.decrypt(&sealed).await.unwrap();
        assert_eq!(plaintext, b"P12345678");
    }

    #[tokio::test]
    async fn capsule_hides_the_content_key() {
        let sealer = SimulatedSealer::new();
        let a = sealer.encrypt(b"same payload").await.unwrap();
        let b = sealer.encrypt(b"same payload").await.unwrap();
        // Fresh content key and padding every time.
        assert_ne!(a.key_capsule, b.key_capsule);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[tokio::test]
    async fn sign_then_verify() {
        let sealer = SimulatedSealer::new();
        let seal = sealer.sign(b"canonical bytes").await.unwrap();
        let verdict = sealer
            .verify(b"canonical bytes", &seal.signature, &seal.verification_key)
            .await
            .unwrap();
        assert!(verdict.valid);
    }

    #[tokio::test]
    async fn any_flipped_signature_byte_invalidates() {
        let sealer = SimulatedSealer::new();
        let seal = sealer.sign(b"canonical bytes").await.unwrap();

        let mut raw = crate::primitives::b64_decode(&seal.signature).unwrap();
        for i in [0, raw.len() / 2, raw.len() - 1] {
            raw[i] ^= 0x01;
            let tampered = crate::primitives::b64(&raw);
            let verdict = sealer
                .verify(b"canonical bytes", &tampered, &seal.verification_key)
                .await
                .unwrap();
            assert!(!verdict.valid, "flip at byte {} went undetected", i);
            raw[i] ^= 0x01;
        }
    }

    #[tokio::test]
    async fn garbage_material_is_invalid_not_an_error() {
        let sealer = SimulatedSealer::new();
        let verdict = sealer
            .verify(b"payload", "not-base64!!", "also-not-base64!!")
            .await
            .unwrap();
        assert!(!verdict.valid);
    }
}
