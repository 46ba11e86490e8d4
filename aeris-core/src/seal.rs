use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which sealing strategy produced (or checks) an artifact. Callers must never
/// branch on this; it exists for display and audit only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SealerBackend {
    Simulated,
    Keyed,
}

impl SealerBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SealerBackend::Simulated => "simulated",
            SealerBackend::Keyed => "keyed",
        }
    }
}

/// A freshly generated booking reference candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSeal {
    pub code: String,
    pub algorithm: String,
    pub simulated: bool,
}

/// Hybrid-encrypted payload: the content key travels inside the capsule,
/// never alongside the ciphertext in the clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptSeal {
    /// Hex-encoded AEAD ciphertext (tag included).
    pub ciphertext: String,
    /// Base64 key-exchange artifact that wraps the content key.
    pub key_capsule: String,
    /// Hex-encoded AEAD nonce.
    pub nonce: String,
    pub algorithm: String,
    pub simulated: bool,
}

/// Detached signature over a canonical payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureSeal {
    /// Base64 signature bytes. Every byte is load-bearing for verification.
    pub signature: String,
    /// Base64 key material verification needs back.
    pub verification_key: String,
    /// Hex SHA-256 of the exact bytes signed.
    pub content_hash: String,
    pub algorithm: String,
    pub simulated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifySeal {
    pub valid: bool,
    pub algorithm: String,
    pub simulated: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error("encryption failed: {0}")]
    Encrypt(String),
    #[error("decryption failed: {0}")]
    Decrypt(String),
    #[error("signing failed: {0}")]
    Sign(String),
    #[error("malformed seal material: {0}")]
    Malformed(String),
}

/// The cryptographic capability the booking transaction depends on.
///
/// All fields are opaque to the caller. The backend is picked at construction
/// time; the orchestrator and verification service hold only this trait.
#[async_trait]
pub trait CryptoSealer: Send + Sync {
    fn backend(&self) -> SealerBackend;

    /// Generate a reference candidate of `length` uppercase alphanumerics.
    /// Uniqueness is the caller's problem (collision check + bounded retry).
    async fn generate_reference(&self, length: usize) -> Result<ReferenceSeal, SealError>;

    async fn encrypt(&self, plaintext: &[u8]) -> Result<EncryptSeal, SealError>;

    async fn decrypt(&self, sealed: &EncryptSeal) -> Result<Vec<u8>, SealError>;

    async fn sign(&self, payload: &[u8]) -> Result<SignatureSeal, SealError>;

    /// Check `signature` over `payload` with `verification_key`. Malformed or
    /// tampered material reports `valid: false` rather than erroring; an
    /// invalid seal is a normal outcome, not a failure.
    async fn verify(
        &self,
        payload: &[u8],
        signature: &str,
        verification_key: &str,
    ) -> Result<VerifySeal, SealError>;
}
