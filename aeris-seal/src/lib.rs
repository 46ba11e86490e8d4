pub mod keyed;
pub mod primitives;
pub mod reference;
pub mod simulated;

use std::sync::Arc;

use aeris_core::seal::{CryptoSealer, SealError};

pub use keyed::KeyedSealer;
pub use reference::{REFERENCE_DEFAULT_LEN, REFERENCE_MAX_LEN, REFERENCE_MIN_LEN};
pub use simulated::SimulatedSealer;

/// Detached-signature check shared by both backends: recompute the MAC over
/// the payload with the supplied key and compare in constant time. Malformed
/// material is invalid, never an error.
pub(crate) fn verify_detached(payload: &[u8], signature: &str, verification_key: &str) -> bool {
    let Ok(signature) = primitives::b64_decode(signature) else {
        return false;
    };
    let Ok(key) = primitives::b64_decode(verification_key) else {
        return false;
    };
    primitives::hmac_verify(&key, payload, &signature)
}

/// Build the sealing backend named in configuration. The caller holds only
/// the trait from here on.
pub fn sealer_from_config(
    backend: &str,
    master_key: Option<&str>,
    signing_key: Option<&str>,
) -> Result<Arc<dyn CryptoSealer>, SealError> {
    match backend {
        "simulated" => {
            tracing::warn!("crypto sealing running in simulated mode; not suitable for production data");
            Ok(Arc::new(SimulatedSealer::new()))
        }
        "keyed" => {
            let master = master_key.ok_or_else(|| {
                SealError::Malformed("keyed backend requires crypto.master_key".to_string())
            })?;
            let signing = signing_key.ok_or_else(|| {
                SealError::Malformed("keyed backend requires crypto.signing_key".to_string())
            })?;
            Ok(Arc::new(KeyedSealer::new(master, signing)?))
        }
        other => Err(SealError::Malformed(format!(
            "unknown crypto backend '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{b64, random_key};

    #[test]
    fn config_builder_selects_backends() {
        assert!(sealer_from_config("simulated", None, None).is_ok());
        assert!(sealer_from_config("keyed", None, None).is_err());
        assert!(sealer_from_config("quantum", None, None).is_err());

        let master = b64(&random_key());
        let signing = b64(&random_key());
        let sealer = sealer_from_config("keyed", Some(&master), Some(&signing)).unwrap();
        assert_eq!(sealer.backend(), aeris_core::seal::SealerBackend::Keyed);
    }

    #[tokio::test]
    async fn backends_agree_on_the_verification_contract() {
        // A seal produced by one backend must verify through the other,
        // since verification uses only the stored key material.
        let simulated = SimulatedSealer::new();
        let keyed = KeyedSealer::new(&b64(&random_key()), &b64(&random_key())).unwrap();

        use aeris_core::seal::CryptoSealer as _;
        let seal = simulated.sign(b"bytes").await.unwrap();
        let verdict = keyed
            .verify(b"bytes", &seal.signature, &seal.verification_key)
            .await
            .unwrap();
        assert!(verdict.valid);
    }
}
