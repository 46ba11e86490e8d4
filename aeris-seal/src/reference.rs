use aeris_core::seal::SealError;
use rand::Rng;

/// Published reference format: uppercase alphanumeric, 6-16 characters.
pub const REFERENCE_MIN_LEN: usize = 6;
pub const REFERENCE_MAX_LEN: usize = 16;
pub const REFERENCE_DEFAULT_LEN: usize = 12;

const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draw a reference candidate from OS entropy. Collisions are possible and
/// handled by the caller's bounded retry.
pub fn random_reference(length: usize) -> Result<String, SealError> {
    if !(REFERENCE_MIN_LEN..=REFERENCE_MAX_LEN).contains(&length) {
        return Err(SealError::Malformed(format!(
            "reference length {} outside {}..={}",
            length, REFERENCE_MIN_LEN, REFERENCE_MAX_LEN
        )));
    }

    let mut rng = rand::thread_rng();
    let code = (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_match_published_format() {
        for len in [REFERENCE_MIN_LEN, REFERENCE_DEFAULT_LEN, REFERENCE_MAX_LEN] {
            let code = random_reference(len).unwrap();
            assert_eq!(code.len(), len);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn out_of_band_lengths_are_rejected() {
        assert!(random_reference(5).is_err());
        assert!(random_reference(17).is_err());
    }
}
