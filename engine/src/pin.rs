//! Parent PIN hashing.
//!
//! The PIN gates the parent area on a single device. Its salted hash
//! is stored in [`crate::model::ParentSettings::pin_hash`] and never
//! transmitted; see the merge rules for how it survives sync.

use sha2::{Digest, Sha256};

const PIN_SALT: &str = "tirelire-parent-pin";

/// Hash a PIN for storage.
pub fn hash_pin(pin: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(PIN_SALT.as_bytes());
    hasher.update(b":");
    hasher.update(pin.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Check an entered PIN against a stored hash.
pub fn verify_pin(input: &str, stored_hash: &str) -> bool {
    hash_pin(input) == stored_hash
}

/// A PIN is exactly four ASCII digits.
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_and_salted() {
        assert_eq!(hash_pin("1234"), hash_pin("1234"));
        assert_ne!(hash_pin("1234"), hash_pin("4321"));
        // Not the raw sha256 of the pin itself
        assert_ne!(
            hash_pin("1234"),
            "03ac674216f3e15c761ee1a5e255f067953623c8b388b4459e13f978d7c846f4"
        );
    }

    #[test]
    fn verify_matches_hash() {
        let stored = hash_pin("0000");
        assert!(verify_pin("0000", &stored));
        assert!(!verify_pin("0001", &stored));
    }

    #[test]
    fn pin_format() {
        assert!(is_valid_pin("1234"));
        assert!(is_valid_pin("0000"));
        assert!(!is_valid_pin("123"));
        assert!(!is_valid_pin("12345"));
        assert!(!is_valid_pin("12a4"));
        assert!(!is_valid_pin(""));
    }
}
