//! One-way password digest shared by the identity store and the
//! authentication service. Passwords are persisted and compared only in
//! this form: lower-case hex over SHA-256 of the UTF-8 plaintext. The
//! format is fixed so configuration-seeded credentials stay valid.

use sha2::{Digest, Sha256};

/// Hash a plaintext password to its stored representation.
pub fn hash_password(plaintext: &str) -> String {
    let digest = Sha256::digest(plaintext.as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_deterministic_and_lower_hex() {
        let a = hash_password("administrator");
        let b = hash_password("administrator");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn digest_matches_seeded_administrator_credential() {
        assert_eq!(
            hash_password("administrator"),
            "4194d1706ed1f408d5e02d672777019f4d5385c766a8c6ca8acba3167d36a7b9"
        );
    }
}
