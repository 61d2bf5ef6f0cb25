//! Password hashing.

use argon2::Argon2;
use argon2::password_hash::{self, PasswordHash, PasswordVerifier, SaltString};

/// Hashes plaintext passwords and checks them against stored hashes.
pub trait PasswordHasher: Send + Sync {
    fn get_hash(&self, password: &str) -> Result<String, password_hash::Error>;
    /// `false` also covers a stored hash that can not be parsed.
    fn compare_hash_and_password(&self, hash: &str, password: &str) -> bool;
}

/// Argon2id with default parameters, stored as a PHC string.
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn get_hash(&self, password: &str) -> Result<String, password_hash::Error> {
        use argon2::password_hash::PasswordHasher as _;

        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())?;
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    fn compare_hash_and_password(&self, hash: &str, password: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_compare() {
        let hasher = Argon2Hasher;
        let hash = hasher.get_hash("admin123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(hasher.compare_hash_and_password(&hash, "admin123"));
        assert!(!hasher.compare_hash_and_password(&hash, "admin124"));
    }

    #[test]
    fn test_salt_differs() {
        let hasher = Argon2Hasher;
        assert_ne!(hasher.get_hash("admin123").unwrap(), hasher.get_hash("admin123").unwrap());
    }

    #[test]
    fn test_garbage_hash_never_matches() {
        assert!(!Argon2Hasher.compare_hash_and_password("not a hash", "admin123"));
    }
}
