//! Password hashing via bcrypt.

/// bcrypt cost factor (matches the salt rounds the product launched with).
const BCRYPT_COST: u32 = 10;

/// Hash a password with a fresh salt.
pub fn hash_password(plain: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(plain, BCRYPT_COST)
}

/// Verify a password against a stored hash. Comparison happens inside the
/// bcrypt primitive, not on raw strings.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    bcrypt::verify(plain, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert_ne!(hash, "hunter22");
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("hunter23", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let h1 = hash_password("hunter22").unwrap();
        let h2 = hash_password("hunter22").unwrap();
        assert_ne!(h1, h2);
    }
}
