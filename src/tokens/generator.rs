use rand::Rng;

/// Generate a secure random token (32 bytes, hex encoded = 64 characters).
/// Tokens carry no structure: nothing about the user, role, or time can be
/// recovered from (or used to predict) the value.
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token() {
        let token = generate_token();
        assert_eq!(token.len(), 64); // 32 bytes * 2 hex chars

        // Ensure randomness
        let token2 = generate_token();
        assert_ne!(token, token2);
    }
}
