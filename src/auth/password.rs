use bcrypt::{hash, verify};

use crate::error::AppError;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::Internal(format!("hashing failed: {e}")))
}

/// False for a mismatch and for a malformed stored hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    verify(password, stored_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_only_the_hashed_password() {
        let hashed = hash_password("segredo123", 4).unwrap();
        assert!(verify_password("segredo123", &hashed));
        assert!(!verify_password("segredo124", &hashed));
        assert!(!verify_password("segredo123", "not-a-hash"));
    }
}
