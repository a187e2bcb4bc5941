use crate::domain::LedgerError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Opaque secret-hashing capability used for account PINs.
#[cfg_attr(test, mockall::automock)]
pub trait PinHasher: Send + Sync {
    fn hash(&self, pin: &str) -> Result<String, LedgerError>;
    fn verify(&self, pin: &str, hash: &str) -> bool;
}

/// Argon2id hashing with a fresh salt per PIN, stored as a PHC string.
#[derive(Debug, Default, Clone)]
pub struct Argon2PinHasher;

impl PinHasher for Argon2PinHasher {
    fn hash(&self, pin: &str) -> Result<String, LedgerError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(pin.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| LedgerError::Storage(format!("pin hashing failed: {e}")))
    }

    fn verify(&self, pin: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(pin.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
