use argon2::{password_hash::{PasswordHasher, PasswordVerifier, SaltString}, Argon2, PasswordHash};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;

use super::errors::AuthError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash with Argon2id and a fresh random salt; returns a PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, phc: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(phc).map_err(|e| AuthError::HashError(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

// Stand-in hash for logins naming no stored user.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("no-such-user-placeholder").ok());

/// Spend the same Argon2 work as a real check; the result is ignored.
pub fn verify_against_dummy(password: &str) {
    if let Some(phc) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, phc);
    }
}
