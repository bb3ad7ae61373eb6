//! bcrypt credentials. The cost comes from [crate::config::AuthConfig].

use log::error;

use crate::app::AppError;

/// Cost bounds accepted by bcrypt (the crate keeps its own constants private).
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(password, cost).map_err(|e| AppError::Internal(format!("password hashing: {e}")))
}

/// Checks `password` against a value produced by [hash_password].
/// A stored value that is not a bcrypt hash never verifies.
pub fn verify_password(password: &str, stored: &str) -> bool {
    bcrypt::verify(password, stored).unwrap_or_else(|e| {
        error!("stored password hash is unreadable: {e}");
        false
    })
}
