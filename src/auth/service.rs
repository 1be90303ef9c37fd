use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::info;

use crate::auth::password::{dummy_hash, hash_password, verify_password};
use crate::auth::repo::User;
use crate::error::AuthError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Register a new user, hashing the password before it is stored.
///
/// Fails with [`AuthError::DuplicateEmail`] when the address is taken.
pub async fn register(
    db: &PgPool,
    username: &str,
    email: &str,
    password: &str,
) -> Result<User, AuthError> {
    let hash = hash_password(password).map_err(|e| AuthError::Hash(e.to_string()))?;
    let user = User::create(db, username, email, &hash).await?;
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Authenticate by email and password.
///
/// An argon2 verification runs even when the email is unknown (against a
/// dummy hash), so response time does not reveal which addresses are
/// registered. Unknown email and wrong password are both
/// [`AuthError::InvalidCredentials`].
pub async fn authenticate(db: &PgPool, email: &str, password: &str) -> Result<User, AuthError> {
    let user = User::find_by_email(db, email).await?;
    let stored = user
        .as_ref()
        .map(|u| u.password_hash.as_str())
        .unwrap_or_else(|| dummy_hash());
    let ok = verify_password(password, stored).map_err(|e| AuthError::Hash(e.to_string()))?;

    match user {
        Some(user) if ok => Ok(user),
        _ => Err(AuthError::InvalidCredentials),
    }
}
