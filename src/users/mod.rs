//! Account management: registration, login lookup, admin seeding.

pub mod password;

use chrono::Utc;
use thiserror::Error;

use crate::storage::models::{Role, User};
use crate::storage::Database;

pub use password::{hash_password, verify_password};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Username or email already exists")]
    Duplicate,
    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("Username, email, and password are required")]
    MissingFields,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Database error: {0}")]
    Store(#[from] crate::storage::DatabaseError),
}

/// Input for [`register`].
#[derive(Debug)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub username: String,
}

/// Lowercase-trim a username or email for storage and lookup.
/// Usernames and emails are case-insensitively unique, so every path into
/// the store goes through this.
pub fn normalize(login: &str) -> String {
    login.trim().to_lowercase()
}

/// Create an account. Username and email are normalized before the
/// uniqueness check; the check and insert share one write transaction.
pub fn register(db: &Database, new: NewAccount) -> Result<User, AccountError> {
    let username = normalize(&new.username);
    let email = normalize(&new.email);

    if username.is_empty() || email.is_empty() || new.password.is_empty() {
        return Err(AccountError::MissingFields);
    }
    if new.password.len() < MIN_PASSWORD_LEN {
        return Err(AccountError::PasswordTooShort);
    }

    let now = Utc::now();
    let user = User {
        created_at: now,
        email,
        id: uuid::Uuid::new_v4().to_string(),
        password_hash: password::hash_password(&new.password)?,
        role: new.role,
        updated_at: now,
        username,
    };

    if !db.create_user(&user)? {
        return Err(AccountError::Duplicate);
    }

    tracing::debug!(id = %user.id, username = %user.username, role = user.role.as_str(), "Created user");
    Ok(user)
}

/// Verify a login. The login field accepts a username or an email.
/// Returns None for an unknown login or a wrong password (callers report
/// both identically).
pub fn authenticate(db: &Database, login: &str, plain: &str) -> Result<Option<User>, AccountError> {
    let user = match db.find_user_by_login(&normalize(login))? {
        Some(user) => user,
        None => return Ok(None),
    };

    if password::verify_password(plain, &user.password_hash)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Create the initial admin account unless one already exists.
/// Returns None when seeding was skipped.
pub fn seed_admin(
    db: &Database,
    username: &str,
    email: &str,
    password: &str,
) -> Result<Option<User>, AccountError> {
    if db.any_admin()? {
        tracing::debug!("Admin account already exists, skipping seed");
        return Ok(None);
    }

    let user = register(
        db,
        NewAccount {
            email: email.to_string(),
            password: password.to_string(),
            role: Role::Admin,
            username: username.to_string(),
        },
    )?;

    tracing::info!(username = %user.username, "Seeded admin account");
    Ok(Some(user))
}
