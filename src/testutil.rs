//! Shared test helpers -- available to all `#[cfg(test)]` modules in the crate.

use chrono::{DateTime, Duration, Utc};
use tempfile::TempDir;

use crate::storage::models::{PixelRequest, RequestStatus, Role, Session, TokenRecord, User};
use crate::storage::Database;

/// Open a fresh database in a temporary directory.
///
/// Returns both the `Database` and the `TempDir` guard -- the caller must
/// keep the `TempDir` alive for the duration of the test.
pub fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open(temp_dir.path()).unwrap();
    (db, temp_dir)
}

/// Create a `User` with the given id, username, and email.
/// The password hash is a placeholder -- use `users::register` in tests
/// that verify passwords.
pub fn make_user(id: &str, username: &str, email: &str) -> User {
    let now = Utc::now();
    User {
        created_at: now,
        email: email.to_string(),
        id: id.to_string(),
        password_hash: "unverifiable".to_string(),
        role: Role::User,
        updated_at: now,
        username: username.to_string(),
    }
}

/// Create a pending-shaped `PixelRequest` with the given id, status, and
/// creation time.
pub fn make_request(id: &str, status: RequestStatus, created_at: DateTime<Utc>) -> PixelRequest {
    PixelRequest {
        created_at,
        email: Some("a@b.com".to_string()),
        id: id.to_string(),
        image_data: None,
        image_position: None,
        link: None,
        pixel_count: None,
        pixels: [("3,4".to_string(), true)].into_iter().collect(),
        price: None,
        status,
        telegram: None,
        text: None,
        updated_at: created_at,
        user_id: None,
    }
}

/// Create a live `TokenRecord` with the given token string and subject.
pub fn make_token(token: &str, user_id: &str) -> TokenRecord {
    let now = Utc::now();
    TokenRecord {
        created_at: now,
        expires_at: now + Duration::days(365),
        role: Role::User,
        token: token.to_string(),
        user_id: user_id.to_string(),
    }
}

/// Create a `TokenRecord` that expired a minute ago.
pub fn make_expired_token(token: &str, user_id: &str) -> TokenRecord {
    let now = Utc::now();
    TokenRecord {
        created_at: now - Duration::days(1),
        expires_at: now - Duration::minutes(1),
        role: Role::User,
        token: token.to_string(),
        user_id: user_id.to_string(),
    }
}

/// Create a live `Session` (not persisted) for resolver tests.
pub fn make_session(
    id: &str,
    user_id: &str,
    username: &str,
    role: Role,
    token: Option<&str>,
) -> Session {
    let now = Utc::now();
    Session {
        created_at: now,
        expires_at: now + Duration::hours(24),
        id: id.to_string(),
        role,
        token: token.map(|t| t.to_string()),
        user_id: user_id.to_string(),
        username: username.to_string(),
    }
}
