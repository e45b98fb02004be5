use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::storage::models::{Role, TokenRecord};
use crate::storage::Database;

use super::generator::generate_token;

/// Default token lifetime. Tokens effectively never expire, but every
/// lookup still checks, so shorter-lived tokens work unchanged.
const DEFAULT_TTL_DAYS: i64 = 36_500;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Database error: {0}")]
    Database(#[from] crate::storage::DatabaseError),
}

/// Issue and persist a new bearer token for a user
pub fn issue(
    db: &Database,
    user_id: &str,
    role: Role,
    now: DateTime<Utc>,
) -> Result<TokenRecord, TokenError> {
    let record = TokenRecord {
        created_at: now,
        expires_at: now + Duration::days(DEFAULT_TTL_DAYS),
        role,
        token: generate_token(),
        user_id: user_id.to_string(),
    };

    db.put_token(&record)?;
    tracing::debug!(user_id = %user_id, "Issued bearer token");

    Ok(record)
}

/// Resolve a bearer token by exact string match, returning its record if
/// still valid. An expired record is deleted on the spot and reported as
/// absent (lazy expiry).
pub fn resolve(db: &Database, token: &str) -> Result<Option<TokenRecord>, TokenError> {
    match db.get_token(token)? {
        Some(record) => {
            if record.is_expired_at(Utc::now()) {
                let _ = db.delete_token(token);
                tracing::debug!(user_id = %record.user_id, "Bearer token expired");
                Ok(None)
            } else {
                Ok(Some(record))
            }
        }
        None => Ok(None),
    }
}

/// Revoke (delete) a bearer token. Idempotent.
pub fn revoke(db: &Database, token: &str) -> Result<bool, TokenError> {
    let deleted = db.delete_token(token)?;
    if deleted {
        tracing::debug!("Revoked bearer token");
    }
    Ok(deleted)
}

/// Revoke every token belonging to a user. Idempotent.
pub fn revoke_all_for_user(db: &Database, user_id: &str) -> Result<u64, TokenError> {
    let deleted = db.delete_tokens_for_user(user_id)?;
    if deleted > 0 {
        tracing::debug!(user_id = %user_id, count = deleted, "Revoked user's bearer tokens");
    }
    Ok(deleted)
}

/// Clean up expired tokens (called by the background sweep)
pub fn cleanup_expired(db: &Database) -> Result<usize, TokenError> {
    let records = db.all_tokens()?;
    let now = Utc::now();
    let mut cleaned = 0;

    for record in records {
        if record.is_expired_at(now) && db.delete_token(&record.token)? {
            cleaned += 1;
        }
    }

    if cleaned > 0 {
        tracing::info!(count = cleaned, "Cleaned up expired bearer tokens");
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{make_expired_token, setup_db};

    #[test]
    fn test_issue_and_resolve_round_trip() {
        let (db, _temp) = setup_db();

        let record = issue(&db, "user-123", Role::Admin, Utc::now()).unwrap();
        assert_eq!(record.token.len(), 64);

        let resolved = resolve(&db, &record.token).unwrap().unwrap();
        assert_eq!(resolved.user_id, "user-123");
        assert_eq!(resolved.role, Role::Admin);
    }

    #[test]
    fn test_resolve_after_revoke() {
        let (db, _temp) = setup_db();

        let record = issue(&db, "user-123", Role::User, Utc::now()).unwrap();
        assert!(revoke(&db, &record.token).unwrap());
        assert!(resolve(&db, &record.token).unwrap().is_none());

        // Revoking again is a quiet no-op
        assert!(!revoke(&db, &record.token).unwrap());
    }

    #[test]
    fn test_expired_token_deleted_on_lookup() {
        let (db, _temp) = setup_db();

        let record = make_expired_token("stale", "user-123");
        db.put_token(&record).unwrap();

        assert!(resolve(&db, "stale").unwrap().is_none());
        // The lookup removed the row
        assert!(db.get_token("stale").unwrap().is_none());
    }

    #[test]
    fn test_multiple_tokens_per_user_coexist() {
        let (db, _temp) = setup_db();

        let now = Utc::now();
        let t1 = issue(&db, "user-123", Role::User, now).unwrap();
        let t2 = issue(&db, "user-123", Role::User, now).unwrap();
        assert_ne!(t1.token, t2.token);

        assert!(resolve(&db, &t1.token).unwrap().is_some());
        assert!(resolve(&db, &t2.token).unwrap().is_some());

        assert_eq!(revoke_all_for_user(&db, "user-123").unwrap(), 2);
        assert!(resolve(&db, &t1.token).unwrap().is_none());
        assert!(resolve(&db, &t2.token).unwrap().is_none());
    }

    #[test]
    fn test_cleanup_expired_only_removes_stale() {
        let (db, _temp) = setup_db();

        db.put_token(&make_expired_token("stale", "u1")).unwrap();
        let live = issue(&db, "u1", Role::User, Utc::now()).unwrap();

        assert_eq!(cleanup_expired(&db).unwrap(), 1);
        assert!(resolve(&db, &live.token).unwrap().is_some());
    }
}
