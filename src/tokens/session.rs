use chrono::{Duration, Utc};
use thiserror::Error;

use crate::storage::models::{Session, User};
use crate::storage::Database;

use super::generator::generate_token;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Database error: {0}")]
    Database(#[from] crate::storage::DatabaseError),
}

/// Create a server-side session for a user. `token` is the bearer token
/// issued alongside the session, when there is one (login, not register).
pub fn create(
    db: &Database,
    user: &User,
    token: Option<String>,
    ttl_seconds: u64,
) -> Result<Session, SessionError> {
    let now = Utc::now();
    let session = Session {
        created_at: now,
        expires_at: now + Duration::seconds(ttl_seconds as i64),
        id: generate_token(),
        role: user.role,
        token,
        user_id: user.id.clone(),
        username: user.username.clone(),
    };

    db.put_session(&session)?;
    tracing::debug!(user_id = %user.id, "Created session");

    Ok(session)
}

/// Resolve a session by sid, returning it if still valid. An expired
/// session is deleted on the spot and reported as absent.
pub fn resolve(db: &Database, session_id: &str) -> Result<Option<Session>, SessionError> {
    match db.get_session(session_id)? {
        Some(session) => {
            if session.is_expired_at(Utc::now()) {
                let _ = db.delete_session(session_id);
                tracing::debug!(user_id = %session.user_id, "Session expired");
                Ok(None)
            } else {
                Ok(Some(session))
            }
        }
        None => Ok(None),
    }
}

/// Destroy a session. Idempotent.
pub fn destroy(db: &Database, session_id: &str) -> Result<bool, SessionError> {
    let deleted = db.delete_session(session_id)?;
    if deleted {
        tracing::debug!("Destroyed session");
    }
    Ok(deleted)
}

/// Clean up expired sessions (called by the background sweep)
pub fn cleanup_expired(db: &Database) -> Result<usize, SessionError> {
    let sessions = db.all_sessions()?;
    let now = Utc::now();
    let mut cleaned = 0;

    for session in sessions {
        if session.is_expired_at(now) && db.delete_session(&session.id)? {
            cleaned += 1;
        }
    }

    if cleaned > 0 {
        tracing::info!(count = cleaned, "Cleaned up expired sessions");
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{make_user, setup_db};

    #[test]
    fn test_create_and_resolve_session() {
        let (db, _temp) = setup_db();

        let user = make_user("u1", "alice", "alice@example.com");
        let session = create(&db, &user, Some("tok_1".to_string()), 3600).unwrap();
        assert_eq!(session.id.len(), 64);

        let resolved = resolve(&db, &session.id).unwrap().unwrap();
        assert_eq!(resolved.user_id, "u1");
        assert_eq!(resolved.username, "alice");
        assert_eq!(resolved.token.as_deref(), Some("tok_1"));
    }

    #[test]
    fn test_destroy_session() {
        let (db, _temp) = setup_db();

        let user = make_user("u1", "alice", "alice@example.com");
        let session = create(&db, &user, None, 3600).unwrap();

        assert!(destroy(&db, &session.id).unwrap());
        assert!(resolve(&db, &session.id).unwrap().is_none());
        assert!(!destroy(&db, &session.id).unwrap());
    }

    #[test]
    fn test_expired_session_deleted_on_lookup() {
        let (db, _temp) = setup_db();

        let user = make_user("u1", "alice", "alice@example.com");
        let mut session = create(&db, &user, None, 3600).unwrap();
        session.expires_at = Utc::now() - Duration::seconds(1);
        db.put_session(&session).unwrap();

        assert!(resolve(&db, &session.id).unwrap().is_none());
        assert!(db.get_session(&session.id).unwrap().is_none());
    }

    #[test]
    fn test_cleanup_expired_sessions() {
        let (db, _temp) = setup_db();

        let user = make_user("u1", "alice", "alice@example.com");
        let live = create(&db, &user, None, 3600).unwrap();
        let mut stale = create(&db, &user, None, 3600).unwrap();
        stale.expires_at = Utc::now() - Duration::seconds(1);
        db.put_session(&stale).unwrap();

        assert_eq!(cleanup_expired(&db).unwrap(), 1);
        assert!(resolve(&db, &live.id).unwrap().is_some());
    }
}
