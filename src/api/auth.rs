//! Auth resolution: session cookie and/or bearer token, either sufficient.
//!
//! Resolution returns an explicit [`ResolvedIdentity`] value -- nothing in
//! here writes session state as a side effect of a check. Bearer-only
//! callers get their username restored by reading the user row instead.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use axum::RequestPartsExt;
use axum_extra::extract::cookie::CookieJar;
use thiserror::Error;

use crate::api::response::ApiError;
use crate::storage::models::{Role, Session};
use crate::storage::Database;
use crate::tokens::{bearer, session};
use crate::AppState;

/// Name of the session cookie (holds the opaque sid).
pub const SESSION_COOKIE: &str = "pixelboard_sid";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Admin access required")]
    Forbidden,
    #[error("Database error: {0}")]
    Store(#[from] crate::storage::DatabaseError),
    #[error("Authentication required")]
    Unauthenticated,
}

impl From<session::SessionError> for AuthError {
    fn from(e: session::SessionError) -> Self {
        match e {
            session::SessionError::Database(d) => AuthError::Store(d),
        }
    }
}

impl From<bearer::TokenError> for AuthError {
    fn from(e: bearer::TokenError) -> Self {
        match e {
            bearer::TokenError::Database(d) => AuthError::Store(d),
        }
    }
}

/// The authenticated caller, as resolved for one request.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    pub role: Role,
    pub user_id: String,
    /// Absent only when a token's user row has been deleted out from
    /// under it.
    pub username: Option<String>,
}

impl ResolvedIdentity {
    fn from_session(session: &Session) -> Self {
        Self {
            role: session.role,
            user_id: session.user_id.clone(),
            username: Some(session.username.clone()),
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
/// The scheme keyword is matched case-insensitively; header-name casing is
/// handled by the HTTP layer.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Load the caller's session from the sid cookie, if any.
pub fn load_session(db: &Database, jar: &CookieJar) -> Result<Option<Session>, AuthError> {
    match jar.get(SESSION_COOKIE) {
        Some(cookie) => Ok(session::resolve(db, cookie.value())?),
        None => Ok(None),
    }
}

/// Required auth. Resolution order:
/// 1. a bearer token found in the token store wins, with the username
///    restored from the user row;
/// 2. a bearer token equal to the session's recorded token is accepted
///    without touching the store (legacy path);
/// 3. with no bearer supplied at all, a live session suffices.
///
/// A supplied-but-unrecognized bearer fails the call even when a live
/// session exists -- branch 3 requires the header to be absent.
pub fn resolve_required(
    db: &Database,
    session: Option<&Session>,
    bearer_token: Option<&str>,
) -> Result<ResolvedIdentity, AuthError> {
    if let Some(token) = bearer_token {
        if let Some(record) = bearer::resolve(db, token)? {
            let username = db.get_user(&record.user_id)?.map(|u| u.username);
            return Ok(ResolvedIdentity {
                role: record.role,
                user_id: record.user_id,
                username,
            });
        }

        if let Some(sess) = session {
            if sess.token.as_deref() == Some(token) {
                return Ok(ResolvedIdentity::from_session(sess));
            }
        }

        return Err(AuthError::Unauthenticated);
    }

    match session {
        Some(sess) => Ok(ResolvedIdentity::from_session(sess)),
        None => Err(AuthError::Unauthenticated),
    }
}

/// Admin auth. Same precedence as [`resolve_required`], but every branch
/// additionally requires the admin role; a branch that authenticates with
/// the wrong role falls through to the next instead of failing outright.
/// Failure is always `Forbidden`, distinct from the 401 of required auth.
pub fn resolve_admin(
    db: &Database,
    session: Option<&Session>,
    bearer_token: Option<&str>,
) -> Result<ResolvedIdentity, AuthError> {
    if let Some(token) = bearer_token {
        if let Some(record) = bearer::resolve(db, token)? {
            if record.role == Role::Admin {
                let username = db.get_user(&record.user_id)?.map(|u| u.username);
                return Ok(ResolvedIdentity {
                    role: record.role,
                    user_id: record.user_id,
                    username,
                });
            }
        }

        if let Some(sess) = session {
            if sess.token.as_deref() == Some(token) && sess.role == Role::Admin {
                return Ok(ResolvedIdentity::from_session(sess));
            }
        }
    } else if let Some(sess) = session {
        if sess.role == Role::Admin {
            return Ok(ResolvedIdentity::from_session(sess));
        }
    }

    Err(AuthError::Forbidden)
}

/// Optional auth: a live session yields an identity; anything else,
/// including store trouble, is anonymous. Never fails.
pub fn resolve_optional(session: Option<&Session>) -> Option<ResolvedIdentity> {
    session.map(ResolvedIdentity::from_session)
}

// ============================================================================
// Extractors
// ============================================================================

async fn parts_context(
    parts: &mut Parts,
    state: &Arc<AppState>,
) -> Result<(Option<Session>, Option<String>), AuthError> {
    let token = bearer_token(&parts.headers);
    let jar = match parts.extract::<CookieJar>().await {
        Ok(jar) => jar,
        Err(never) => match never {},
    };
    let session = load_session(&state.db, &jar)?;
    Ok((session, token))
}

/// Rejects with 403 unless the caller resolves to an admin.
pub struct RequireAdmin(pub ResolvedIdentity);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (session, token) = parts_context(parts, state).await?;
        let identity = resolve_admin(&state.db, session.as_ref(), token.as_deref())?;
        Ok(RequireAdmin(identity))
    }
}

/// Attaches the session identity when there is one; never rejects.
pub struct OptionalUser(pub Option<ResolvedIdentity>);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match parts_context(parts, state).await {
            Ok((session, _)) => Ok(OptionalUser(resolve_optional(session.as_ref()))),
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed, treating caller as anonymous");
                Ok(OptionalUser(None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{make_expired_token, make_session, make_user, setup_db};
    use axum::http::HeaderValue;
    use chrono::Utc;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc123"));

        // Scheme keyword is case-insensitive
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bEaReR abc123"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn test_bearer_only_call_resolves_with_username_restored() {
        let (db, _temp) = setup_db();

        let user = make_user("u1", "alice", "alice@example.com");
        db.create_user(&user).unwrap();
        let record = bearer::issue(&db, "u1", Role::Admin, Utc::now()).unwrap();

        let identity = resolve_required(&db, None, Some(&record.token)).unwrap();
        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.role, Role::Admin);
        assert_eq!(identity.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_unknown_or_expired_bearer_without_session_fails() {
        let (db, _temp) = setup_db();

        let err = resolve_required(&db, None, Some("nope")).unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));

        db.put_token(&make_expired_token("stale", "u1")).unwrap();
        let err = resolve_required(&db, None, Some("stale")).unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
    }

    #[test]
    fn test_invalid_bearer_beats_live_session() {
        let (db, _temp) = setup_db();

        let session = make_session("s1", "u1", "alice", Role::User, Some("tok_real"));
        let err = resolve_required(&db, Some(&session), Some("tok_wrong")).unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
    }

    #[test]
    fn test_legacy_path_matches_session_recorded_token() {
        let (db, _temp) = setup_db();

        // Token is not in the store (e.g. revoked) but the session still
        // records it -- the legacy branch accepts it.
        let session = make_session("s1", "u1", "alice", Role::User, Some("tok_legacy"));
        let identity = resolve_required(&db, Some(&session), Some("tok_legacy")).unwrap();
        assert_eq!(identity.user_id, "u1");
        assert_eq!(identity.username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_session_only_call_resolves() {
        let (db, _temp) = setup_db();

        let session = make_session("s1", "u1", "alice", Role::User, None);
        let identity = resolve_required(&db, Some(&session), None).unwrap();
        assert_eq!(identity.user_id, "u1");
    }

    #[test]
    fn test_admin_role_check_falls_through_branches() {
        let (db, _temp) = setup_db();

        // Store token resolves but with the user role; the session records
        // the same token with the admin role. Branch 1 fails the role
        // check and branch 2 succeeds.
        let record = bearer::issue(&db, "u1", Role::User, Utc::now()).unwrap();
        let session = make_session("s1", "u1", "alice", Role::Admin, Some(&record.token));

        let identity = resolve_admin(&db, Some(&session), Some(&record.token)).unwrap();
        assert_eq!(identity.role, Role::Admin);
    }

    #[test]
    fn test_admin_rejects_non_admins_with_forbidden() {
        let (db, _temp) = setup_db();

        let record = bearer::issue(&db, "u1", Role::User, Utc::now()).unwrap();
        let session = make_session("s1", "u1", "alice", Role::User, Some(&record.token));

        let err = resolve_admin(&db, Some(&session), Some(&record.token)).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden));

        // Fully anonymous admin calls are forbidden too (not 401)
        let err = resolve_admin(&db, None, None).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden));
    }

    #[test]
    fn test_optional_auth_never_fails() {
        let session = make_session("s1", "u1", "alice", Role::User, None);
        assert!(resolve_optional(Some(&session)).is_some());
        assert!(resolve_optional(None).is_none());
    }
}
