use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::auth::{self, bearer_token};
use crate::api::cookies::{clear_session_cookie, session_cookie};
use crate::api::response::{ApiError, AppJson};
use crate::storage::models::{Role, User};
use crate::tokens::{bearer, session};
use crate::users::{self, NewAccount};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: Option<String>,
    /// Accepts a username or an email
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub email: String,
    pub id: String,
    pub role: Role,
    pub username: String,
}

impl UserView {
    fn from_user(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id.clone(),
            role: user.role,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub success: bool,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub success: bool,
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct MeUser {
    pub id: String,
    pub role: Role,
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: Option<MeUser>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(CookieJar, Json<RegisterResponse>), ApiError> {
    // Admin role only when the body asks for it explicitly
    let role = match req.role.as_deref() {
        Some("admin") => Role::Admin,
        _ => Role::User,
    };

    let user = users::register(
        &state.db,
        NewAccount {
            email: req.email.unwrap_or_default(),
            password: req.password.unwrap_or_default(),
            role,
            username: req.username.unwrap_or_default(),
        },
    )?;

    // Auto-login: a fresh session, no bearer token
    let sess = session::create(&state.db, &user, None, state.config.sessions.ttl_seconds)?;
    let jar = jar.add(session_cookie(
        &sess.id,
        state.config.sessions.ttl_seconds,
        state.config.sessions.cookie_secure,
    ));

    Ok((
        jar,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            success: true,
            user: UserView::from_user(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let (username, password) = match (req.username, req.password) {
        (Some(u), Some(p)) if !u.trim().is_empty() && !p.is_empty() => (u, p),
        _ => return Err(ApiError::bad_request("Username and password are required")),
    };

    let user = users::authenticate(&state.db, &username, &password)?
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    // Both credentials at once: a persisted bearer token and a session
    // that records it
    let record = bearer::issue(&state.db, &user.id, user.role, chrono::Utc::now())?;
    let sess = session::create(
        &state.db,
        &user,
        Some(record.token.clone()),
        state.config.sessions.ttl_seconds,
    )?;
    let jar = jar.add(session_cookie(
        &sess.id,
        state.config.sessions.ttl_seconds,
        state.config.sessions.cookie_secure,
    ));

    tracing::debug!(user_id = %user.id, "Logged in");

    Ok((
        jar,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            success: true,
            token: record.token,
            user: UserView::from_user(&user),
        }),
    ))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<LogoutResponse>), ApiError> {
    // Revoke the header token, if one was sent
    if let Some(token) = bearer_token(&headers) {
        bearer::revoke(&state.db, &token)?;
    }

    // Destroy the session and revoke the token it recorded at login
    if let Some(sess) = auth::load_session(&state.db, &jar)? {
        if let Some(token) = &sess.token {
            bearer::revoke(&state.db, token)?;
        }
        session::destroy(&state.db, &sess.id)?;
    }

    let jar = jar.add(clear_session_cookie(state.config.sessions.cookie_secure));

    Ok((
        jar,
        Json(LogoutResponse {
            message: "Logged out successfully".to_string(),
            success: true,
        }),
    ))
}

/// Never errors: an unauthenticated caller gets `{success: false, user: null}`.
pub async fn me(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Json<MeResponse> {
    let token = bearer_token(&headers);
    let identity = auth::load_session(&state.db, &jar)
        .and_then(|sess| auth::resolve_required(&state.db, sess.as_ref(), token.as_deref()));

    match identity {
        Ok(identity) => Json(MeResponse {
            success: true,
            user: Some(MeUser {
                id: identity.user_id,
                role: identity.role,
                username: identity.username,
            }),
        }),
        Err(_) => Json(MeResponse {
            success: false,
            user: None,
        }),
    }
}
