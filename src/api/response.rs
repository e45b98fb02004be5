use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

// ============================================================================
// Error body
// ============================================================================

/// The product's error envelope: `{"success": false, "error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub success: bool,
}

// ============================================================================
// Unified error type for handlers
// ============================================================================

/// Boundary error for handler Results. `Fail` carries a caller-visible
/// message (4xx); `Internal` keeps the real error server-side and shows the
/// caller a generic message (5xx).
#[derive(Debug)]
pub enum ApiError {
    Fail(StatusCode, String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::BAD_REQUEST, message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::UNAUTHORIZED, message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::FORBIDDEN, message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::Fail(StatusCode::NOT_FOUND, message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ApiError::Fail(status, message) => (status, message),
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error,
                success: false,
            }),
        )
            .into_response()
    }
}

impl From<crate::storage::DatabaseError> for ApiError {
    fn from(e: crate::storage::DatabaseError) -> Self {
        ApiError::internal(e.to_string())
    }
}

impl From<crate::tokens::bearer::TokenError> for ApiError {
    fn from(e: crate::tokens::bearer::TokenError) -> Self {
        ApiError::internal(e.to_string())
    }
}

impl From<crate::tokens::session::SessionError> for ApiError {
    fn from(e: crate::tokens::session::SessionError) -> Self {
        ApiError::internal(e.to_string())
    }
}

impl From<crate::users::AccountError> for ApiError {
    fn from(e: crate::users::AccountError) -> Self {
        use crate::users::AccountError;
        match e {
            AccountError::Duplicate
            | AccountError::MissingFields
            | AccountError::PasswordTooShort => ApiError::bad_request(e.to_string()),
            AccountError::Hash(_) | AccountError::Store(_) => ApiError::internal(e.to_string()),
        }
    }
}

impl From<crate::requests::RequestError> for ApiError {
    fn from(e: crate::requests::RequestError) -> Self {
        use crate::requests::RequestError;
        match e {
            RequestError::Validation(v) => ApiError::bad_request(v.to_string()),
            RequestError::NotFound => ApiError::not_found(e.to_string()),
            RequestError::Database(d) => ApiError::internal(d.to_string()),
        }
    }
}

impl From<crate::api::auth::AuthError> for ApiError {
    fn from(e: crate::api::auth::AuthError) -> Self {
        use crate::api::auth::AuthError;
        match e {
            AuthError::Unauthenticated => ApiError::unauthorized(e.to_string()),
            AuthError::Forbidden => ApiError::forbidden(e.to_string()),
            AuthError::Store(d) => ApiError::internal(d.to_string()),
        }
    }
}

// ============================================================================
// JSON extractor with the product's rejection shape
// ============================================================================

/// `Json` wrapper whose rejection renders as `{"success": false, "error"}`
/// instead of axum's plain-text default.
pub struct AppJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}
