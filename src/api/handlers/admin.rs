use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::auth::RequireAdmin;
use crate::api::response::{ApiError, AppJson};
use crate::requests::lifecycle;
use crate::requests::ValidationError;
use crate::storage::models::{PixelRequest, RequestStatus};
use crate::AppState;

use super::requests::{iso8601, parse_position};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChangeStatusBody {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusChangeResponse {
    pub message: String,
    pub success: bool,
}

/// A request row in the admin listing: everything the public view has,
/// plus pricing and the derived effective status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRequestView {
    pub created_at: String,
    pub effective_status: String,
    pub email: Option<String>,
    pub id: String,
    pub image_data: Option<String>,
    pub image_position: Option<serde_json::Value>,
    pub link: Option<String>,
    pub pixel_count: Option<u32>,
    pub pixels: BTreeMap<String, bool>,
    pub price: Option<f64>,
    pub status: RequestStatus,
    pub telegram: Option<String>,
    pub text: Option<String>,
    pub updated_at: String,
}

impl AdminRequestView {
    fn from_request(request: PixelRequest, now: chrono::DateTime<Utc>) -> Self {
        Self {
            created_at: iso8601(request.created_at),
            effective_status: request.effective_status_at(now).to_string(),
            email: request.email,
            id: request.id,
            image_data: request.image_data,
            image_position: parse_position(request.image_position),
            link: request.link,
            pixel_count: request.pixel_count,
            pixels: request.pixels,
            price: request.price,
            status: request.status,
            telegram: request.telegram,
            text: request.text,
            updated_at: iso8601(request.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AdminRequestsResponse {
    pub data: Vec<AdminRequestView>,
    pub success: bool,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn approve_request(
    State(state): State<Arc<AppState>>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    lifecycle::transition(&state.db, &id, RequestStatus::Confirmed, Utc::now())?;
    tracing::info!(id = %id, admin = %admin.user_id, "Approved request");

    Ok(Json(StatusChangeResponse {
        message: "Request approved successfully".to_string(),
        success: true,
    }))
}

pub async fn reject_request(
    State(state): State<Arc<AppState>>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    lifecycle::transition(&state.db, &id, RequestStatus::Rejected, Utc::now())?;
    tracing::info!(id = %id, admin = %admin.user_id, "Rejected request");

    Ok(Json(StatusChangeResponse {
        message: "Request rejected successfully".to_string(),
        success: true,
    }))
}

pub async fn change_status(
    State(state): State<Arc<AppState>>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    AppJson(body): AppJson<ChangeStatusBody>,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    let status = body
        .status
        .as_deref()
        .and_then(RequestStatus::parse)
        .ok_or_else(|| ApiError::bad_request(ValidationError::InvalidStatus.to_string()))?;

    lifecycle::transition(&state.db, &id, status, Utc::now())?;
    tracing::info!(id = %id, status = status.as_str(), admin = %admin.user_id, "Changed request status");

    Ok(Json(StatusChangeResponse {
        message: format!("Request status changed to {} successfully", status.as_str()),
        success: true,
    }))
}

pub async fn list_requests(
    State(state): State<Arc<AppState>>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<AdminRequestsResponse>, ApiError> {
    let now = Utc::now();
    let requests = lifecycle::list_all(&state.db)?;

    Ok(Json(AdminRequestsResponse {
        data: requests
            .into_iter()
            .map(|r| AdminRequestView::from_request(r, now))
            .collect(),
        success: true,
    }))
}
