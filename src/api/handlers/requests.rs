use axum::extract::State;
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::auth::OptionalUser;
use crate::api::response::{ApiError, AppJson};
use crate::requests::lifecycle;
use crate::requests::NewRequest;
use crate::storage::models::{PixelRequest, RequestStatus};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequestBody {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub image_position: Option<serde_json::Value>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub pixel_count: Option<u32>,
    pub pixels: BTreeMap<String, bool>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub telegram: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequestResponse {
    pub message: String,
    pub request_id: String,
    pub success: bool,
}

/// A request as shown on the public board. Pricing fields and the owner
/// are not exposed here.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicRequestView {
    pub created_at: String,
    pub email: Option<String>,
    pub id: String,
    pub image_data: Option<String>,
    pub image_position: Option<serde_json::Value>,
    pub link: Option<String>,
    pub pixels: BTreeMap<String, bool>,
    pub status: RequestStatus,
    pub telegram: Option<String>,
    pub text: Option<String>,
    pub updated_at: String,
}

impl PublicRequestView {
    fn from_request(request: PixelRequest) -> Self {
        Self {
            created_at: iso8601(request.created_at),
            email: request.email,
            id: request.id,
            image_data: request.image_data,
            image_position: parse_position(request.image_position),
            link: request.link,
            pixels: request.pixels,
            status: request.status,
            telegram: request.telegram,
            text: request.text,
            updated_at: iso8601(request.updated_at),
        }
    }
}

/// Render a timestamp the way the frontend expects: RFC 3339 with
/// milliseconds and a `Z` suffix.
pub(super) fn iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Placement metadata is stored as JSON text; hand it back as JSON.
pub(super) fn parse_position(stored: Option<String>) -> Option<serde_json::Value> {
    stored.and_then(|s| serde_json::from_str(&s).ok())
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn save_request(
    State(state): State<Arc<AppState>>,
    OptionalUser(user): OptionalUser,
    AppJson(body): AppJson<SaveRequestBody>,
) -> Result<Json<SaveRequestResponse>, ApiError> {
    let request = lifecycle::submit(
        &state.db,
        Utc::now(),
        NewRequest {
            email: body.email,
            image_data: body.image_data,
            image_position: body.image_position.map(|v| v.to_string()),
            link: body.link,
            pixel_count: body.pixel_count,
            pixels: body.pixels,
            price: body.price,
            telegram: body.telegram,
            text: body.text,
            user_id: user.map(|u| u.user_id),
        },
    )?;

    Ok(Json(SaveRequestResponse {
        message: "Request saved successfully. Our admin will contact you within 12 hours."
            .to_string(),
        request_id: request.id,
        success: true,
    }))
}

/// The public board read. Returns a bare array -- not the `{success, data}`
/// envelope -- and degrades to `[]` instead of surfacing an error: a broken
/// store must not take the public display down.
pub async fn load_project(State(state): State<Arc<AppState>>) -> Json<Vec<PublicRequestView>> {
    match lifecycle::list_visible(&state.db, Utc::now()) {
        Ok(requests) => Json(
            requests
                .into_iter()
                .map(PublicRequestView::from_request)
                .collect(),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load project, returning empty board");
            Json(Vec::new())
        }
    }
}
