//! The pixel-claim request lifecycle: submission, visibility, transitions.
//!
//! Statuses form a flat graph: an admin may move a request from any status
//! to any other, including back out of `rejected`. Visibility is derived,
//! never stored: pending requests fall off the public board 12 hours after
//! submission without any write happening.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::storage::models::{PixelRequest, RequestStatus};
use crate::storage::Database;

use super::validate::{normalize_telegram, validate_email, validate_link, ValidationError};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Database error: {0}")]
    Database(#[from] crate::storage::DatabaseError),
    #[error("Request not found")]
    NotFound,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A submission, before validation.
#[derive(Debug, Default)]
pub struct NewRequest {
    pub email: Option<String>,
    pub image_data: Option<String>,
    /// Opaque placement metadata, pre-serialized to JSON text
    pub image_position: Option<String>,
    pub link: Option<String>,
    pub pixel_count: Option<u32>,
    pub pixels: BTreeMap<String, bool>,
    pub price: Option<f64>,
    pub telegram: Option<String>,
    pub text: Option<String>,
    pub user_id: Option<String>,
}

/// Trim a free-text field, collapsing whitespace-only input to None.
fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate and persist a new request. The request starts out pending with
/// both timestamps set to `now`, and is returned with its generated id.
pub fn submit(
    db: &Database,
    now: DateTime<Utc>,
    new: NewRequest,
) -> Result<PixelRequest, RequestError> {
    let email = trimmed(new.email);
    let telegram = trimmed(new.telegram);
    let link = trimmed(new.link);
    let text = trimmed(new.text);

    if email.is_none() && telegram.is_none() {
        return Err(ValidationError::MissingContact.into());
    }
    if let Some(email) = &email {
        validate_email(email)?;
    }
    let telegram = match telegram {
        Some(handle) => Some(normalize_telegram(&handle)?),
        None => None,
    };
    if let Some(link) = &link {
        validate_link(link)?;
    }

    let request = PixelRequest {
        created_at: now,
        email,
        id: uuid::Uuid::new_v4().to_string(),
        image_data: new.image_data,
        image_position: new.image_position,
        link,
        pixel_count: new.pixel_count,
        pixels: new.pixels,
        price: new.price,
        status: RequestStatus::Pending,
        telegram,
        text,
        updated_at: now,
        user_id: new.user_id,
    };

    db.put_request(&request)?;
    tracing::debug!(id = %request.id, anonymous = request.user_id.is_none(), "Saved pixel request");

    Ok(request)
}

/// The public board: every confirmed request, then every pending request
/// still inside its 12-hour window, each group ordered newest first.
/// Rejected and aged-out pending requests never appear.
pub fn list_visible(db: &Database, now: DateTime<Utc>) -> Result<Vec<PixelRequest>, RequestError> {
    let mut confirmed = Vec::new();
    let mut pending = Vec::new();

    for request in db.all_requests()? {
        match request.status {
            RequestStatus::Confirmed => confirmed.push(request),
            RequestStatus::Pending if request.is_visible_at(now) => pending.push(request),
            _ => {}
        }
    }

    confirmed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    confirmed.extend(pending);

    Ok(confirmed)
}

/// The admin view: every request regardless of visibility, newest first.
/// Callers derive the expired annotation via
/// [`PixelRequest::effective_status_at`].
pub fn list_all(db: &Database) -> Result<Vec<PixelRequest>, RequestError> {
    let mut requests = db.all_requests()?;
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(requests)
}

/// Overwrite a request's status. Succeeds for any current/target pair;
/// the graph is intentionally unguarded. Fails only for an unknown id.
pub fn transition(
    db: &Database,
    request_id: &str,
    status: RequestStatus,
    now: DateTime<Utc>,
) -> Result<PixelRequest, RequestError> {
    let updated = db
        .update_request_status(request_id, status, now)?
        .ok_or(RequestError::NotFound)?;

    tracing::debug!(id = %request_id, status = status.as_str(), "Changed request status");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::setup_db;
    use chrono::Duration;

    fn contact_request() -> NewRequest {
        NewRequest {
            email: Some("a@b.com".to_string()),
            pixels: BTreeMap::from([("3,4".to_string(), true)]),
            ..Default::default()
        }
    }

    #[test]
    fn test_submit_requires_contact() {
        let (db, _temp) = setup_db();

        let err = submit(&db, Utc::now(), NewRequest::default()).unwrap_err();
        assert!(matches!(
            err,
            RequestError::Validation(ValidationError::MissingContact)
        ));

        // Whitespace-only contact fields count as absent
        let err = submit(
            &db,
            Utc::now(),
            NewRequest {
                email: Some("   ".to_string()),
                telegram: Some(" ".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Validation(ValidationError::MissingContact)
        ));
    }

    #[test]
    fn test_submit_accepts_either_contact() {
        let (db, _temp) = setup_db();

        let by_email = submit(&db, Utc::now(), contact_request()).unwrap();
        assert_eq!(by_email.status, RequestStatus::Pending);
        assert_eq!(by_email.email.as_deref(), Some("a@b.com"));

        let by_telegram = submit(
            &db,
            Utc::now(),
            NewRequest {
                telegram: Some("pixel_fan".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(by_telegram.telegram.as_deref(), Some("@pixel_fan"));
    }

    #[test]
    fn test_submit_rejects_bad_fields() {
        let (db, _temp) = setup_db();

        let err = submit(
            &db,
            Utc::now(),
            NewRequest {
                email: Some("nope".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Validation(ValidationError::InvalidEmail)
        ));

        let err = submit(
            &db,
            Utc::now(),
            NewRequest {
                email: Some("a@b.com".to_string()),
                link: Some("not a url".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RequestError::Validation(ValidationError::InvalidLink)
        ));
    }

    #[test]
    fn test_visibility_window() {
        let (db, _temp) = setup_db();
        let now = Utc::now();

        let fresh = submit(&db, now, contact_request()).unwrap();

        // Fresh pending request is on the board
        let visible = list_visible(&db, now).unwrap();
        assert!(visible.iter().any(|r| r.id == fresh.id));

        // Still there one second before the boundary
        let almost = now + Duration::hours(12) - Duration::seconds(1);
        assert!(list_visible(&db, almost).unwrap().iter().any(|r| r.id == fresh.id));

        // Gone at exactly 12 hours
        let boundary = now + Duration::hours(12);
        assert!(!list_visible(&db, boundary).unwrap().iter().any(|r| r.id == fresh.id));

        // Confirmed requests never age out
        transition(&db, &fresh.id, RequestStatus::Confirmed, now).unwrap();
        let much_later = now + Duration::days(30);
        assert!(list_visible(&db, much_later).unwrap().iter().any(|r| r.id == fresh.id));
    }

    #[test]
    fn test_rejected_never_visible() {
        let (db, _temp) = setup_db();
        let now = Utc::now();

        let request = submit(&db, now, contact_request()).unwrap();
        transition(&db, &request.id, RequestStatus::Rejected, now).unwrap();

        assert!(list_visible(&db, now).unwrap().is_empty());
    }

    #[test]
    fn test_visible_ordering_confirmed_then_pending_newest_first() {
        let (db, _temp) = setup_db();
        let now = Utc::now();

        let p_old = submit(&db, now - Duration::hours(2), contact_request()).unwrap();
        let p_new = submit(&db, now - Duration::hours(1), contact_request()).unwrap();
        let c_old = submit(&db, now - Duration::days(2), contact_request()).unwrap();
        let c_new = submit(&db, now - Duration::days(1), contact_request()).unwrap();
        transition(&db, &c_old.id, RequestStatus::Confirmed, now).unwrap();
        transition(&db, &c_new.id, RequestStatus::Confirmed, now).unwrap();

        let ids: Vec<String> = list_visible(&db, now)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![c_new.id, c_old.id, p_new.id, p_old.id]);
    }

    #[test]
    fn test_transition_unknown_id() {
        let (db, _temp) = setup_db();

        let err = transition(&db, "missing", RequestStatus::Confirmed, Utc::now()).unwrap_err();
        assert!(matches!(err, RequestError::NotFound));
    }

    #[test]
    fn test_transition_graph_is_flat() {
        let (db, _temp) = setup_db();
        let now = Utc::now();

        let request = submit(&db, now, contact_request()).unwrap();

        // Any status can move to any other, including rejected -> confirmed
        transition(&db, &request.id, RequestStatus::Rejected, now).unwrap();
        let back = transition(&db, &request.id, RequestStatus::Confirmed, now).unwrap();
        assert_eq!(back.status, RequestStatus::Confirmed);

        // Same-state transitions succeed too
        let same = transition(&db, &request.id, RequestStatus::Confirmed, now).unwrap();
        assert_eq!(same.status, RequestStatus::Confirmed);
    }

    #[test]
    fn test_effective_status_in_admin_listing() {
        let (db, _temp) = setup_db();
        let now = Utc::now();

        let request = submit(&db, now, contact_request()).unwrap();

        let later = now + Duration::hours(12) + Duration::seconds(1);
        let all = list_all(&db).unwrap();
        let row = all.iter().find(|r| r.id == request.id).unwrap();

        assert_eq!(row.effective_status_at(now), "pending");
        assert_eq!(row.effective_status_at(later), "expired");
        assert_eq!(row.status, RequestStatus::Pending); // stored status untouched
    }
}
