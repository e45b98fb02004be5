use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Hours a pending request stays publicly visible.
pub const VISIBILITY_WINDOW_HOURS: i64 = 12;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// Lowercase-normalized, unique
    pub email: String,
    /// UUID identifier
    pub id: String,
    /// bcrypt hash (never the plaintext)
    pub password_hash: String,
    pub role: Role,
    pub updated_at: DateTime<Utc>,
    /// Lowercase-normalized, unique
    pub username: String,
}

/// Stored status of a pixel-claim request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Confirmed,
    #[default]
    Pending,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Confirmed => "confirmed",
            RequestStatus::Pending => "pending",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Parse a wire status. Returns `None` for anything outside the three
    /// valid values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(RequestStatus::Confirmed),
            "pending" => Some(RequestStatus::Pending),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }
}

/// A pixel-claim request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixelRequest {
    pub created_at: DateTime<Utc>,
    /// Contact email, trimmed; at least one of email/telegram is set
    pub email: Option<String>,
    /// UUID identifier
    pub id: String,
    /// Opaque image payload reference (e.g. base64 or an upload URL)
    pub image_data: Option<String>,
    /// Opaque placement metadata, stored as serialized JSON text
    /// (bincode cannot round-trip an arbitrary JSON value)
    pub image_position: Option<String>,
    pub link: Option<String>,
    pub pixel_count: Option<u32>,
    /// Selected pixels: coordinate key (e.g. "3,4") -> selected
    pub pixels: BTreeMap<String, bool>,
    pub price: Option<f64>,
    pub status: RequestStatus,
    /// Normalized telegram handle (leading `@`)
    pub telegram: Option<String>,
    pub text: Option<String>,
    pub updated_at: DateTime<Utc>,
    /// Owning user, None for anonymous submissions
    pub user_id: Option<String>,
}

impl PixelRequest {
    /// Whether a pending request has aged out of the public window.
    /// The boundary counts as expired: age of exactly 12h is not visible.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status == RequestStatus::Pending
            && now - self.created_at >= Duration::hours(VISIBILITY_WINDOW_HOURS)
    }

    /// Whether the request appears on the public board at `now`.
    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            RequestStatus::Confirmed => true,
            RequestStatus::Pending => !self.is_expired_at(now),
            RequestStatus::Rejected => false,
        }
    }

    /// Derived status for admin views: "expired" for aged-out pending
    /// requests, the stored status otherwise. Never persisted.
    pub fn effective_status_at(&self, now: DateTime<Utc>) -> &'static str {
        if self.is_expired_at(now) {
            "expired"
        } else {
            self.status.as_str()
        }
    }
}

/// A persisted bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub created_at: DateTime<Utc>,
    /// Far future by default; still checked on every lookup
    pub expires_at: DateTime<Utc>,
    pub role: Role,
    /// Opaque secret (32-byte hex), primary key
    pub token: String,
    pub user_id: String,
}

impl TokenRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// A server-side session, keyed by the sid carried in the cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Opaque sid (32-byte hex)
    pub id: String,
    pub role: Role,
    /// Bearer token issued alongside this session at login,
    /// None for sessions created at registration
    pub token: Option<String>,
    pub user_id: String,
    pub username: String,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
