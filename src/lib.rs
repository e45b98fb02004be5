//! pixelboard - backend for a collaborative pixel board
//!
//! Users claim sets of pixels (optionally with an image, link, text, and
//! contact details); an admin confirms or rejects each claim; the public
//! board shows confirmed claims plus pending ones younger than 12 hours.
//! This crate provides:
//! - Session-cookie and bearer-token authentication, either sufficient
//! - A flat pending/confirmed/rejected request lifecycle with derived
//!   visibility (nothing is written when a claim ages out)
//! - redb embedded storage (users, requests, tokens, sessions)
//! - Lazy credential expiry plus a background cleanup sweep
//! - REST API

pub mod api;
pub mod config;
pub mod expiration;
pub mod requests;
pub mod storage;
#[cfg(test)]
pub mod testutil;
pub mod tokens;
pub mod users;

use config::Config;
use storage::Database;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub db: Database,
}
