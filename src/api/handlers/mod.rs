mod admin;
mod auth;
mod requests;

pub use admin::{approve_request, change_status, list_requests, reject_request};
pub use auth::{login, logout, me, register};
pub use requests::{load_project, save_request};
