use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::tokens::{bearer, session};
use crate::AppState;

/// Start the background expiration cleaner task. Bearer tokens and
/// sessions also expire lazily on lookup; the sweep catches the rows
/// nobody asks for again.
pub fn start_expiration_cleaner(state: Arc<AppState>) -> JoinHandle<()> {
    let interval = Duration::from_secs(state.config.tokens.cleanup_interval_seconds);

    tokio::spawn(async move {
        let mut interval_timer = tokio::time::interval(interval);

        loop {
            interval_timer.tick().await;
            run_cleanup(&state).await;
        }
    })
}

async fn run_cleanup(state: &AppState) {
    debug!("Running expiration cleanup");

    let db = state.db.clone();
    let result = tokio::task::spawn_blocking(move || {
        let tokens = bearer::cleanup_expired(&db);
        let sessions = session::cleanup_expired(&db);
        (tokens, sessions)
    })
    .await;

    let (token_result, session_result) = match result {
        Ok(results) => results,
        Err(e) => {
            error!(error = %e, "Expiration cleanup task panicked");
            return;
        }
    };

    match token_result {
        Ok(count) if count > 0 => debug!(tokens_cleaned = count, "Expired bearer tokens cleaned"),
        Err(e) => error!(error = %e, "Failed to clean up expired bearer tokens"),
        _ => {}
    }

    match session_result {
        Ok(count) if count > 0 => debug!(sessions_cleaned = count, "Expired sessions cleaned"),
        Err(e) => error!(error = %e, "Failed to clean up expired sessions"),
        _ => {}
    }
}
