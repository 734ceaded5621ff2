//! Inbound notification handler.
//!
//! Accepts a change notification on the root path, resolves the
//! subscribed jobs through the mapping table, and arms a debounce timer
//! for each of them. The response is always `202 Accepted`: triggering is
//! fire-and-forget from the sender's perspective, and even a malformed
//! event is acknowledged rather than surfaced (the failure is only
//! visible in the logs).
//!
//! # Request
//!
//! Any method on `/`, with query parameters:
//! - `repo` (required) - repository identifier as used in the mapping
//! - `branch` (optional) - defaults to `master`
//! - `files` (optional) - comma-separated changed files, only consulted
//!   in file-matching mode

use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::AppState;
use crate::key::build_key;
use crate::types::LookupKey;

/// Branch assumed when the notification does not name one.
const DEFAULT_BRANCH: &str = "master";

/// Query parameters of an inbound notification.
///
/// Everything is optional at the extraction layer so a missing `repo`
/// can be logged and dropped instead of producing an axum rejection.
#[derive(Debug, Deserialize)]
pub struct HookParams {
    repo: Option<String>,
    branch: Option<String>,
    files: Option<String>,
}

/// Notification handler.
///
/// Builds one lookup key per event (or one per carried file in
/// file-matching mode), collects the subscribed jobs, and arms the
/// debounce timer for each. An event that matches nothing ends silently.
pub async fn hook_handler(
    State(state): State<AppState>,
    Query(params): Query<HookParams>,
) -> (StatusCode, &'static str) {
    let Some(repo) = params.repo else {
        warn!("Notification is missing the repo parameter, dropping it");
        return (StatusCode::ACCEPTED, "Accepted");
    };

    let branch = params.branch.unwrap_or_else(|| {
        debug!("Notification has no branch parameter, assuming {DEFAULT_BRANCH}");
        DEFAULT_BRANCH.to_string()
    });

    let files: Vec<&str> = params
        .files
        .as_deref()
        .map(|f| f.split(',').filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    debug!(
        repo = %repo,
        branch = %branch,
        file_count = files.len(),
        "Handling notification"
    );

    // In file-matching mode each carried file gets its own 3-part key;
    // otherwise the event resolves through a single 2-part key.
    let keys: Vec<LookupKey> = if state.file_matching() {
        files
            .iter()
            .map(|&file| build_key(&[repo.as_str(), branch.as_str(), file]))
            .collect()
    } else {
        vec![build_key(&[repo.as_str(), branch.as_str()])]
    };

    let mut armed = 0usize;
    for key in &keys {
        let jobs = state.mapping().lookup(key);
        if jobs.is_empty() {
            debug!(key = %key, "No mappings found for key");
            continue;
        }

        for job in jobs {
            state.registry().arm(job.clone()).await;
            armed += 1;
        }
    }

    if armed > 0 {
        info!(repo = %repo, branch = %branch, armed, "Armed timers for notification");
    } else {
        debug!(repo = %repo, branch = %branch, "Notification matched no jobs");
    }

    (StatusCode::ACCEPTED, "Accepted")
}
