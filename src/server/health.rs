//! Liveness probe endpoint.
//!
//! The proxy holds no state worth inspecting here; answering at all is
//! the signal.

use axum::http::StatusCode;

/// Answers 200 OK with the text "OK" while the process is serving.
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
