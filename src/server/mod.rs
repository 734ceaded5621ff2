//! HTTP server for the trigger proxy.
//!
//! This module implements the HTTP surface that:
//! - Accepts change notifications on the root path and arms debounce
//!   timers for every subscribed job
//! - Provides a health check for liveness probes
//!
//! # Endpoints
//!
//! - `ANY /` - Accepts a notification with `repo`/`branch`/`files` query
//!   parameters (returns 202 Accepted)
//! - `GET /health` - Returns 200 if the server is running

use std::sync::Arc;

pub mod health;
pub mod hook;

pub use health::health_handler;
pub use hook::hook_handler;

use crate::debounce::DebounceRegistry;
use crate::mapping::MappingTable;

/// Shared application state.
///
/// Passed to all handlers via Axum's `State` extractor. The mapping table
/// is immutable after load; the registry carries its own interior
/// synchronization.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Lookup table from (repo, branch[, file]) keys to job lists.
    mapping: MappingTable,

    /// Debounce timers, shared with the timer tasks it spawns.
    registry: DebounceRegistry,

    /// Whether lookup keys include a file component.
    file_matching: bool,
}

impl AppState {
    /// Creates a new `AppState`.
    pub fn new(mapping: MappingTable, registry: DebounceRegistry, file_matching: bool) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                mapping,
                registry,
                file_matching,
            }),
        }
    }

    /// Returns the mapping table.
    pub fn mapping(&self) -> &MappingTable {
        &self.inner.mapping
    }

    /// Returns the debounce timer registry.
    pub fn registry(&self) -> &DebounceRegistry {
        &self.inner.registry
    }

    /// Returns true when file-matching mode is enabled.
    pub fn file_matching(&self) -> bool {
        self.inner.file_matching
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{any, get};

    // The original trigger sources use GET, but the method is not part of
    // the contract, so the root path accepts anything.
    axum::Router::new()
        .route("/", any(hook_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
