//! HTTP route gateway (EMBP): each sibling module contributes a subrouter
//! and this module merges them and attaches the shared store.

use std::sync::Arc;

use axum::Router;

use crate::ReefStore;

mod analytics;
mod error;
mod extract;
mod health;
mod parameters;
mod tanks;

pub use error::ApiError;
pub use extract::{ApiJson, ApiPath, ApiQuery};

/// State shared by every handler: the injected tank registry and ledger.
pub type AppState = Arc<dyn ReefStore>;

// ---

/// Build the full API router over `store`.
///
/// Merges the tank, parameter, analytics and health subrouters, then
/// attaches the store as shared state. `main.rs` serves the result as-is.
///
/// # Returns
/// A stateless [`Router`] ready for `axum::serve`.
pub fn router(store: AppState) -> Router {
    // ---
    Router::new()
        .merge(tanks::router())
        .merge(parameters::router())
        .merge(analytics::router())
        .merge(health::router())
        .with_state(store)
}
