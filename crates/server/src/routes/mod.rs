//! JSON API routes under `/api/v1`.

pub mod companies;
pub mod customers;

use axum::Router;
use serde::Serialize;

use crate::state::AppState;

/// Build the full API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(customers::router())
        .merge(companies::router())
}

/// Plain confirmation body for delete endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable confirmation.
    pub message: String,
}
