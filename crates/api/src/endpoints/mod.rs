//! API endpoints.

mod friendships;
mod health;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/friendships", friendships::router())
}
