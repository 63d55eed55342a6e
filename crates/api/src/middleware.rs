//! API middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use kinship_core::FriendshipService;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Friendship operations and token lookup.
    pub friendship_service: FriendshipService,
}

impl AppState {
    #[must_use]
    pub const fn new(friendship_service: FriendshipService) -> Self {
        Self { friendship_service }
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions. Unauthenticated requests pass through; handlers that
/// need a user reject them via [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.friendship_service.authenticate(token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(error = %e, "Bearer token rejected"),
        }
    }

    next.run(req).await
}
