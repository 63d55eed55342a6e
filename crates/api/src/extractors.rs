//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use kinship_common::AppError;
use kinship_core::UserProfile;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserProfile);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<UserProfile>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}
