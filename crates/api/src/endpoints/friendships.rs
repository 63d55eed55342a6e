//! Friendship endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use kinship_common::{AppError, AppResult};
use kinship_core::{FriendCoworkingStatus, UserId, UserProfile};
use serde::Deserialize;
use validator::Validate;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, MessageResponse},
};

/// Coworking status update.
#[derive(Debug, Deserialize, Validate)]
pub struct CoworkingStatusForm {
    /// New coworking flag.
    #[validate(required(message = "is_coworking is required"))]
    pub is_coworking: Option<bool>,
}

/// Users the caller may still befriend.
async fn eligible_users(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserProfile>>> {
    let users = state.friendship_service.eligible_users(user.pid).await?;
    Ok(ApiResponse::ok(users))
}

/// Send a friend request.
async fn send_request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(receiver_id): Path<UserId>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state
        .friendship_service
        .send_request(user.pid, receiver_id)
        .await?;

    Ok(ApiResponse::ok(MessageResponse::new(
        "Friend request sent successfully.",
    )))
}

/// Senders of pending requests to the caller.
async fn received_requests(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserProfile>>> {
    let senders = state.friendship_service.received_requests(user.pid).await?;
    Ok(ApiResponse::ok(senders))
}

async fn received_requests_count(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<u64>> {
    let count = state
        .friendship_service
        .count_received_requests(user.pid)
        .await?;
    Ok(ApiResponse::ok(count))
}

/// Accept the request sent by `request_id`.
async fn accept(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<UserId>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state
        .friendship_service
        .accept_request(request_id, user.pid)
        .await?;
    Ok(ApiResponse::ok(MessageResponse::new(
        "Friend request accepted successfully.",
    )))
}

/// Reject the request sent by `request_id`.
async fn reject(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<UserId>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state
        .friendship_service
        .reject_request(request_id, user.pid)
        .await?;
    Ok(ApiResponse::ok(MessageResponse::new(
        "Friend request rejected successfully.",
    )))
}

async fn friends(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserProfile>>> {
    let friends = state.friendship_service.friends(user.pid).await?;
    Ok(ApiResponse::ok(friends))
}

/// Friends of `user_pid` with their coworking flag.
async fn friends_coworking_status(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(user_pid): Path<UserId>,
) -> AppResult<ApiResponse<Vec<FriendCoworkingStatus>>> {
    let friends = state
        .friendship_service
        .friends_with_status(user_pid)
        .await?;
    Ok(ApiResponse::ok(friends))
}

/// Set the coworking flag of `user_pid`.
async fn update_coworking(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Path(user_pid): Path<UserId>,
    Json(form): Json<CoworkingStatusForm>,
) -> AppResult<ApiResponse<MessageResponse>> {
    form.validate()?;
    let is_coworking = form
        .is_coworking
        .ok_or_else(|| AppError::Validation("is_coworking is required".to_string()))?;

    state
        .friendship_service
        .update_coworking(user_pid, is_coworking)
        .await?;
    Ok(ApiResponse::ok(MessageResponse::new("Coworking status updated.")))
}

/// Create the friendships router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(eligible_users))
        .route("/send-request/{receiver_id}", post(send_request))
        .route("/requests/received", get(received_requests))
        .route("/requests/received/count", get(received_requests_count))
        .route("/accept/{request_id}", put(accept))
        .route("/reject/{request_id}", put(reject))
        .route("/friends", get(friends))
        .route(
            "/friends-coworking-status/{user_pid}",
            get(friends_coworking_status),
        )
        .route("/update-coworking/{user_pid}", put(update_coworking))
}
