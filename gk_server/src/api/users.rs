//! Profile handlers: the authenticated user (`/users/me`) and public
//! profiles of other accounts (`/users/{id}`).

use axum::{
    extract::{Extension, State},
    response::Response,
};
use gatekeeper::auth::{AuthContext, UpdateProfileRequest};
use serde::Deserialize;
use uuid::Uuid;

use super::{
    AppState,
    error::{ApiError, ApiJson, ApiPath},
    response,
};

#[derive(Debug, Deserialize)]
pub struct AvatarPayload {
    pub avatar_id: Uuid,
}

/// Current user's public profile.
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Response, ApiError> {
    let profile = state.sessions.profile(ctx.user_id).await?;
    Ok(response::ok(profile))
}

/// Public profile of any user by id.
///
/// # Errors
///
/// - `400 BAD_REQUEST`: `id` is not a UUID
/// - `404 NOT_FOUND`: no such user
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Response, ApiError> {
    let profile = state.sessions.profile(user_id).await?;
    Ok(response::ok(profile))
}

/// Update name and/or bio.
///
/// # Errors
///
/// - `400 VALIDATION_ERROR`: name outside 2..=100 chars or bio over 500
/// - `404 NOT_FOUND`: the account was removed after the token was issued
pub async fn update_me(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<Response, ApiError> {
    let profile = state.sessions.update_profile(ctx.user_id, payload).await?;
    Ok(response::ok(profile))
}

/// Point the profile at an already-uploaded avatar image.
pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    ApiJson(payload): ApiJson<AvatarPayload>,
) -> Result<Response, ApiError> {
    let profile = state
        .sessions
        .assign_avatar(ctx.user_id, payload.avatar_id)
        .await?;
    Ok(response::ok(profile))
}
