//! User profile endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::profile::{CreateProfile, UpdateProfile, UserProfile},
};

/// Create the profile of a user
#[utoipa::path(
    post,
    path = "/users/{id}/profile",
    tag = "profiles",
    params(("id" = i64, Path, description = "User ID")),
    request_body = CreateProfile,
    responses(
        (status = 201, description = "Profile created", body = UserProfile),
        (status = 400, description = "User already has a profile", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_profile(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i64>,
    Json(request): Json<CreateProfile>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    request.validate()?;

    let profile = state.services.profiles.create(user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Get profile by ID
#[utoipa::path(
    get,
    path = "/profiles/{id}",
    tag = "profiles",
    params(("id" = i64, Path, description = "Profile ID")),
    responses(
        (status = 200, description = "Profile details", body = UserProfile),
        (status = 404, description = "Profile not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_profile(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<UserProfile>> {
    let profile = state.services.profiles.get_by_id(id).await?;
    Ok(Json(profile))
}

/// Update address and phone
#[utoipa::path(
    put,
    path = "/profiles/{id}",
    tag = "profiles",
    params(("id" = i64, Path, description = "Profile ID")),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = UserProfile),
        (status = 404, description = "Profile not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_profile(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateProfile>,
) -> AppResult<Json<UserProfile>> {
    request.validate()?;

    let profile = state.services.profiles.update(id, &request).await?;
    Ok(Json(profile))
}

/// Delete a profile (the user is kept)
#[utoipa::path(
    delete,
    path = "/profiles/{id}",
    tag = "profiles",
    params(("id" = i64, Path, description = "Profile ID")),
    responses(
        (status = 204, description = "Profile deleted"),
        (status = 404, description = "Profile not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_profile(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.profiles.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
