//! User profile model (one-to-one with a user)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Profile record. The profile owns the link: `user_id` is unique, and a user
/// finds its profile by looking it up by owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub user_id: i64,
    pub address: String,
    pub phone: String,
}

/// Create profile request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProfile {
    #[validate(length(min = 1, max = 500, message = "Address is required, at most 500 characters"))]
    pub address: String,
    #[validate(length(min = 1, max = 64, message = "Phone is required, at most 64 characters"))]
    pub phone: String,
}

/// Update profile request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(length(min = 1, max = 500, message = "Address is required, at most 500 characters"))]
    pub address: String,
    #[validate(length(min = 1, max = 64, message = "Phone is required, at most 64 characters"))]
    pub phone: String,
}
