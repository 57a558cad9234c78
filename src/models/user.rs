//! User model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Library user (borrower)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    /// Unique across all users
    pub email: String,
    pub full_name: String,
}

/// Create user request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "Email is at most 255 characters")
    )]
    pub email: String,
    #[validate(length(min = 1, max = 255, message = "Full name is required, at most 255 characters"))]
    pub full_name: String,
}

/// Update user request. The email is immutable once registered.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 255, message = "Full name is required, at most 255 characters"))]
    pub full_name: String,
}
