//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::Role;
use crate::error::AppError;

/// Internal row structure for database queries (role kept as stored text)
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub second_last_name: Option<String>,
    pub rut_number: Option<i32>,
    pub rut_check_digit: Option<String>,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::normalize(&row.role).map_err(|_| {
            AppError::Internal(format!("User {} has unrecognized role '{}'", row.id, row.role))
        })?;

        Ok(User {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            second_last_name: row.second_last_name,
            rut_number: row.rut_number,
            rut_check_digit: row.rut_check_digit,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

/// Full user model
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub second_last_name: Option<String>,
    pub rut_number: Option<i32>,
    pub rut_check_digit: Option<String>,
    pub email: String,
    /// Argon2 hash, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

/// Given name followed by one or two last names
pub fn full_name(first_name: &str, last_name: &str, second_last_name: Option<&str>) -> String {
    match second_last_name {
        Some(second) if !second.is_empty() => format!("{} {} {}", first_name, last_name, second),
        _ => format!("{} {}", first_name, last_name),
    }
}

/// User summary returned on login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub second_last_name: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            second_last_name: user.second_last_name.clone(),
        }
    }
}

/// User query parameters
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    /// Search across names, email and RUT number
    pub q: Option<String>,
    pub limit: Option<i64>,
}

/// Create user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, message = "First name is required"))]
    #[serde(alias = "nombre")]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    #[serde(alias = "apellido1")]
    pub last_name: String,
    #[serde(alias = "apellido2")]
    pub second_last_name: Option<String>,
    #[validate(range(min = 1, message = "RUT number must be positive"))]
    #[serde(alias = "rut_numero")]
    pub rut_number: i32,
    #[validate(length(equal = 1, message = "RUT check digit must be a single character"))]
    #[serde(alias = "rut_dv")]
    pub rut_check_digit: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Free-text role, normalized on creation
    pub role: String,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    /// Role the client expects to log in as
    pub role: Option<String>,
}
