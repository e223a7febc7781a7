//! Error types for SisBib server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::enums::{CopyStatus, RequestStatus};

/// Stable error codes returned to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NotFound = 4,
    BadValue = 5,
    Duplicate = 6,
    InvalidLoanType = 7,
    UserBlocked = 8,
    CopyUnavailable = 9,
    AlreadyReturned = 10,
    InvalidTransition = 11,
    MailFailure = 12,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Invalid loan type: {0}")]
    InvalidLoanType(String),

    #[error("User {user_id} is blocked until {until}")]
    UserBlocked { user_id: i32, until: DateTime<Utc> },

    #[error("Copy {copy_id} is not available (status: {status})")]
    CopyUnavailable { copy_id: i32, status: CopyStatus },

    #[error("Loan {0} was already returned")]
    AlreadyReturned(i32),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: RequestStatus, to: RequestStatus },
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub ok: bool,
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl AppError {
    fn parts(&self) -> (StatusCode, ErrorCode, String) {
        match self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg.clone()),
            AppError::Validation(msg) | AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    format!("Database error: {}", e),
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
            AppError::Mail(msg) => {
                tracing::error!("Mail error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::MailFailure, msg.clone())
            }
            AppError::InvalidLoanType(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidLoanType, self.to_string())
            }
            AppError::UserBlocked { .. } => {
                (StatusCode::FORBIDDEN, ErrorCode::UserBlocked, self.to_string())
            }
            AppError::CopyUnavailable { .. } => {
                (StatusCode::CONFLICT, ErrorCode::CopyUnavailable, self.to_string())
            }
            AppError::AlreadyReturned(_) => {
                (StatusCode::CONFLICT, ErrorCode::AlreadyReturned, self.to_string())
            }
            AppError::InvalidTransition { .. } => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidTransition, self.to_string())
            }
        }
    }

    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    /// True when the error came from a unique-constraint violation in the store
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(ErrorResponse {
            ok: false,
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::InvalidLoanType("boat".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::UserBlocked { user_id: 1, until: Utc::now() }.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::CopyUnavailable { copy_id: 3, status: CopyStatus::Borrowed }.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::AlreadyReturned(9).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::NotFound("Loan 4 not found".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_transition_message_reports_pair() {
        let err = AppError::InvalidTransition {
            from: RequestStatus::Served,
            to: RequestStatus::Ready,
        };
        assert_eq!(err.to_string(), "Invalid transition: served -> ready");
    }

    #[test]
    fn test_copy_unavailable_reports_status() {
        let err = AppError::CopyUnavailable { copy_id: 7, status: CopyStatus::Reconditioning };
        assert!(err.to_string().contains("reconditioning"));
    }
}
