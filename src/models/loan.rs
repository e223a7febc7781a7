//! Loan (prestamo) model and related types

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::LoanType;
use super::sanction::Sanction;
use super::user::full_name;
use crate::error::{AppError, AppResult};

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub copy_id: i32,
    pub book_id: i32,
    pub loan_type: LoanType,
    pub reserved_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub overdue: bool,
}

/// Loan joined with borrower and book, for listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub loan_type: LoanType,
    pub reserved_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub overdue: bool,
    pub copy_id: i32,
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub second_last_name: Option<String>,
    pub email: String,
    pub book_id: i32,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    /// Open and past due, or already flagged overdue
    pub is_overdue: bool,
}

/// Create loan request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoan {
    pub user_id: i32,
    #[serde(alias = "id_ejemplar", alias = "ejemplar_id")]
    pub copy_id: i32,
    /// "room" or "home" (also accepts "sala" / "domicilio")
    #[serde(alias = "tipo", alias = "tipo_prestamo")]
    pub loan_type: String,
}

/// Loan list query parameters
#[derive(Debug, Default, Deserialize)]
pub struct LoanQuery {
    /// Comma-separated loan types
    #[serde(alias = "tipo")]
    pub loan_type: Option<String>,
    pub q: Option<String>,
    pub overdue_only: Option<bool>,
    pub open_only: Option<bool>,
    pub limit: Option<i64>,
}

/// Raw receipt row (loan joined with user and book)
#[derive(Debug, Clone, FromRow)]
pub struct ReceiptRow {
    pub id: i32,
    pub loan_type: LoanType,
    pub reserved_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub copy_id: i32,
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub second_last_name: Option<String>,
    pub email: String,
    pub book_id: i32,
    pub title: String,
    pub author: String,
}

/// Loan receipt with ISO-8601 timestamps
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanReceipt {
    pub loan_id: i32,
    pub loan_type: LoanType,
    pub reserved_at: String,
    pub due_at: String,
    pub returned_at: Option<String>,
    pub copy_id: i32,
    pub user_id: i32,
    pub borrower: String,
    pub email: String,
    pub book_id: i32,
    pub title: String,
    pub author: String,
}

fn iso8601(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl From<ReceiptRow> for LoanReceipt {
    fn from(row: ReceiptRow) -> Self {
        let borrower = full_name(&row.first_name, &row.last_name, row.second_last_name.as_deref());

        LoanReceipt {
            loan_id: row.id,
            loan_type: row.loan_type,
            reserved_at: iso8601(row.reserved_at),
            due_at: iso8601(row.due_at),
            returned_at: row.returned_at.map(iso8601),
            copy_id: row.copy_id,
            user_id: row.user_id,
            borrower,
            email: row.email,
            book_id: row.book_id,
            title: row.title,
            author: row.author,
        }
    }
}

/// Return registration request: either a loan id or a copy id
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RegisterReturn {
    #[serde(alias = "prestamo_id")]
    pub loan_id: Option<i32>,
    #[serde(alias = "id_ejemplar", alias = "ejemplar_id")]
    pub copy_id: Option<i32>,
}

/// Which loan a return refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnTarget {
    Loan(i32),
    /// Most recent loan of this copy
    Copy(i32),
}

impl RegisterReturn {
    /// Loan id wins when both are given
    pub fn target(&self) -> AppResult<ReturnTarget> {
        match (self.loan_id, self.copy_id) {
            (Some(loan_id), _) => Ok(ReturnTarget::Loan(loan_id)),
            (None, Some(copy_id)) => Ok(ReturnTarget::Copy(copy_id)),
            (None, None) => Err(AppError::Validation(
                "loan_id or copy_id is required".to_string(),
            )),
        }
    }
}

/// Outcome of a registered return
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReturnOutcome {
    pub loan_id: i32,
    pub copy_id: i32,
    pub returned_at: DateTime<Utc>,
    pub overdue: bool,
    pub sanction: Option<Sanction>,
    pub release_delay_minutes: i64,
    /// When the copy is expected back in `available`, if the release timer was scheduled
    pub release_at: Option<DateTime<Utc>>,
}

/// Open overdue loan selected by the notification sweep
#[derive(Debug, Clone, FromRow)]
pub struct OverdueLoan {
    pub id: i32,
    pub due_at: DateTime<Utc>,
    pub email: String,
    pub first_name: String,
    pub title: String,
}
