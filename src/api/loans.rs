//! Loan endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{CreateLoan, Loan, LoanDetails, LoanQuery, LoanReceipt},
};

use super::{ApiJson, ApiQuery};

#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    pub ok: bool,
    pub loan: Loan,
}

#[derive(Serialize, ToSchema)]
pub struct LoansListResponse {
    pub ok: bool,
    pub count: usize,
    pub items: Vec<LoanDetails>,
}

#[derive(Serialize, ToSchema)]
pub struct ReceiptResponse {
    pub ok: bool,
    pub receipt: LoanReceipt,
}

/// Lend a copy
#[utoipa::path(
    post,
    path = "/prestamos",
    tag = "loans",
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = LoanResponse),
        (status = 400, description = "Invalid loan type", body = crate::error::ErrorResponse),
        (status = 403, description = "User has an active sanction", body = crate::error::ErrorResponse),
        (status = 404, description = "User or copy not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Copy not available", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    ApiJson(data): ApiJson<CreateLoan>,
) -> AppResult<(StatusCode, Json<LoanResponse>)> {
    let loan = state.services.loans.create_loan(&data).await?;
    Ok((StatusCode::CREATED, Json(LoanResponse { ok: true, loan })))
}

/// List loans
#[utoipa::path(
    get,
    path = "/prestamos",
    tag = "loans",
    params(
        ("loan_type" = Option<String>, Query, description = "Comma-separated loan types (room, home)"),
        ("q" = Option<String>, Query, description = "Search in title, author, borrower and loan id"),
        ("overdue_only" = Option<bool>, Query, description = "Only overdue loans"),
        ("open_only" = Option<bool>, Query, description = "Only loans not returned"),
        ("limit" = Option<i64>, Query, description = "Maximum rows (default 200)")
    ),
    responses(
        (status = 200, description = "Loans, newest first", body = LoansListResponse),
        (status = 400, description = "Invalid loan type", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    ApiQuery(query): ApiQuery<LoanQuery>,
) -> AppResult<Json<LoansListResponse>> {
    let items = state.services.loans.list(&query).await?;
    Ok(Json(LoansListResponse { ok: true, count: items.len(), items }))
}

/// Loan receipt
#[utoipa::path(
    get,
    path = "/prestamos/{id}/comprobante",
    tag = "loans",
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Receipt", body = ReceiptResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_receipt(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ReceiptResponse>> {
    let receipt = state.services.loans.receipt(id).await?;
    Ok(Json(ReceiptResponse { ok: true, receipt }))
}
