//! Return (devolucion) endpoint

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{RegisterReturn, ReturnOutcome},
};

use super::ApiJson;

#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub outcome: ReturnOutcome,
}

/// Register a return by loan id or copy id
#[utoipa::path(
    post,
    path = "/devoluciones",
    tag = "loans",
    request_body = RegisterReturn,
    responses(
        (status = 200, description = "Return registered", body = ReturnResponse),
        (status = 400, description = "Neither loan_id nor copy_id given", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Loan already returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn register_return(
    State(state): State<crate::AppState>,
    ApiJson(data): ApiJson<RegisterReturn>,
) -> AppResult<Json<ReturnResponse>> {
    let outcome = state.services.returns.register_return(&data).await?;
    Ok(Json(ReturnResponse { ok: true, outcome }))
}
