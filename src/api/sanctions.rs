//! Sanction endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::sanction::{BlockStatus, BlockStatusQuery, Sanction, SanctionQuery},
};

use super::ApiQuery;

#[derive(Serialize, ToSchema)]
pub struct SanctionsListResponse {
    pub ok: bool,
    pub count: usize,
    pub items: Vec<Sanction>,
}

#[derive(Serialize, ToSchema)]
pub struct BlockStatusResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub status: BlockStatus,
}

/// List sanctions
#[utoipa::path(
    get,
    path = "/sanciones",
    tag = "sanctions",
    params(
        ("user_id" = Option<i32>, Query, description = "Only this user's sanctions"),
        ("active_only" = Option<bool>, Query, description = "Only sanctions still running")
    ),
    responses(
        (status = 200, description = "Sanctions, latest ending first", body = SanctionsListResponse)
    )
)]
pub async fn list_sanctions(
    State(state): State<crate::AppState>,
    ApiQuery(query): ApiQuery<SanctionQuery>,
) -> AppResult<Json<SanctionsListResponse>> {
    let items = state.services.sanctions.list(&query).await?;
    Ok(Json(SanctionsListResponse { ok: true, count: items.len(), items }))
}

/// Whether a user is blocked
#[utoipa::path(
    get,
    path = "/sanciones/estado",
    tag = "sanctions",
    params(("user_id" = i32, Query, description = "User ID")),
    responses(
        (status = 200, description = "Block status", body = BlockStatusResponse),
        (status = 400, description = "Missing user_id", body = crate::error::ErrorResponse)
    )
)]
pub async fn block_status(
    State(state): State<crate::AppState>,
    ApiQuery(query): ApiQuery<BlockStatusQuery>,
) -> AppResult<Json<BlockStatusResponse>> {
    let status = state.services.sanctions.block_status(query.user_id).await?;
    Ok(Json(BlockStatusResponse { ok: true, status }))
}
