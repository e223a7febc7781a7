//! Copy (ejemplar) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::copy::{BookCopy, CreateCopy, UpdateCopy},
};

use super::{ApiJson, OkResponse};

#[derive(Serialize, ToSchema)]
pub struct CopiesListResponse {
    pub ok: bool,
    pub count: usize,
    pub items: Vec<BookCopy>,
}

#[derive(Serialize, ToSchema)]
pub struct CopyResponse {
    pub ok: bool,
    pub copy: BookCopy,
}

/// Copies of a book
#[utoipa::path(
    get,
    path = "/libros/{id}/ejemplares",
    tag = "catalog",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Copies of the book", body = CopiesListResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_copies(
    State(state): State<crate::AppState>,
    Path(book_id): Path<i32>,
) -> AppResult<Json<CopiesListResponse>> {
    let items = state.services.catalog.list_copies(book_id).await?;
    Ok(Json(CopiesListResponse { ok: true, count: items.len(), items }))
}

/// Create a copy
#[utoipa::path(
    post,
    path = "/ejemplares",
    tag = "catalog",
    request_body = CreateCopy,
    responses(
        (status = 201, description = "Copy created", body = CopyResponse),
        (status = 400, description = "Missing book or invalid status", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_copy(
    State(state): State<crate::AppState>,
    ApiJson(data): ApiJson<CreateCopy>,
) -> AppResult<(StatusCode, Json<CopyResponse>)> {
    let copy = state.services.catalog.create_copy(data).await?;
    Ok((StatusCode::CREATED, Json(CopyResponse { ok: true, copy })))
}

/// Update a copy (partial)
#[utoipa::path(
    put,
    path = "/ejemplares/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Copy ID")),
    request_body = UpdateCopy,
    responses(
        (status = 200, description = "Copy updated", body = CopyResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Copy has an open loan, or status reserved to loans", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_copy(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    ApiJson(data): ApiJson<UpdateCopy>,
) -> AppResult<Json<CopyResponse>> {
    let copy = state.services.catalog.update_copy(id, data).await?;
    Ok(Json(CopyResponse { ok: true, copy }))
}

/// Delete a copy
#[utoipa::path(
    delete,
    path = "/ejemplares/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Copy ID")),
    responses(
        (status = 200, description = "Copy deleted", body = OkResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Copy has an open loan or loan history", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_copy(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<OkResponse>> {
    state.services.catalog.delete_copy(id).await?;
    Ok(OkResponse::json())
}
