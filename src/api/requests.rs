//! Pickup request (solicitud) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::request::{
        CreateRequest, Request, RequestDetails, RequestQuery, RequestSummary, UpdateRequest,
    },
};

use super::{ApiJson, ApiQuery};

#[derive(Serialize, ToSchema)]
pub struct RequestsListResponse {
    pub ok: bool,
    pub count: usize,
    pub items: Vec<RequestSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct RequestDetailsResponse {
    pub ok: bool,
    pub request: RequestDetails,
}

#[derive(Serialize, ToSchema)]
pub struct RequestResponse {
    pub ok: bool,
    pub request: Request,
}

/// Create a request
#[utoipa::path(
    post,
    path = "/solicitudes",
    tag = "requests",
    request_body = CreateRequest,
    responses(
        (status = 201, description = "Request created with its items", body = RequestDetailsResponse),
        (status = 400, description = "Missing user or items", body = crate::error::ErrorResponse),
        (status = 404, description = "User, book or copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_request(
    State(state): State<crate::AppState>,
    ApiJson(data): ApiJson<CreateRequest>,
) -> AppResult<(StatusCode, Json<RequestDetailsResponse>)> {
    let request = state.services.requests.create(&data).await?;
    Ok((StatusCode::CREATED, Json(RequestDetailsResponse { ok: true, request })))
}

/// List requests
#[utoipa::path(
    get,
    path = "/solicitudes",
    tag = "requests",
    params(
        ("status" = Option<String>, Query, description = "Comma-separated statuses"),
        ("librarian_id" = Option<i32>, Query, description = "Assigned librarian"),
        ("from" = Option<String>, Query, description = "Created at or after (RFC 3339)"),
        ("to" = Option<String>, Query, description = "Created at or before (RFC 3339)"),
        ("limit" = Option<i64>, Query, description = "Maximum rows (default 200)")
    ),
    responses(
        (status = 200, description = "Requests, newest first", body = RequestsListResponse),
        (status = 400, description = "Unknown status or bad range", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_requests(
    State(state): State<crate::AppState>,
    ApiQuery(query): ApiQuery<RequestQuery>,
) -> AppResult<Json<RequestsListResponse>> {
    let items = state.services.requests.list(&query).await?;
    Ok(Json(RequestsListResponse { ok: true, count: items.len(), items }))
}

/// Get a request with its items
#[utoipa::path(
    get,
    path = "/solicitudes/{id}",
    tag = "requests",
    params(("id" = i32, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request details", body = RequestDetailsResponse),
        (status = 404, description = "Request not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_request(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<RequestDetailsResponse>> {
    let request = state.services.requests.get(id).await?;
    Ok(Json(RequestDetailsResponse { ok: true, request }))
}

/// Update status, librarian or notes
#[utoipa::path(
    patch,
    path = "/solicitudes/{id}",
    tag = "requests",
    params(("id" = i32, Path, description = "Request ID")),
    request_body = UpdateRequest,
    responses(
        (status = 200, description = "Request updated", body = RequestResponse),
        (status = 400, description = "Invalid transition or librarian", body = crate::error::ErrorResponse),
        (status = 404, description = "Request not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_request(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    ApiJson(data): ApiJson<UpdateRequest>,
) -> AppResult<Json<RequestResponse>> {
    let request = state.services.requests.update(id, &data).await?;
    Ok(Json(RequestResponse { ok: true, request }))
}
