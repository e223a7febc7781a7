//! Book catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book::{Book, BookDetails, BookQuery, CreateBook, UpdateBook},
};

use super::{ApiJson, ApiQuery, OkResponse};

#[derive(Serialize, ToSchema)]
pub struct BooksListResponse {
    pub ok: bool,
    pub count: usize,
    pub items: Vec<Book>,
}

#[derive(Serialize, ToSchema)]
pub struct BookResponse {
    pub ok: bool,
    pub book: Book,
}

#[derive(Serialize, ToSchema)]
pub struct BookDetailsResponse {
    pub ok: bool,
    pub book: BookDetails,
}

/// List books
#[utoipa::path(
    get,
    path = "/libros",
    tag = "catalog",
    params(
        ("q" = Option<String>, Query, description = "Search in title and author"),
        ("category" = Option<String>, Query, description = "Exact category (case insensitive)"),
        ("limit" = Option<i64>, Query, description = "Maximum rows (default 200)")
    ),
    responses(
        (status = 200, description = "Books with available copy counts", body = BooksListResponse)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    ApiQuery(query): ApiQuery<BookQuery>,
) -> AppResult<Json<BooksListResponse>> {
    let items = state.services.catalog.list_books(&query).await?;
    Ok(Json(BooksListResponse { ok: true, count: items.len(), items }))
}

/// Get a book with its copies
#[utoipa::path(
    get,
    path = "/libros/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetailsResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetailsResponse>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(BookDetailsResponse { ok: true, book }))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/libros",
    tag = "catalog",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Title or author missing", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    ApiJson(data): ApiJson<CreateBook>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let book = state.services.catalog.create_book(data).await?;
    Ok((StatusCode::CREATED, Json(BookResponse { ok: true, book })))
}

/// Update a book (partial)
#[utoipa::path(
    put,
    path = "/libros/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    ApiJson(data): ApiJson<UpdateBook>,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.catalog.update_book(id, data).await?;
    Ok(Json(BookResponse { ok: true, book }))
}

/// Delete a book and its copies
#[utoipa::path(
    delete,
    path = "/libros/{id}",
    tag = "catalog",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = OkResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book has loans or requests on record", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<OkResponse>> {
    state.services.catalog.delete_book(id).await?;
    Ok(OkResponse::json())
}
