//! API handlers for SisBib REST endpoints

pub mod books;
pub mod copies;
pub mod health;
pub mod loans;
pub mod notifications;
pub mod openapi;
pub mod requests;
pub mod returns;
pub mod sanctions;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

use crate::{error::AppError, AppState};

/// JSON body extractor whose rejections use the API error envelope
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// Query string extractor whose rejections use the API error envelope
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(ApiQuery(value))
    }
}

/// Bare success body
#[derive(Serialize, ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn json() -> Json<Self> {
        Json(OkResponse { ok: true })
    }
}

/// Routes served under `/api`
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        // Users
        .route("/login", post(users::login))
        .route("/users", get(users::list_users).post(users::create_user))
        // Catalog
        .route("/libros", get(books::list_books).post(books::create_book))
        .route(
            "/libros/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .route("/libros/:id/ejemplares", get(copies::list_copies))
        .route("/ejemplares", post(copies::create_copy))
        .route(
            "/ejemplares/:id",
            axum::routing::put(copies::update_copy).delete(copies::delete_copy),
        )
        // Requests
        .route("/solicitudes", get(requests::list_requests).post(requests::create_request))
        .route(
            "/solicitudes/:id",
            get(requests::get_request).patch(requests::update_request),
        )
        // Loans and returns
        .route("/prestamos", get(loans::list_loans).post(loans::create_loan))
        .route("/prestamos/:id/comprobante", get(loans::get_receipt))
        .route("/devoluciones", post(returns::register_return))
        // Sanctions
        .route("/sanciones", get(sanctions::list_sanctions))
        .route("/sanciones/estado", get(sanctions::block_status))
        // Notifications
        .route("/notify-overdue", post(notifications::notify_overdue))
        .route("/test-email", post(notifications::test_email))
}
