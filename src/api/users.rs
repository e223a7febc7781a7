//! Login and user directory endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        enums::Role,
        user::{CreateUser, LoginRequest, User, UserQuery, UserSummary},
    },
};

use super::{ApiJson, ApiQuery};

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub ok: bool,
    pub user: UserSummary,
    pub role: Role,
}

#[derive(Serialize, ToSchema)]
pub struct UsersListResponse {
    pub ok: bool,
    pub count: usize,
    pub items: Vec<User>,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub ok: bool,
    pub user: User,
}

/// Check credentials
#[utoipa::path(
    post,
    path = "/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 400, description = "Missing email", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid email or password", body = crate::error::ErrorResponse),
        (status = 403, description = "Account does not have the requested role", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (user, role) = state.services.users.login(&request).await?;
    Ok(Json(LoginResponse { ok: true, user, role }))
}

/// Search users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(
        ("q" = Option<String>, Query, description = "Search in names, email and RUT"),
        ("limit" = Option<i64>, Query, description = "Maximum rows (default 200)")
    ),
    responses(
        (status = 200, description = "Matching users, newest first", body = UsersListResponse)
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> AppResult<Json<UsersListResponse>> {
    let items = state.services.users.search(&query).await?;
    Ok(Json(UsersListResponse { ok: true, count: items.len(), items }))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Email or RUT already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    ApiJson(data): ApiJson<CreateUser>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state.services.users.create(data).await?;
    Ok((StatusCode::CREATED, Json(UserResponse { ok: true, user })))
}
