//! Overdue notification and mail test endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppResult, services::notifications::SweepReport};

use super::ApiJson;

#[derive(Serialize, ToSchema)]
pub struct SweepResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub report: SweepReport,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TestEmailRequest {
    /// Recipient; the configured default when omitted
    #[serde(alias = "email")]
    pub to: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TestEmailResponse {
    pub ok: bool,
    pub to: String,
}

/// Mail borrowers of overdue loans now
#[utoipa::path(
    post,
    path = "/notify-overdue",
    tag = "notifications",
    responses(
        (status = 200, description = "Sweep finished", body = SweepResponse),
        (status = 409, description = "Another sweep is running", body = crate::error::ErrorResponse)
    )
)]
pub async fn notify_overdue(State(state): State<crate::AppState>) -> AppResult<Json<SweepResponse>> {
    let report = state.services.notifications.notify_overdue().await?;
    Ok(Json(SweepResponse { ok: true, report }))
}

/// Send a test email
#[utoipa::path(
    post,
    path = "/test-email",
    tag = "notifications",
    request_body = TestEmailRequest,
    responses(
        (status = 200, description = "Mail sent", body = TestEmailResponse),
        (status = 400, description = "No recipient", body = crate::error::ErrorResponse),
        (status = 500, description = "SMTP failure", body = crate::error::ErrorResponse)
    )
)]
pub async fn test_email(
    State(state): State<crate::AppState>,
    body: Option<ApiJson<TestEmailRequest>>,
) -> AppResult<Json<TestEmailResponse>> {
    let request = body.map(|ApiJson(r)| r).unwrap_or_default();
    let to = state.services.notifications.send_test(request.to.as_deref()).await?;
    Ok(Json(TestEmailResponse { ok: true, to }))
}
