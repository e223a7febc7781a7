//! Pickup request workflow

use crate::{
    error::{AppError, AppResult},
    models::request::{
        CreateRequest, Request, RequestDetails, RequestQuery, RequestSummary, UpdateRequest,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct RequestsService {
    repository: Repository,
}

impl RequestsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn create(&self, data: &CreateRequest) -> AppResult<RequestDetails> {
        let user_id = data.validate_shape()?;
        let notes = data.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());

        let details = self
            .repository
            .requests
            .create(user_id, &data.items, notes)
            .await?;

        tracing::info!(
            "Request {} created for user {} with {} item(s)",
            details.request.id,
            user_id,
            details.items.len()
        );
        Ok(details)
    }

    pub async fn list(&self, query: &RequestQuery) -> AppResult<Vec<RequestSummary>> {
        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(AppError::Validation("'from' must not be after 'to'".to_string()));
            }
        }
        self.repository.requests.list(query).await
    }

    pub async fn get(&self, id: i32) -> AppResult<RequestDetails> {
        self.repository.requests.get_details(id).await
    }

    /// Status change, librarian assignment and/or notes edit
    pub async fn update(&self, id: i32, data: &UpdateRequest) -> AppResult<Request> {
        if data.is_empty() {
            return Err(AppError::Validation(
                "Nothing to update: give status, librarian_id or notes".to_string(),
            ));
        }

        let request = self.repository.requests.update(id, data).await?;
        if let Some(status) = data.status {
            tracing::info!("Request {} moved to {}", id, status);
        }
        Ok(request)
    }
}
