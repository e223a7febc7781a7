//! Sanction queries

use chrono::Utc;

use crate::{
    error::AppResult,
    models::sanction::{BlockStatus, Sanction, SanctionQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct SanctionsService {
    repository: Repository,
}

impl SanctionsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &SanctionQuery) -> AppResult<Vec<Sanction>> {
        self.repository.sanctions.list(query, Utc::now()).await
    }

    /// Whether the user is blocked right now, and until when
    pub async fn block_status(&self, user_id: i32) -> AppResult<BlockStatus> {
        let now = Utc::now();
        let latest_end = self.repository.sanctions.latest_active_end(user_id, now).await?;
        Ok(BlockStatus::from_latest_end(user_id, latest_end, now))
    }
}
