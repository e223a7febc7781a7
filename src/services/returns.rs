//! Return registration
//!
//! Closing a loan puts the copy into reconditioning and, if the return is
//! late, records a sanction. The copy goes back to `available` when the
//! release timer fires.

use chrono::Utc;

use crate::{
    config::LoansConfig,
    error::AppResult,
    models::loan::{RegisterReturn, ReturnOutcome},
    repository::Repository,
};

use super::release::ReleaseScheduler;

#[derive(Clone)]
pub struct ReturnsService {
    repository: Repository,
    release: ReleaseScheduler,
    policy: LoansConfig,
}

impl ReturnsService {
    pub fn new(repository: Repository, release: ReleaseScheduler, policy: LoansConfig) -> Self {
        Self { repository, release, policy }
    }

    pub async fn register_return(&self, data: &RegisterReturn) -> AppResult<ReturnOutcome> {
        let target = data.target()?;
        let now = Utc::now();

        let (loan, sanction) = self
            .repository
            .loans
            .register_return(target, now, self.policy.min_sanction_days)
            .await?;

        // Only after commit: the timer must never see the copy still borrowed
        let release_at = self.release.schedule_best_effort(loan.copy_id, now);

        match &sanction {
            Some(s) => tracing::info!(
                "Loan {} returned late; user {} sanctioned until {}",
                loan.id,
                loan.user_id,
                s.ends_at
            ),
            None => tracing::info!("Loan {} returned", loan.id),
        }

        Ok(ReturnOutcome {
            loan_id: loan.id,
            copy_id: loan.copy_id,
            returned_at: loan.returned_at.unwrap_or(now),
            overdue: loan.overdue,
            sanction,
            release_delay_minutes: self.release.delay_minutes(),
            release_at,
        })
    }
}
