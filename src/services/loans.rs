//! Loan management service

use chrono::Utc;

use crate::{
    config::LoansConfig,
    error::AppResult,
    models::{
        enums::LoanType,
        loan::{CreateLoan, Loan, LoanDetails, LoanQuery, LoanReceipt},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    policy: LoansConfig,
}

impl LoansService {
    pub fn new(repository: Repository, policy: LoansConfig) -> Self {
        Self { repository, policy }
    }

    /// Lend a copy to a user
    pub async fn create_loan(&self, data: &CreateLoan) -> AppResult<Loan> {
        let loan_type = LoanType::parse(&data.loan_type)?;

        let loan = self
            .repository
            .loans
            .create(data.user_id, data.copy_id, loan_type, Utc::now(), &self.policy)
            .await?;

        tracing::info!(
            "Loan {} created: copy {} to user {} ({}, due {})",
            loan.id,
            loan.copy_id,
            loan.user_id,
            loan.loan_type,
            loan.due_at
        );
        Ok(loan)
    }

    pub async fn list(&self, query: &LoanQuery) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list(query, Utc::now()).await
    }

    pub async fn receipt(&self, loan_id: i32) -> AppResult<LoanReceipt> {
        self.repository.loans.receipt(loan_id).await
    }
}
