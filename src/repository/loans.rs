//! Loans repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres, Transaction};

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
    models::{
        enums::{CopyStatus, LoanType},
        loan::{Loan, LoanDetails, LoanQuery, LoanReceipt, OverdueLoan, ReceiptRow, ReturnTarget},
        sanction::{NewSanction, Sanction},
    },
};

use super::{
    clamp_limit, copies::CopiesRepository, like_pattern, sanctions::SanctionsRepository,
    users::UsersRepository,
};

/// Advisory lock key held by a running overdue sweep
const OVERDUE_SWEEP_LOCK: i64 = 0x5349_5342_4942;

/// An overdue sweep in progress.
///
/// Holds the transaction that owns the sweep lock; dropping it without
/// calling [`OverdueSweep::finish`] releases the lock and flags nothing.
pub struct OverdueSweep {
    tx: Transaction<'static, Postgres>,
    pub loans: Vec<OverdueLoan>,
}

impl OverdueSweep {
    /// Flag the given loans overdue and release the sweep lock
    pub async fn finish(mut self, loan_ids: &[i32]) -> AppResult<u64> {
        let flagged = if loan_ids.is_empty() {
            0
        } else {
            sqlx::query("UPDATE loans SET overdue = TRUE WHERE id = ANY($1)")
                .bind(loan_ids)
                .execute(&mut *self.tx)
                .await?
                .rows_affected()
        };
        self.tx.commit().await?;
        Ok(flagged)
    }
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a loan for an available copy.
    ///
    /// User check, sanction check, copy lock, insert and copy status change
    /// all happen in one transaction.
    pub async fn create(
        &self,
        user_id: i32,
        copy_id: i32,
        loan_type: LoanType,
        now: DateTime<Utc>,
        policy: &LoansConfig,
    ) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        if !UsersRepository::exists_in(&mut tx, user_id).await? {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }

        SanctionsRepository::probe_in(&mut tx, user_id, now)
            .await?
            .enforce(user_id)?;

        let copy = CopiesRepository::lock_in(&mut tx, copy_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Copy {} not found", copy_id)))?;

        if copy.status != CopyStatus::Available {
            return Err(AppError::CopyUnavailable { copy_id, status: copy.status });
        }

        let due_at = loan_type.due_at(now, policy);

        let result = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_id, copy_id, book_id, loan_type, reserved_at, due_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(copy_id)
        .bind(copy.book_id)
        .bind(loan_type)
        .bind(now)
        .bind(due_at)
        .fetch_one(&mut *tx)
        .await;

        let loan = match result {
            Ok(loan) => loan,
            Err(e) => {
                let err = AppError::from(e);
                return Err(if err.is_unique_violation() {
                    AppError::CopyUnavailable { copy_id, status: CopyStatus::Borrowed }
                } else {
                    err
                });
            }
        };

        CopiesRepository::set_status_in(&mut tx, copy_id, CopyStatus::Borrowed).await?;

        tx.commit().await?;
        Ok(loan)
    }

    /// Close a loan, move its copy to reconditioning and record any sanction.
    ///
    /// The sanction insert is best effort: the return commits even if it fails.
    pub async fn register_return(
        &self,
        target: ReturnTarget,
        now: DateTime<Utc>,
        min_sanction_days: i64,
    ) -> AppResult<(Loan, Option<Sanction>)> {
        let mut tx = self.pool.begin().await?;

        let loan = Self::lock_for_return(&mut tx, target)
            .await?
            .ok_or_else(|| match target {
                ReturnTarget::Loan(id) => AppError::NotFound(format!("Loan {} not found", id)),
                ReturnTarget::Copy(id) => {
                    AppError::NotFound(format!("No loan found for copy {}", id))
                }
            })?;

        if loan.returned_at.is_some() {
            return Err(AppError::AlreadyReturned(loan.id));
        }

        let late = now > loan.due_at;

        let closed = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET returned_at = $2, overdue = overdue OR $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loan.id)
        .bind(now)
        .bind(late)
        .fetch_one(&mut *tx)
        .await?;

        CopiesRepository::set_status_in(&mut tx, closed.copy_id, CopyStatus::Reconditioning).await?;

        let sanction = match NewSanction::for_late_return(
            closed.user_id,
            closed.id,
            closed.due_at,
            now,
            min_sanction_days,
        ) {
            Some(new) => SanctionsRepository::insert_best_effort(&mut tx, &new).await?,
            None => None,
        };

        tx.commit().await?;
        Ok((closed, sanction))
    }

    async fn lock_for_return(conn: &mut PgConnection, target: ReturnTarget) -> AppResult<Option<Loan>> {
        let loan = match target {
            ReturnTarget::Loan(id) => {
                sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
                    .bind(id)
                    .fetch_optional(&mut *conn)
                    .await?
            }
            ReturnTarget::Copy(copy_id) => {
                sqlx::query_as::<_, Loan>(
                    r#"
                    SELECT * FROM loans
                    WHERE copy_id = $1
                    ORDER BY reserved_at DESC, id DESC
                    LIMIT 1
                    FOR UPDATE
                    "#,
                )
                .bind(copy_id)
                .fetch_optional(&mut *conn)
                .await?
            }
        };
        Ok(loan)
    }

    /// List loans joined with borrower and book, newest first
    pub async fn list(&self, query: &LoanQuery, now: DateTime<Utc>) -> AppResult<Vec<LoanDetails>> {
        let loan_types = match query.loan_type.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| LoanType::parse(s).map(|t| t.as_str().to_string()))
                    .collect::<AppResult<Vec<_>>>()?,
            ),
            _ => None,
        };

        let rows = sqlx::query_as::<_, LoanDetails>(
            r#"
            SELECT l.id, l.loan_type, l.reserved_at, l.due_at, l.returned_at, l.overdue,
                   l.copy_id, l.user_id, u.first_name, u.last_name, u.second_last_name, u.email,
                   l.book_id, b.title, b.author, b.category,
                   ((l.returned_at IS NULL AND l.due_at < $3) OR l.overdue) AS is_overdue
            FROM loans l
            JOIN users u ON u.id = l.user_id
            JOIN books b ON b.id = l.book_id
            WHERE ($1::text[] IS NULL OR l.loan_type = ANY($1))
              AND ($2::text IS NULL
                   OR b.title ILIKE $2 OR b.author ILIKE $2
                   OR u.first_name ILIKE $2 OR u.last_name ILIKE $2
                   OR u.second_last_name ILIKE $2 OR u.email ILIKE $2 OR CAST(l.id AS TEXT) ILIKE $2)
              AND (NOT $4 OR (l.returned_at IS NULL AND l.due_at < $3) OR l.overdue)
              AND (NOT $5 OR l.returned_at IS NULL)
            ORDER BY l.reserved_at DESC, l.id DESC
            LIMIT $6
            "#,
        )
        .bind(loan_types)
        .bind(like_pattern(query.q.as_deref()))
        .bind(now)
        .bind(query.overdue_only.unwrap_or(false))
        .bind(query.open_only.unwrap_or(false))
        .bind(clamp_limit(query.limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Receipt of a loan
    pub async fn receipt(&self, id: i32) -> AppResult<LoanReceipt> {
        let row = sqlx::query_as::<_, ReceiptRow>(
            r#"
            SELECT l.id, l.loan_type, l.reserved_at, l.due_at, l.returned_at, l.copy_id,
                   l.user_id, u.first_name, u.last_name, u.second_last_name, u.email,
                   l.book_id, b.title, b.author
            FROM loans l
            JOIN users u ON u.id = l.user_id
            JOIN books b ON b.id = l.book_id
            WHERE l.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", id)))?;

        Ok(LoanReceipt::from(row))
    }

    /// Start an overdue sweep: take the sweep lock and select open loans
    /// past due that were not flagged yet.
    ///
    /// `None` when another sweep holds the lock.
    pub async fn begin_overdue_sweep(&self, now: DateTime<Utc>) -> AppResult<Option<OverdueSweep>> {
        let mut tx = self.pool.begin().await?;

        let locked: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
            .bind(OVERDUE_SWEEP_LOCK)
            .fetch_one(&mut *tx)
            .await?;
        if !locked {
            return Ok(None);
        }

        let loans = sqlx::query_as::<_, OverdueLoan>(
            r#"
            SELECT l.id, l.due_at, u.email, u.first_name, b.title
            FROM loans l
            JOIN users u ON u.id = l.user_id
            JOIN books b ON b.id = l.book_id
            WHERE l.returned_at IS NULL
              AND l.due_at < $1
              AND NOT l.overdue
            ORDER BY l.due_at, l.id
            "#,
        )
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        Ok(Some(OverdueSweep { tx, loans }))
    }
}
