//! Sanctions repository

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::sanction::{NewSanction, Sanction, SanctionQuery},
};

/// Result of looking up a borrower's active sanctions.
///
/// `Unknown` means the lookup itself failed. Loans go ahead in that case.
#[derive(Debug)]
pub enum SanctionCheck {
    Clear,
    Blocked { until: DateTime<Utc> },
    Unknown(AppError),
}

impl SanctionCheck {
    /// Turn the check into a loan decision
    pub fn enforce(self, user_id: i32) -> AppResult<()> {
        match self {
            SanctionCheck::Clear => Ok(()),
            SanctionCheck::Blocked { until } => Err(AppError::UserBlocked { user_id, until }),
            SanctionCheck::Unknown(err) => {
                tracing::warn!(
                    "Sanction lookup failed for user {}, allowing loan: {}",
                    user_id,
                    err
                );
                Ok(())
            }
        }
    }
}

#[derive(Clone)]
pub struct SanctionsRepository {
    pool: Pool<Postgres>,
}

impl SanctionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List sanctions, latest ending first
    pub async fn list(&self, query: &SanctionQuery, now: DateTime<Utc>) -> AppResult<Vec<Sanction>> {
        let rows = sqlx::query_as::<_, Sanction>(
            r#"
            SELECT * FROM sanctions
            WHERE ($1::int IS NULL OR user_id = $1)
              AND (NOT $2 OR ends_at > $3)
            ORDER BY ends_at DESC, id DESC
            "#,
        )
        .bind(query.user_id)
        .bind(query.active_only.unwrap_or(false))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Latest end among the user's sanctions still running at `now`
    pub async fn latest_active_end(&self, user_id: i32, now: DateTime<Utc>) -> AppResult<Option<DateTime<Utc>>> {
        let mut conn = self.pool.acquire().await?;
        Self::latest_active_end_in(&mut conn, user_id, now).await
    }

    async fn latest_active_end_in(
        conn: &mut PgConnection,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Option<DateTime<Utc>>> {
        let end: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT MAX(ends_at) FROM sanctions WHERE user_id = $1 AND ends_at > $2",
        )
        .bind(user_id)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
        Ok(end)
    }

    /// Check active sanctions inside an open transaction.
    ///
    /// The lookup runs under a savepoint so a failure leaves the outer
    /// transaction usable.
    pub(crate) async fn probe_in(
        conn: &mut PgConnection,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<SanctionCheck> {
        sqlx::query("SAVEPOINT sanction_probe").execute(&mut *conn).await?;

        match Self::latest_active_end_in(conn, user_id, now).await {
            Ok(latest) => {
                sqlx::query("RELEASE SAVEPOINT sanction_probe").execute(&mut *conn).await?;
                Ok(match latest {
                    Some(until) => SanctionCheck::Blocked { until },
                    None => SanctionCheck::Clear,
                })
            }
            Err(err) => {
                sqlx::query("ROLLBACK TO SAVEPOINT sanction_probe").execute(&mut *conn).await?;
                Ok(SanctionCheck::Unknown(err))
            }
        }
    }

    /// Insert a sanction without failing the enclosing transaction.
    ///
    /// Returns `None` (and logs) when the insert fails.
    pub(crate) async fn insert_best_effort(
        conn: &mut PgConnection,
        sanction: &NewSanction,
    ) -> AppResult<Option<Sanction>> {
        sqlx::query("SAVEPOINT sanction_insert").execute(&mut *conn).await?;

        let result = sqlx::query_as::<_, Sanction>(
            r#"
            INSERT INTO sanctions (user_id, reason, starts_at, ends_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(sanction.user_id)
        .bind(&sanction.reason)
        .bind(sanction.starts_at)
        .bind(sanction.ends_at)
        .fetch_one(&mut *conn)
        .await;

        match result {
            Ok(row) => {
                sqlx::query("RELEASE SAVEPOINT sanction_insert").execute(&mut *conn).await?;
                Ok(Some(row))
            }
            Err(e) => {
                sqlx::query("ROLLBACK TO SAVEPOINT sanction_insert").execute(&mut *conn).await?;
                tracing::warn!(
                    "Could not record sanction for user {}: {}",
                    sanction.user_id,
                    e
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_enforce_blocked() {
        let until = Utc::now() + Duration::days(2);
        let err = SanctionCheck::Blocked { until }.enforce(3).unwrap_err();
        assert!(matches!(err, AppError::UserBlocked { user_id: 3, .. }));
    }

    #[test]
    fn test_enforce_clear_and_unknown_allow() {
        tokio_test::assert_ok!(SanctionCheck::Clear.enforce(3));
        let failed = SanctionCheck::Unknown(AppError::Internal("relation missing".to_string()));
        tokio_test::assert_ok!(failed.enforce(3));
    }

    async fn test_pool() -> Pool<Postgres> {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://postgres@127.0.0.1:5432/sisbib".to_string());
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    #[ignore]
    async fn test_failed_lookup_keeps_transaction_usable() {
        let pool = test_pool().await;
        let mut tx = pool.begin().await.unwrap();

        // Hide the sanctions table so the lookup errors out
        sqlx::query("SET LOCAL search_path TO sisbib_missing_schema")
            .execute(&mut *tx)
            .await
            .unwrap();

        let check = SanctionsRepository::probe_in(&mut tx, 1, Utc::now()).await.unwrap();
        assert!(matches!(check, SanctionCheck::Unknown(_)));
        tokio_test::assert_ok!(check.enforce(1));

        let alive: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&mut *tx).await.unwrap();
        assert_eq!(alive, 1);
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_failed_insert_keeps_transaction_usable() {
        let pool = test_pool().await;
        let mut tx = pool.begin().await.unwrap();

        let now = Utc::now();
        // No such user: foreign key violation
        let orphan = NewSanction {
            user_id: -1,
            reason: "Late return of loan 0 (1 day(s))".to_string(),
            starts_at: now,
            ends_at: now + Duration::days(1),
        };

        let inserted = SanctionsRepository::insert_best_effort(&mut tx, &orphan).await.unwrap();
        assert!(inserted.is_none());

        let check = SanctionsRepository::probe_in(&mut tx, -1, now).await.unwrap();
        assert!(matches!(check, SanctionCheck::Clear));
        tx.rollback().await.unwrap();
    }
}
