//! Copies (ejemplares) repository

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        copy::{BookCopy, UpdateCopy},
        enums::CopyStatus,
    },
};

use super::{books::BooksRepository, referenced_conflict};

#[derive(Clone)]
pub struct CopiesRepository {
    pool: Pool<Postgres>,
}

impl CopiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Copies of a book
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookCopy>> {
        let copies = sqlx::query_as::<_, BookCopy>(
            "SELECT * FROM copies WHERE book_id = $1 ORDER BY id",
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(copies)
    }

    /// Create a copy of an existing book
    pub async fn create(&self, book_id: i32, status: CopyStatus, location: Option<&str>) -> AppResult<BookCopy> {
        let mut conn = self.pool.acquire().await?;
        if !BooksRepository::exists_in(&mut conn, book_id).await? {
            return Err(AppError::NotFound(format!("Book {} not found", book_id)));
        }

        let result = sqlx::query_as::<_, BookCopy>(
            "INSERT INTO copies (book_id, status, location) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(book_id)
        .bind(status)
        .bind(location)
        .fetch_one(&mut *conn)
        .await;

        match result {
            Ok(copy) => Ok(copy),
            // Book deleted between the check and the insert
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(AppError::NotFound(format!("Book {} not found", book_id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Partial update under a row lock.
    ///
    /// A status change is refused while the copy has an open loan, and no
    /// caller may set `borrowed` here. Returns the updated copy and the
    /// status it had before.
    pub async fn update(&self, id: i32, data: &UpdateCopy) -> AppResult<(BookCopy, CopyStatus)> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_in(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Copy {} not found", id)))?;

        if let Some(status) = data.status {
            if status != current.status {
                if status == CopyStatus::Borrowed {
                    return Err(AppError::Conflict(
                        "A copy becomes borrowed only through a loan".to_string(),
                    ));
                }
                if Self::has_open_loan_in(&mut tx, id).await? {
                    return Err(AppError::Conflict(format!(
                        "Copy {} has an open loan; register the return first",
                        id
                    )));
                }
            }
        }

        let updated = sqlx::query_as::<_, BookCopy>(
            r#"
            UPDATE copies
            SET status = COALESCE($2, status),
                location = COALESCE($3, location)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.status)
        .bind(&data.location)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((updated, current.status))
    }

    /// Delete a copy without an open loan
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        if Self::lock_in(&mut tx, id).await?.is_none() {
            return Err(AppError::NotFound(format!("Copy {} not found", id)));
        }
        if Self::has_open_loan_in(&mut tx, id).await? {
            return Err(AppError::Conflict(format!("Copy {} has an open loan", id)));
        }

        sqlx::query("DELETE FROM copies WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| referenced_conflict(e, format!("Copy {} has loans or requests on record", id)))?;

        tx.commit().await?;
        Ok(())
    }

    /// Set a copy back to `available` if it is still reconditioning.
    ///
    /// Returns whether the copy changed.
    pub async fn release_if_reconditioning(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE copies SET status = $2 WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(CopyStatus::Available)
        .bind(CopyStatus::Reconditioning)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Lock a copy row for the rest of the transaction
    pub(crate) async fn lock_in(conn: &mut PgConnection, id: i32) -> AppResult<Option<BookCopy>> {
        let copy = sqlx::query_as::<_, BookCopy>("SELECT * FROM copies WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(copy)
    }

    pub(crate) async fn set_status_in(conn: &mut PgConnection, id: i32, status: CopyStatus) -> AppResult<()> {
        sqlx::query("UPDATE copies SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub(crate) async fn has_open_loan_in(conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let open: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM loans WHERE copy_id = $1 AND returned_at IS NULL)",
        )
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(open)
    }

    pub(crate) async fn exists_in(conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM copies WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }
}
