//! Pickup requests (solicitudes) repository

use chrono::Utc;
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{RequestStatus, Role},
        request::{
            NewRequestItem, Request, RequestDetails, RequestItem, RequestQuery, RequestSummary,
            UpdateRequest,
        },
    },
};

use super::{
    books::BooksRepository, clamp_limit, copies::CopiesRepository, users::UsersRepository,
};

#[derive(Clone)]
pub struct RequestsRepository {
    pool: Pool<Postgres>,
}

impl RequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Create a request header and its items in one transaction
    pub async fn create(
        &self,
        user_id: i32,
        items: &[NewRequestItem],
        notes: Option<&str>,
    ) -> AppResult<RequestDetails> {
        let mut tx = self.pool.begin().await?;

        if !UsersRepository::exists_in(&mut tx, user_id).await? {
            return Err(AppError::NotFound(format!("User with id {} not found", user_id)));
        }

        for item in items {
            if let Some(book_id) = item.book_id {
                if !BooksRepository::exists_in(&mut tx, book_id).await? {
                    return Err(AppError::NotFound(format!("Book {} not found", book_id)));
                }
            }
            if let Some(copy_id) = item.copy_id {
                if !CopiesRepository::exists_in(&mut tx, copy_id).await? {
                    return Err(AppError::NotFound(format!("Copy {} not found", copy_id)));
                }
            }
        }

        let request = sqlx::query_as::<_, Request>(
            r#"
            INSERT INTO requests (user_id, status, notes)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(RequestStatus::Pending)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut stored = Vec::with_capacity(items.len());
        for item in items {
            let row = sqlx::query_as::<_, RequestItem>(
                r#"
                INSERT INTO request_items (request_id, book_id, copy_id, quantity)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(request.id)
            .bind(item.book_id)
            .bind(item.copy_id)
            .bind(item.effective_quantity())
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }

        tx.commit().await?;

        Ok(RequestDetails { request, items: stored })
    }

    /// List requests with requester name and item count, newest first
    pub async fn list(&self, query: &RequestQuery) -> AppResult<Vec<RequestSummary>> {
        let statuses = match query.status.as_deref() {
            Some(raw) => {
                let parsed = RequestStatus::parse_list(raw)?;
                if parsed.is_empty() {
                    None
                } else {
                    Some(parsed.iter().map(|s| s.as_str().to_string()).collect::<Vec<_>>())
                }
            }
            None => None,
        };

        let rows = sqlx::query_as::<_, RequestSummary>(
            r#"
            SELECT r.id, r.user_id,
                   CONCAT_WS(' ', u.first_name, u.last_name, u.second_last_name) AS requester_name,
                   r.status, r.librarian_id, r.notes, r.created_at, r.updated_at,
                   (SELECT COUNT(*) FROM request_items i WHERE i.request_id = r.id) AS item_count
            FROM requests r
            JOIN users u ON u.id = r.user_id
            WHERE ($1::text[] IS NULL OR r.status = ANY($1))
              AND ($2::int IS NULL OR r.librarian_id = $2)
              AND ($3::timestamptz IS NULL OR r.created_at >= $3)
              AND ($4::timestamptz IS NULL OR r.created_at <= $4)
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $5
            "#,
        )
        .bind(statuses)
        .bind(query.librarian_id)
        .bind(query.from)
        .bind(query.to)
        .bind(clamp_limit(query.limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Request header with its items
    pub async fn get_details(&self, id: i32) -> AppResult<RequestDetails> {
        let request = sqlx::query_as::<_, Request>("SELECT * FROM requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))?;

        let items = sqlx::query_as::<_, RequestItem>(
            "SELECT * FROM request_items WHERE request_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(RequestDetails { request, items })
    }

    /// Apply a status change, librarian assignment and/or notes edit.
    ///
    /// The row is locked before the transition is checked, so concurrent
    /// updates see each other's status.
    pub async fn update(&self, id: i32, data: &UpdateRequest) -> AppResult<Request> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Request>("SELECT * FROM requests WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request {} not found", id)))?;

        let status = match data.status {
            Some(next) => Some(current.status.transition_to(next)?),
            None => None,
        };

        if let Some(librarian_id) = data.librarian_id {
            Self::check_staff_in(&mut tx, librarian_id).await?;
        }

        let updated = sqlx::query_as::<_, Request>(
            r#"
            UPDATE requests
            SET status = COALESCE($2, status),
                librarian_id = COALESCE($3, librarian_id),
                notes = COALESCE($4, notes),
                updated_at = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(data.librarian_id)
        .bind(&data.notes)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// The assigned librarian must exist and hold a staff role
    async fn check_staff_in(conn: &mut PgConnection, user_id: i32) -> AppResult<()> {
        let role = UsersRepository::role_in(conn, user_id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Librarian {} does not exist", user_id)))?;

        if Role::normalize(&role)?.is_staff() {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "User {} is not a librarian or admin",
                user_id
            )))
        }
    }
}
