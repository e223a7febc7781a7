//! Users repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::Role,
        user::{CreateUser, User, UserQuery, UserRow},
    },
};

use super::{clamp_limit, like_pattern};

const USER_COLUMNS: &str = "id, first_name, last_name, second_last_name, rut_number, \
     rut_check_digit, email, password_hash, role, created_at";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by email (case insensitive)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Search users, newest first
    pub async fn search(&self, query: &UserQuery) -> AppResult<Vec<User>> {
        let pattern = like_pattern(query.q.as_deref());
        let limit = clamp_limit(query.limit);

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE $1::text IS NULL
               OR first_name ILIKE $1
               OR last_name ILIKE $1
               OR second_last_name ILIKE $1
               OR email ILIKE $1
               OR CAST(rut_number AS TEXT) ILIKE $1
            ORDER BY created_at DESC NULLS LAST, id DESC
            LIMIT $2
            "#,
            USER_COLUMNS
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Create a user with an already hashed password
    pub async fn create(&self, data: &CreateUser, role: Role, password_hash: &str) -> AppResult<User> {
        let result = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, second_last_name, rut_number,
                               rut_check_digit, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(data.first_name.trim())
        .bind(data.last_name.trim())
        .bind(data.second_last_name.as_deref().map(str::trim))
        .bind(data.rut_number)
        .bind(data.rut_check_digit.trim().to_uppercase())
        .bind(data.email.trim())
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => User::try_from(row),
            Err(e) => {
                let err = AppError::from(e);
                if err.is_unique_violation() {
                    Err(AppError::Conflict("Email or RUT already registered".to_string()))
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Role of a user, read on an existing connection (`None` if the user does not exist)
    pub(crate) async fn role_in(conn: &mut PgConnection, id: i32) -> AppResult<Option<String>> {
        let role = sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(role)
    }

    /// Whether a user exists, checked on an existing connection
    pub(crate) async fn exists_in(conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }
}
