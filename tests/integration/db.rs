//! Direct database access for setting up fixtures the API cannot create

use sqlx::{postgres::PgPoolOptions, PgPool};

pub fn database_url() -> String {
    std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://postgres@127.0.0.1:5432/sisbib".to_string())
}

pub async fn pool() -> PgPool {
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&database_url())
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Move a loan's due instant into the past
pub async fn backdate_loan(pool: &PgPool, loan_id: i64, hours_late: i64) {
    sqlx::query(
        r#"
        UPDATE loans
        SET reserved_at = NOW() - make_interval(hours => $2 + 48),
            due_at = NOW() - make_interval(hours => $2)
        WHERE id = $1
        "#,
    )
    .bind(loan_id as i32)
    .bind(hours_late as i32)
    .execute(pool)
    .await
    .expect("Failed to backdate loan");
}

pub async fn copy_status(pool: &PgPool, copy_id: i64) -> String {
    sqlx::query_scalar("SELECT status FROM copies WHERE id = $1")
        .bind(copy_id as i32)
        .fetch_one(pool)
        .await
        .expect("Copy not found")
}

pub async fn sanction_count(pool: &PgPool, user_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM sanctions WHERE user_id = $1")
        .bind(user_id as i32)
        .fetch_one(pool)
        .await
        .expect("Failed to count sanctions")
}
