//! Repository tests that need control over the database state

use chrono::{Duration, Utc};
use sqlx::PgPool;

use sisbib_server::{models::loan::ReturnTarget, repository::Repository};

use crate::db;

/// User, book, borrowed copy and an open loan due `hours_late` hours ago
async fn seed_late_loan(pool: &PgPool, hours_late: i64) -> (i32, i32, i32) {
    let n = (Utc::now().timestamp_nanos_opt().unwrap_or_default() % 90_000_000 + 1_000_000) as i32;

    let user_id: i32 = sqlx::query_scalar(
        "INSERT INTO users (first_name, last_name, rut_number, email) VALUES ('Luis', 'Soto', $1, $2) RETURNING id",
    )
    .bind(n)
    .bind(format!("repo{}@example.cl", n))
    .fetch_one(pool)
    .await
    .unwrap();

    let book_id: i32 =
        sqlx::query_scalar("INSERT INTO books (title, author) VALUES ('Rayuela', 'Julio Cortázar') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();

    let copy_id: i32 =
        sqlx::query_scalar("INSERT INTO copies (book_id, status) VALUES ($1, 'borrowed') RETURNING id")
            .bind(book_id)
            .fetch_one(pool)
            .await
            .unwrap();

    let now = Utc::now();
    let loan_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO loans (user_id, copy_id, book_id, loan_type, reserved_at, due_at)
        VALUES ($1, $2, $3, 'home', $4, $5)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(copy_id)
    .bind(book_id)
    .bind(now - Duration::hours(hours_late + 48))
    .bind(now - Duration::hours(hours_late))
    .fetch_one(pool)
    .await
    .unwrap();

    (user_id, copy_id, loan_id)
}

#[tokio::test]
#[ignore]
async fn test_late_return_records_sanction() {
    let pool = db::pool().await;
    let repository = Repository::new(pool.clone());
    let (user_id, copy_id, loan_id) = seed_late_loan(&pool, 25).await;

    let returned_at = Utc::now();
    let (loan, sanction) = repository
        .loans
        .register_return(ReturnTarget::Loan(loan_id), returned_at, 1)
        .await
        .unwrap();

    assert!(loan.overdue);
    let sanction = sanction.expect("late return should be sanctioned");
    assert_eq!(sanction.user_id, user_id);
    assert_eq!(sanction.ends_at - sanction.starts_at, Duration::days(2));
    assert_eq!(db::copy_status(&pool, copy_id as i64).await, "reconditioning");
}

#[tokio::test]
#[ignore]
async fn test_return_commits_when_sanction_insert_fails() {
    let pool = db::pool().await;
    let repository = Repository::new(pool.clone());
    let (user_id, copy_id, loan_id) = seed_late_loan(&pool, 30).await;

    // Reject sanctions for this user only
    let constraint = format!("sanctions_reject_user_{}", user_id);
    sqlx::query(&format!(
        "ALTER TABLE sanctions ADD CONSTRAINT {} CHECK (user_id <> {}) NOT VALID",
        constraint, user_id
    ))
    .execute(&pool)
    .await
    .unwrap();

    let result = repository
        .loans
        .register_return(ReturnTarget::Copy(copy_id), Utc::now(), 1)
        .await;

    sqlx::query(&format!("ALTER TABLE sanctions DROP CONSTRAINT {}", constraint))
        .execute(&pool)
        .await
        .unwrap();

    let (loan, sanction) = result.unwrap();
    assert_eq!(loan.id, loan_id);
    assert!(loan.returned_at.is_some());
    assert!(loan.overdue);
    assert!(sanction.is_none());

    let stored: Option<chrono::DateTime<Utc>> =
        sqlx::query_scalar("SELECT returned_at FROM loans WHERE id = $1")
            .bind(loan_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(stored.is_some());
    assert_eq!(db::copy_status(&pool, copy_id as i64).await, "reconditioning");
    assert_eq!(db::sanction_count(&pool, user_id as i64).await, 0);
}
