//! API integration tests

use reqwest::{Client, StatusCode};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use crate::db;

const BASE_URL: &str = "http://localhost:5000/api";

/// Unique suffix so repeated runs do not collide on email/RUT
fn unique() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default() % 90_000_000 + 1_000_000
}

async fn create_user(client: &Client, role: &str) -> i64 {
    let n = unique();
    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "nombre": "Prueba",
            "apellido1": "Integración",
            "apellido2": "Test",
            "rut_numero": n,
            "rut_dv": "k",
            "email": format!("test{}@example.cl", n),
            "password": "secreto-123",
            "role": role
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["user"]["id"].as_i64().expect("No user id")
}

async fn create_book_with_copy(client: &Client) -> (i64, i64) {
    let response = client
        .post(format!("{}/libros", BASE_URL))
        .json(&json!({ "titulo": "Ficciones", "autor": "Jorge Luis Borges", "categoria": "Cuento" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    let book_id = body["book"]["id"].as_i64().expect("No book id");

    let response = client
        .post(format!("{}/ejemplares", BASE_URL))
        .json(&json!({ "id_libro": book_id, "ubicacion": "Estante A" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["copy"]["status"], "available");

    (book_id, body["copy"]["id"].as_i64().expect("No copy id"))
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["ok"], true);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_and_role_hint() {
    let client = Client::new();
    let n = unique();
    let email = format!("login{}@example.cl", n);

    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "first_name": "Ana", "last_name": "Rojas", "rut_number": n, "rut_check_digit": "5",
            "email": email, "password": "secreto-123", "role": "Bibliotecaria"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "email": email, "password": "secreto-123" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["role"], "librarian");
    assert!(body["user"].get("password_hash").is_none());

    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "email": email, "password": "secreto-123", "role": "admin" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .post(format!("{}/login", BASE_URL))
        .json(&json!({ "email": email, "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["ok"], false);
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle() {
    let client = Client::new();
    let user_id = create_user(&client, "cliente").await;
    let (_, copy_id) = create_book_with_copy(&client).await;

    // Unknown loan type
    let response = client
        .post(format!("{}/prestamos", BASE_URL))
        .json(&json!({ "user_id": user_id, "id_ejemplar": copy_id, "tipo": "weekend" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{}/prestamos", BASE_URL))
        .json(&json!({ "user_id": user_id, "id_ejemplar": copy_id, "tipo": "Domicilio" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["loan"]["id"].as_i64().expect("No loan id");
    assert_eq!(body["loan"]["loan_type"], "home");

    // Second loan on the same copy
    let response = client
        .post(format!("{}/prestamos", BASE_URL))
        .json(&json!({ "user_id": user_id, "copy_id": copy_id, "loan_type": "room" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .get(format!("{}/prestamos/{}/comprobante", BASE_URL, loan_id))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["receipt"]["due_at"].as_str().unwrap().ends_with('Z'));

    // Return by copy id, on time
    let response = client
        .post(format!("{}/devoluciones", BASE_URL))
        .json(&json!({ "id_ejemplar": copy_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["loan_id"], loan_id);
    assert!(body["sanction"].is_null());

    // Copy is reconditioning now
    let response = client
        .post(format!("{}/prestamos", BASE_URL))
        .json(&json!({ "user_id": user_id, "copy_id": copy_id, "loan_type": "sala" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .post(format!("{}/devoluciones", BASE_URL))
        .json(&json!({ "loan_id": loan_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .get(format!("{}/sanciones/estado?user_id={}", BASE_URL, user_id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["blocked"], false);
}

#[tokio::test]
#[ignore]
async fn test_request_workflow() {
    let client = Client::new();
    let user_id = create_user(&client, "client").await;
    let librarian_id = create_user(&client, "librarian").await;
    let (book_id, copy_id) = create_book_with_copy(&client).await;

    let response = client
        .post(format!("{}/solicitudes", BASE_URL))
        .json(&json!({
            "user_id": user_id,
            "items": [{ "book_id": book_id }, { "copy_id": copy_id, "quantity": 2 }]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    let request_id = body["request"]["id"].as_i64().expect("No request id");
    assert_eq!(body["request"]["status"], "pending");
    assert_eq!(body["request"]["items"].as_array().unwrap().len(), 2);

    // Client cannot be assigned as librarian
    let response = client
        .patch(format!("{}/solicitudes/{}", BASE_URL, request_id))
        .json(&json!({ "librarian_id": user_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    for status in ["ready", "served"] {
        let response = client
            .patch(format!("{}/solicitudes/{}", BASE_URL, request_id))
            .json(&json!({ "estado": status, "librarian_id": librarian_id }))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
    }

    let response = client
        .patch(format!("{}/solicitudes/{}", BASE_URL, request_id))
        .json(&json!({ "status": "ready" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"].as_str().unwrap().contains("served -> ready"));

    let response = client
        .get(format!("{}/solicitudes?status=served,canceled&librarian_id={}", BASE_URL, librarian_id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    let row = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["id"] == request_id)
        .expect("Request missing from list");
    assert_eq!(row["item_count"], 2);
}

#[tokio::test]
#[ignore]
async fn test_catalog_guards_borrowed_copy() {
    let client = Client::new();
    let user_id = create_user(&client, "client").await;
    let (_, copy_id) = create_book_with_copy(&client).await;

    let response = client
        .put(format!("{}/ejemplares/{}", BASE_URL, copy_id))
        .json(&json!({ "estado": "borrowed" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .post(format!("{}/prestamos", BASE_URL))
        .json(&json!({ "user_id": user_id, "copy_id": copy_id, "loan_type": "room" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .delete(format!("{}/ejemplares/{}", BASE_URL, copy_id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_second_sweep_sends_nothing() {
    let client = Client::new();

    let first = client
        .post(format!("{}/notify-overdue", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(first.status().is_success());

    let second = client
        .post(format!("{}/notify-overdue", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert!(second.status().is_success());
    let body: Value = second.json().await.expect("Failed to parse response");
    assert_eq!(body["selected"], 0);
    assert_eq!(body["sent"], 0);
}

async fn create_loan(client: &Client, user_id: i64, copy_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/prestamos", BASE_URL))
        .json(&json!({ "user_id": user_id, "copy_id": copy_id, "loan_type": "home" }))
        .send()
        .await
        .expect("Failed to send request")
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value
        .as_str()
        .expect("Not a timestamp")
        .parse()
        .expect("Invalid timestamp")
}

#[tokio::test]
#[ignore]
async fn test_concurrent_loans_on_one_copy() {
    let client = Client::new();
    let first_user = create_user(&client, "client").await;
    let second_user = create_user(&client, "client").await;
    let (_, copy_id) = create_book_with_copy(&client).await;

    let (a, b) = tokio::join!(
        create_loan(&client, first_user, copy_id),
        create_loan(&client, second_user, copy_id)
    );

    let mut statuses = vec![a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

    let pool = db::pool().await;
    assert_eq!(db::copy_status(&pool, copy_id).await, "borrowed");
}

#[tokio::test]
#[ignore]
async fn test_late_return_blocks_borrower() {
    let client = Client::new();
    let pool = db::pool().await;
    let user_id = create_user(&client, "client").await;
    let (_, copy_id) = create_book_with_copy(&client).await;

    let response = create_loan(&client, user_id, copy_id).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["loan"]["id"].as_i64().expect("No loan id");

    // 25 hours late: two days of sanction
    db::backdate_loan(&pool, loan_id, 25).await;

    let response = client
        .post(format!("{}/devoluciones", BASE_URL))
        .json(&json!({ "loan_id": loan_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["overdue"], true);

    let returned_at = timestamp(&body["returned_at"]);
    let ends_at = timestamp(&body["sanction"]["ends_at"]);
    assert_eq!(timestamp(&body["sanction"]["starts_at"]), returned_at);
    assert_eq!(ends_at, returned_at + Duration::days(2));

    let response = client
        .get(format!("{}/sanciones/estado?user_id={}", BASE_URL, user_id))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["blocked"], true);
    assert_eq!(timestamp(&body["until"]), ends_at);

    // Blocked borrower cannot take another copy
    let (_, other_copy) = create_book_with_copy(&client).await;
    let response = create_loan(&client, user_id, other_copy).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_repeated_return_changes_nothing() {
    let client = Client::new();
    let pool = db::pool().await;
    let user_id = create_user(&client, "client").await;
    let (_, copy_id) = create_book_with_copy(&client).await;

    let response = create_loan(&client, user_id, copy_id).await;
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["loan"]["id"].as_i64().expect("No loan id");
    db::backdate_loan(&pool, loan_id, 3).await;

    let response = client
        .post(format!("{}/devoluciones", BASE_URL))
        .json(&json!({ "loan_id": loan_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    assert_eq!(db::sanction_count(&pool, user_id).await, 1);

    // Staff release the copy by hand before the second attempt
    let response = client
        .put(format!("{}/ejemplares/{}", BASE_URL, copy_id))
        .json(&json!({ "status": "available" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    for body in [json!({ "loan_id": loan_id }), json!({ "copy_id": copy_id })] {
        let response = client
            .post(format!("{}/devoluciones", BASE_URL))
            .json(&body)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["ok"], false);
    }

    assert_eq!(db::sanction_count(&pool, user_id).await, 1);
    assert_eq!(db::copy_status(&pool, copy_id).await, "available");
}
