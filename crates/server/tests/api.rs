use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;

async fn test_app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    server::app(engine)
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn business_with_book(app: &Router) -> (String, String) {
    let (status, body) = call(
        app,
        "POST",
        "/businesses",
        Some("alice"),
        Some(json!({ "name": "Corner Shop", "currency": "INR" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let business_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        app,
        "POST",
        &format!("/businesses/{business_id}/books"),
        Some("alice"),
        Some(json!({ "name": "Main" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let book_id = body["id"].as_str().unwrap().to_string();
    (business_id, book_id)
}

#[tokio::test]
async fn missing_user_header_is_unauthorized() {
    let app = test_app().await;
    let (status, _) = call(&app, "GET", "/businesses", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn entries_update_book_totals() {
    let app = test_app().await;
    let (business_id, book_id) = business_with_book(&app).await;

    let (status, body) = call(
        &app,
        "POST",
        &format!("/businesses/{business_id}/entries"),
        Some("alice"),
        Some(json!({
            "book_id": book_id,
            "direction": "in",
            "amount_minor": 500,
            "occurred_at": "2024-05-01T10:00:00+05:30",
            "remark": "opening cash",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let first = body["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        "POST",
        &format!("/businesses/{business_id}/entries"),
        Some("alice"),
        Some(json!({
            "book_id": book_id,
            "direction": "out",
            "amount_minor": 200,
            "occurred_at": "2024-05-02T10:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let second = body["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        "PATCH",
        &format!("/businesses/{business_id}/entries/{second}"),
        Some("alice"),
        Some(json!({ "amount_minor": 50, "expected_version": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 1);

    let (status, _) = call(
        &app,
        "DELETE",
        &format!("/businesses/{business_id}/entries/{first}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/businesses/{business_id}/books/{book_id}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_in_minor"], 0);
    assert_eq!(body["total_out_minor"], 50);
    assert_eq!(body["net_balance_minor"], -50);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/businesses/{business_id}/entries?limit=10"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"].as_array().unwrap().len(), 1);
    assert!(body["next_cursor"].is_null());
}

#[tokio::test]
async fn engine_errors_map_to_status_codes() {
    let app = test_app().await;
    let (business_id, book_id) = business_with_book(&app).await;

    let (status, _) = call(
        &app,
        "POST",
        &format!("/businesses/{business_id}/members"),
        Some("alice"),
        Some(json!({ "user_id": "vic", "role": "viewer" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let entry = json!({
        "book_id": book_id,
        "direction": "in",
        "amount_minor": 10,
        "occurred_at": "2024-05-01T10:00:00Z",
    });
    let (status, body) = call(
        &app,
        "POST",
        &format!("/businesses/{business_id}/entries"),
        Some("vic"),
        Some(entry.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("partner"));

    let (status, _) = call(
        &app,
        "POST",
        &format!("/businesses/{business_id}/entries"),
        Some("mallory"),
        Some(entry),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        "POST",
        &format!("/businesses/{business_id}/books"),
        Some("alice"),
        Some(json!({ "name": "MAIN" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        "POST",
        &format!("/businesses/{business_id}/entries"),
        Some("alice"),
        Some(json!({
            "book_id": book_id,
            "direction": "out",
            "amount_minor": -1,
            "occurred_at": "2024-05-01T10:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/businesses/{business_id}/books/{book_id}"),
        Some("vic"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_in_minor"], 0);
}

#[tokio::test]
async fn transfer_moves_entry_between_books() {
    let app = test_app().await;
    let (business_id, x) = business_with_book(&app).await;
    let (_, body) = call(
        &app,
        "POST",
        &format!("/businesses/{business_id}/books"),
        Some("alice"),
        Some(json!({ "name": "Petty cash" })),
    )
    .await;
    let y = body["id"].as_str().unwrap().to_string();

    let (_, body) = call(
        &app,
        "POST",
        &format!("/businesses/{business_id}/entries"),
        Some("alice"),
        Some(json!({
            "book_id": x,
            "direction": "out",
            "amount_minor": 75,
            "occurred_at": "2024-05-01T10:00:00Z",
        })),
    )
    .await;
    let entry_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        "POST",
        &format!("/businesses/{business_id}/entries/{entry_id}/transfer"),
        Some("alice"),
        Some(json!({ "target_book_id": y })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["id"].as_str().unwrap(), entry_id);

    let (status, _) = call(
        &app,
        "POST",
        &format!("/businesses/{business_id}/entries/{}/transfer", body["id"].as_str().unwrap()),
        Some("alice"),
        Some(json!({ "target_book_id": y })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = call(
        &app,
        "GET",
        &format!("/businesses/{business_id}/books/{y}"),
        Some("alice"),
        None,
    )
    .await;
    assert_eq!(body["total_out_minor"], 75);
    assert_eq!(body["net_balance_minor"], -75);
}

#[tokio::test]
async fn conflicting_counterparty_patch_is_rejected() {
    let app = test_app().await;
    let (business_id, book_id) = business_with_book(&app).await;

    let (_, body) = call(
        &app,
        "POST",
        &format!("/businesses/{business_id}/entries"),
        Some("alice"),
        Some(json!({
            "book_id": book_id,
            "direction": "in",
            "amount_minor": 10,
            "occurred_at": "2024-05-01T10:00:00Z",
        })),
    )
    .await;
    let entry_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        &app,
        "PATCH",
        &format!("/businesses/{business_id}/entries/{entry_id}"),
        Some("alice"),
        Some(json!({
            "counterparty_id": "00000000-0000-0000-0000-000000000001",
            "clear_counterparty": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("mutually exclusive"));
}
