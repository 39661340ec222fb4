use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use todo_server::web::{AppState, create_app};
use tower::ServiceExt;

mod common;

async fn setup_app() -> (common::TestContext, Router) {
    let context = common::setup().await.expect("Failed to setup test context");
    let state = AppState::new(context.config.clone(), Arc::new(context.store.clone()));
    (context, create_app(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn list(app: &Router) -> Vec<Value> {
    let (status, body) = send(app, Method::GET, "/todo/", None).await;
    assert_eq!(status, StatusCode::OK);
    body["data"].as_array().cloned().expect("data should be an array")
}

#[tokio::test]
async fn can_walk_through_todo_lifecycle() {
    let (_context, app) = setup_app().await;
    let before_create = Utc::now().timestamp_millis();

    let (status, body) = send(&app, Method::POST, "/todo/", Some(json!({ "title": "buy milk" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "todo created successfully");
    let todo_id = body["todo_id"].as_str().unwrap().to_string();
    assert_eq!(todo_id.len(), 24);

    let todos = list(&app).await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["id"], todo_id.as_str());
    assert_eq!(todos[0]["title"], "buy milk");
    assert_eq!(todos[0]["completed"], false);
    let created_at = todos[0]["created_at"].as_str().unwrap().to_string();
    let created_at_millis = chrono::DateTime::parse_from_rfc3339(&created_at)
        .unwrap()
        .timestamp_millis();
    assert!(created_at_millis >= before_create);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/todo/{todo_id}"),
        Some(json!({ "title": "buy milk", "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let todos = list(&app).await;
    assert_eq!(
        todos,
        vec![json!({
            "id": todo_id,
            "title": "buy milk",
            "completed": true,
            "created_at": created_at,
        })]
    );

    let (status, body) = send(&app, Method::DELETE, &format!("/todo/{todo_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "todo deleted successfully" }));
    assert!(list(&app).await.is_empty());

    let (status, _) = send(&app, Method::DELETE, &format!("/todo/{todo_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn can_refuse_to_store_todo_without_title() {
    let (_context, app) = setup_app().await;

    let (status, body) = send(&app, Method::POST, "/todo/", Some(json!({ "title": "" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "the title is required");
    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn can_report_update_of_missing_todo() {
    let (_context, app) = setup_app().await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/todo/507f1f77bcf86cd799439011",
        Some(json!({ "title": "buy milk", "completed": true })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
    assert!(list(&app).await.is_empty());
}

#[tokio::test]
async fn can_reject_invalid_ids() {
    let (_context, app) = setup_app().await;

    let (status, body) = send(&app, Method::DELETE, "/todo/42", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "the id is invalid");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/todo/42",
        Some(json!({ "title": "buy milk", "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "the id is invalid");
}
