use crate::todo::api::{
    self, CreateTodoRequest, MessageResponse, TodoCreatedResponse, TodoJson, TodoState,
    TodosResponse, UpdateTodoRequest,
};
use axum::{Json, Router, routing::get};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

/// JSON response for API errors
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Machine readable error code
    pub error: String,
    /// Human readable explanation
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: String) -> Self {
        Self {
            error: error.to_string(),
            message,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        api::list_todos_handler,
        api::create_todo_handler,
        api::update_todo_handler,
        api::delete_todo_handler,
    ),
    components(schemas(
        TodoJson,
        TodosResponse,
        CreateTodoRequest,
        UpdateTodoRequest,
        TodoCreatedResponse,
        MessageResponse,
        ErrorResponse,
    )),
    tags((name = "Todos", description = "Create, list, update and delete todo items"))
)]
pub struct ApiDoc;

#[tracing::instrument]
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Creates the JSON API routes: the todo endpoints and their OpenAPI document.
pub fn create_api_router(todo_state: Arc<TodoState>) -> Router {
    api::create_todo_router(todo_state)
        .route("/api-docs/openapi.json", get(openapi_handler))
}
