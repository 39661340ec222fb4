use crate::todo::{InvalidTodoId, Todo, TodoStore, TodoStoreError, parse_todo_id};
use crate::web::api::ErrorResponse;
use axum::{
    Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// JSON representation of a todo for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct TodoJson {
    /// Unique identifier, 24 hexadecimal characters
    pub id: String,
    pub title: String,
    pub completed: bool,
    /// When the todo was created
    pub created_at: DateTime<Utc>,
}

impl From<Todo> for TodoJson {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id().to_hex(),
            title: todo.title().to_string(),
            completed: todo.completed(),
            created_at: todo.created_at(),
        }
    }
}

/// API response for listing all todos.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TodosResponse {
    pub data: Vec<TodoJson>,
}

/// Payload for creating a todo. Any other field is ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTodoRequest {
    #[serde(default)]
    pub title: Option<String>,
}

/// Payload for replacing the mutable fields of a todo.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTodoRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

/// API response after a todo has been created.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TodoCreatedResponse {
    pub message: String,
    pub todo_id: String,
}

/// API response carrying only a confirmation message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct TodoState {
    pub store: Arc<dyn TodoStore>,
}

impl TodoState {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }
}

/// Errors returned by the todo endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("the title is required")]
    MissingTitle,
    #[error("the id is invalid")]
    InvalidId(#[from] InvalidTodoId),
    /// The path segment could not be decoded into a string at all.
    #[error("the id is invalid")]
    UndecodableId(#[from] PathRejection),
    #[error("{}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),
    #[error("todo not found")]
    NotFound,
    /// The store failed. `context` is what gets shown to the client.
    #[error("{context}")]
    Storage {
        context: &'static str,
        #[source]
        source: TodoStoreError,
    },
}

impl ApiError {
    fn storage(context: &'static str) -> impl FnOnce(TodoStoreError) -> ApiError {
        move |source| match source {
            TodoStoreError::TodoNotFound(_) => ApiError::NotFound,
            source => ApiError::Storage { context, source },
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::MissingTitle => (StatusCode::BAD_REQUEST, "INVALID_TITLE"),
            ApiError::InvalidId(_) | ApiError::UndecodableId(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_ID")
            }
            ApiError::InvalidBody(rejection) => (rejection.status(), "INVALID_BODY"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage { context, source } = &self {
            tracing::error!("{}: {}", context, source);
        }
        let (status, code) = self.status_and_code();
        (status, Json(ErrorResponse::new(code, self.to_string()))).into_response()
    }
}

/// An absent, null or empty title is rejected. Anything else is kept as sent.
fn require_title(title: Option<String>) -> Result<String, ApiError> {
    match title {
        Some(title) if !title.is_empty() => Ok(title),
        _ => Err(ApiError::MissingTitle),
    }
}

/// Handler for GET /todo/ - Returns every todo.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/todo/",
    responses(
        (status = 200, description = "All stored todos", body = TodosResponse),
        (status = 500, description = "The todos could not be read", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn list_todos_handler(
    State(state): State<Arc<TodoState>>,
) -> Result<Json<TodosResponse>, ApiError> {
    let todos = state
        .store
        .list_all()
        .await
        .map_err(ApiError::storage("failed to fetch todos"))?;

    Ok(Json(TodosResponse {
        data: todos.into_iter().map(TodoJson::from).collect(),
    }))
}

/// Handler for POST /todo/ - Stores a new todo.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/todo/",
    request_body = CreateTodoRequest,
    responses(
        (status = 201, description = "Todo created", body = TodoCreatedResponse),
        (status = 400, description = "Missing title or malformed body", body = ErrorResponse),
        (status = 500, description = "The todo could not be saved", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn create_todo_handler(
    State(state): State<Arc<TodoState>>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TodoCreatedResponse>), ApiError> {
    let Json(request) = payload?;
    let title = require_title(request.title)?;

    let todo = Todo::new(title);
    state
        .store
        .insert(&todo)
        .await
        .map_err(ApiError::storage("failed to save todo"))?;
    tracing::info!("Created todo {}", todo.id());

    Ok((
        StatusCode::CREATED,
        Json(TodoCreatedResponse {
            message: "todo created successfully".to_string(),
            todo_id: todo.id().to_hex(),
        }),
    ))
}

/// Handler for PUT /todo/{id} - Replaces the title and completion flag.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    put,
    path = "/todo/{id}",
    params(("id" = String, Path, description = "Todo identifier, 24 hexadecimal characters")),
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "Todo updated", body = MessageResponse),
        (status = 400, description = "Invalid id, missing title or malformed body", body = ErrorResponse),
        (status = 404, description = "No todo with this id", body = ErrorResponse),
        (status = 500, description = "The todo could not be updated", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn update_todo_handler(
    State(state): State<Arc<TodoState>>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    let id = parse_todo_id(&id)?;
    let Json(request) = payload?;
    let title = require_title(request.title)?;

    state
        .store
        .update_by_id(id, title, request.completed)
        .await
        .map_err(ApiError::storage("failed to update todo"))?;

    Ok(Json(MessageResponse::new("todo updated successfully")))
}

/// Handler for DELETE /todo/{id} - Removes a todo.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/todo/{id}",
    params(("id" = String, Path, description = "Todo identifier, 24 hexadecimal characters")),
    responses(
        (status = 200, description = "Todo deleted, or it did not exist", body = MessageResponse),
        (status = 400, description = "Invalid id", body = ErrorResponse),
        (status = 500, description = "The todo could not be deleted", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn delete_todo_handler(
    State(state): State<Arc<TodoState>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = path?;
    let id = parse_todo_id(&id)?;

    state
        .store
        .delete_by_id(id)
        .await
        .map_err(ApiError::storage("failed to delete todo"))?;

    Ok(Json(MessageResponse::new("todo deleted successfully")))
}

/// Creates and returns the todo router.
pub fn create_todo_router(state: Arc<TodoState>) -> Router {
    Router::new()
        .route(
            "/todo",
            get(list_todos_handler).post(create_todo_handler),
        )
        .route(
            "/todo/",
            get(list_todos_handler).post(create_todo_handler),
        )
        .route(
            "/todo/{id}",
            put(update_todo_handler).delete(delete_todo_handler),
        )
        .with_state(state)
}
