use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::{DateTime, SubsecRound, Utc};

pub mod api;
pub mod store;

pub use store::MongoTodoStore;

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Todo {
    id: ObjectId,
    title: String,
    completed: bool,
    created_at: DateTime<Utc>,
}

impl Todo {
    /// Creates a brand new, not yet completed todo with a fresh identifier.
    ///
    /// The creation time is kept at millisecond precision, which is what the
    /// database stores.
    pub fn new(title: String) -> Self {
        Self {
            id: ObjectId::new(),
            title,
            completed: false,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    /// Rebuilds a todo from already persisted values.
    pub fn from_parts(
        id: ObjectId,
        title: String,
        completed: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            completed,
            created_at,
        }
    }

    /// Returns the ID of the todo.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns the title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns whether the todo is done.
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Returns when the todo was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Error type for TodoStore operations.
#[derive(Debug, thiserror::Error)]
pub enum TodoStoreError {
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),
    /// Represents a todo not found error.
    #[error("Todo with ID {0} not found")]
    TodoNotFound(ObjectId),
}

/// Raised when a path segment is not a valid todo identifier.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid todo id")]
pub struct InvalidTodoId(pub String);

/// Parses the textual form of a todo identifier: 24 hexadecimal characters,
/// surrounding whitespace ignored.
pub fn parse_todo_id(raw: &str) -> Result<ObjectId, InvalidTodoId> {
    ObjectId::parse_str(raw.trim()).map_err(|_| InvalidTodoId(raw.to_string()))
}

/// Operations the HTTP layer needs from the todo collection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Returns every stored todo, in no particular order.
    async fn list_all(&self) -> Result<Vec<Todo>, TodoStoreError>;

    /// Persists a fully populated todo.
    async fn insert(&self, todo: &Todo) -> Result<(), TodoStoreError>;

    /// Overwrites the title and completion flag of the todo with the given ID.
    ///
    /// Fails with [`TodoStoreError::TodoNotFound`] when no todo matches.
    async fn update_by_id(
        &self,
        id: ObjectId,
        title: String,
        completed: bool,
    ) -> Result<(), TodoStoreError>;

    /// Removes the todo with the given ID. Removing an unknown ID succeeds.
    async fn delete_by_id(&self, id: ObjectId) -> Result<(), TodoStoreError>;

    /// Checks that the database answers.
    async fn ping(&self) -> Result<(), TodoStoreError>;
}
