use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use chrono::{DateTime, Utc};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::todo::{Todo, TodoStore, TodoStoreError};

/// Shape of a todo inside the MongoDB collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub completed: bool,
    #[serde(
        rename = "createdAt",
        with = "bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created_at: DateTime<Utc>,
}

impl From<TodoDocument> for Todo {
    fn from(document: TodoDocument) -> Self {
        Todo::from_parts(
            document.id,
            document.title,
            document.completed,
            document.created_at,
        )
    }
}

impl From<&Todo> for TodoDocument {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id(),
            title: todo.title().to_string(),
            completed: todo.completed(),
            created_at: todo.created_at(),
        }
    }
}

/// [`TodoStore`] backed by a single MongoDB collection.
#[derive(Clone, Debug)]
pub struct MongoTodoStore {
    client: Client,
    collection: Collection<TodoDocument>,
}

impl MongoTodoStore {
    pub fn new(client: Client, db_name: &str, collection_name: &str) -> Self {
        let collection = client.database(db_name).collection(collection_name);
        Self { client, collection }
    }

    /// Connects to the database described by `config` and verifies it answers.
    ///
    /// # Returns
    ///
    /// A ready store, or the error that prevented reaching the database.
    #[tracing::instrument(skip(config), fields(db = %config.db_name, collection = %config.collection_name))]
    pub async fn connect(config: &Config) -> Result<Self, TodoStoreError> {
        let client = Client::with_uri_str(&config.mongo_uri).await?;
        let store = Self::new(client, &config.db_name, &config.collection_name);
        store.ping().await?;
        tracing::info!("Connected to MongoDB");
        Ok(store)
    }

    /// Closes the connection pools. Call once the web server has stopped.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        tracing::info!("MongoDB client shut down");
    }
}

#[async_trait]
impl TodoStore for MongoTodoStore {
    #[tracing::instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Todo>, TodoStoreError> {
        let mut cursor = self.collection.find(doc! {}).await?;
        let mut todos = Vec::new();
        while cursor.advance().await? {
            todos.push(Todo::from(cursor.deserialize_current()?));
        }
        Ok(todos)
    }

    #[tracing::instrument(skip(self, todo), fields(id = %todo.id()))]
    async fn insert(&self, todo: &Todo) -> Result<(), TodoStoreError> {
        self.collection.insert_one(TodoDocument::from(todo)).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn update_by_id(
        &self,
        id: ObjectId,
        title: String,
        completed: bool,
    ) -> Result<(), TodoStoreError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "title": title, "completed": completed } },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(TodoStoreError::TodoNotFound(id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_id(&self, id: ObjectId) -> Result<(), TodoStoreError> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        if result.deleted_count == 0 {
            tracing::debug!("No todo with ID {} to delete", id);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn ping(&self) -> Result<(), TodoStoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}
