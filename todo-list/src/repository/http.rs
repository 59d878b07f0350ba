//! `reqwest`-based implementation of the todo repository.

use crate::config::ClientConfig;
use crate::repository::RepositoryError::{InvalidRequest, MalformedResponse, Status, Transport};
use crate::repository::{RepositoryError, TodoRepository};
use crate::todo::{CreatedTodo, NewTodo, TodoQuery, TodoRecord};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

const TODOS_PATH: &str = "todos";

/// Talks to `{api_url}/todos` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTodoRepository {
    client: Client,
    todos_url: Url,
}

impl HttpTodoRepository {
    /// Creates a repository rooted at `api_url`.
    ///
    /// # Arguments
    ///
    /// * `api_url` - Base of the API, e.g. `http://localhost:4567/api`
    /// * `timeout` - Optional limit on each whole request
    pub fn new(api_url: &str, timeout: Option<Duration>) -> Result<Self, RepositoryError> {
        let mut base = Url::parse(api_url)
            .map_err(|e| InvalidRequest(format!("invalid api url '{api_url}': {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let todos_url = base
            .join(TODOS_PATH)
            .map_err(|e| InvalidRequest(format!("invalid api url '{api_url}': {e}")))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| Transport(e.to_string()))?;

        Ok(Self { client, todos_url })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, RepositoryError> {
        Self::new(&config.api_url, config.request_timeout())
    }

    pub fn todos_url(&self) -> &Url {
        &self.todos_url
    }

    fn todo_url(&self, id: &str) -> Result<Url, RepositoryError> {
        if id.trim().is_empty() {
            return Err(InvalidRequest("todo id must not be empty".to_string()));
        }
        let mut url = self.todos_url.clone();
        url.path_segments_mut()
            .map_err(|_| InvalidRequest(format!("'{}' cannot hold a todo id", self.todos_url)))?
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl TodoRepository for HttpTodoRepository {
    #[tracing::instrument(skip(self))]
    async fn list(&self, query: &TodoQuery) -> Result<Vec<TodoRecord>, RepositoryError> {
        let response = self
            .client
            .get(self.todos_url.clone())
            .query(&query.to_query_pairs())
            .send()
            .await
            .map_err(send_error)?;
        let todos: Vec<TodoRecord> = decode(check_status(response).await?).await?;
        info!("Fetched {} todos", todos.len());
        Ok(todos)
    }

    #[tracing::instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> Result<Option<TodoRecord>, RepositoryError> {
        let response = self
            .client
            .get(self.todo_url(id)?)
            .send()
            .await
            .map_err(send_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("No todo with id {}", id);
            return Ok(None);
        }
        let todo = decode(check_status(response).await?).await?;
        Ok(Some(todo))
    }

    #[tracing::instrument(skip(self))]
    async fn create(&self, todo: &NewTodo) -> Result<String, RepositoryError> {
        if let Some(field) = todo.missing_field() {
            return Err(InvalidRequest(format!("todo must have a non-empty {field}")));
        }
        let response = self
            .client
            .post(self.todos_url.clone())
            .json(todo)
            .send()
            .await
            .map_err(send_error)?;
        let created: CreatedTodo = decode(check_status(response).await?).await?;
        info!("Created todo {}", created.id);
        Ok(created.id)
    }
}

fn send_error(error: reqwest::Error) -> RepositoryError {
    if error.is_builder() {
        InvalidRequest(error.to_string())
    } else {
        Transport(error.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, RepositoryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.text().await {
        Ok(body) if !body.trim().is_empty() => body,
        _ => status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string(),
    };
    Err(Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RepositoryError> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.map_err(|e| MalformedResponse {
        status,
        message: e.to_string(),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| MalformedResponse {
        status,
        message: e.to_string(),
    })
}
