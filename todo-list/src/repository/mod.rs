//! Access to the remote todos resource.
//!
//! This module provides:
//! - The `TodoRepository` trait, the capability the pipeline and the CLI talk to
//! - `RepositoryError`, which separates client-side from server-side faults
//! - An HTTP implementation in the `http` submodule
//!
//! Every call is a single request/response exchange. Nothing is retried or cached.

use crate::todo::{NewTodo, TodoQuery, TodoRecord};
use async_trait::async_trait;
use thiserror::Error;

pub mod http;

pub use http::HttpTodoRepository;

/// Which side of the connection a fault belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The request could not be formed or sent
    Client,
    /// A response arrived but reports failure
    Server,
}

/// Errors that can occur while talking to the todos resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The request was rejected before anything was sent
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The request could not be sent or did not complete
    #[error("request failed: {0}")]
    Transport(String),
    /// The server answered with a non-success status
    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },
    /// The server answered but the body could not be decoded
    #[error("malformed response (status {status}): {message}")]
    MalformedResponse { status: u16, message: String },
}

impl RepositoryError {
    pub fn fault(&self) -> Fault {
        match self {
            RepositoryError::InvalidRequest(_) | RepositoryError::Transport(_) => Fault::Client,
            RepositoryError::Status { .. } | RepositoryError::MalformedResponse { .. } => {
                Fault::Server
            }
        }
    }

    /// The status code of the response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            RepositoryError::Status { status, .. }
            | RepositoryError::MalformedResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The underlying detail without the variant prefix.
    pub fn detail(&self) -> &str {
        match self {
            RepositoryError::InvalidRequest(detail) | RepositoryError::Transport(detail) => detail,
            RepositoryError::Status { message, .. }
            | RepositoryError::MalformedResponse { message, .. } => message,
        }
    }

    /// A message fit to show the user.
    ///
    /// Client faults and server faults read differently so the user can
    /// tell a broken request from a broken server.
    pub fn user_message(&self) -> String {
        match self.fault() {
            Fault::Client => format!("Problem in the client - Error: {}", self.detail()),
            Fault::Server => format!(
                "Problem contacting the server - Error Code: {}\nMessage: {}",
                self.status().unwrap_or_default(),
                self.detail()
            ),
        }
    }
}

/// Remote operations on todos.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Fetches the todos matching `query`. Unset fields put no constraint on the result.
    async fn list(&self, query: &TodoQuery) -> Result<Vec<TodoRecord>, RepositoryError>;

    /// Fetches a single todo. `Ok(None)` means no todo has this id.
    async fn get_by_id(&self, id: &str) -> Result<Option<TodoRecord>, RepositoryError>;

    /// Creates a todo and returns the identity the server gave it.
    async fn create(&self, todo: &NewTodo) -> Result<String, RepositoryError>;
}
