//! Client for browsing and creating todos on a remote todos API.
//!
//! The heart of the crate is [`pipeline::TodoListPipeline`], which turns owner
//! and category criteria into remote queries and keeps the visible list in
//! step with the most recent one.

pub mod config;
pub mod filter;
pub mod notify;
pub mod pipeline;
pub mod repository;
pub mod todo;

pub use filter::filter_todos;
pub use pipeline::{PipelineError, TodoListPipeline, TodoListView};
pub use repository::{Fault, HttpTodoRepository, RepositoryError, TodoRepository};
pub use todo::{FilterCriteria, NewTodo, TodoQuery, TodoRecord};
