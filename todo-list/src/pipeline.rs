//! The filtered todo list a user browses.
//!
//! `TodoListPipeline` owns the owner and category criteria. Every change to
//! either one issues a new remote query, and the visible collection is the
//! remote result run through [`filter_todos`] with the same criteria.
//!
//! Requests are tagged with a generation number. A response is applied only
//! if no newer request has been issued since, so a slow answer to an old
//! query can never replace the answer to a newer one. Superseded tasks are
//! also aborted.
//!
//! List failures never escape: the visible collection becomes empty, the
//! message is kept in [`TodoListPipeline::last_error`] and handed to the
//! [`Notifier`].

use crate::config::NotificationConfig;
use crate::filter::filter_todos;
use crate::notify::Notifier;
use crate::repository::{RepositoryError, TodoRepository};
use crate::todo::{FilterCriteria, NewTodo, TodoRecord, normalize_criterion};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::runtime::{Handle, TryCurrentError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What a presentation surface renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoListView {
    pub todos: Vec<TodoRecord>,
    pub last_error: Option<String>,
    pub criteria: FilterCriteria,
    /// `true` while the latest query is outstanding
    pub loading: bool,
}

#[derive(Default)]
struct PipelineState {
    criteria: FilterCriteria,
    generation: u64,
    remote: Vec<TodoRecord>,
    last_error: Option<String>,
    loading: bool,
    in_flight: Option<JoinHandle<()>>,
}

impl PipelineState {
    fn view(&self) -> TodoListView {
        TodoListView {
            todos: filter_todos(&self.remote, &self.criteria),
            last_error: self.last_error.clone(),
            criteria: self.criteria.clone(),
            loading: self.loading,
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Queries need a tokio runtime to run on
    #[error("No tokio runtime to run todo queries on")]
    NoRuntime(#[from] TryCurrentError),
}

struct Shared<R, N> {
    runtime: Handle,
    repository: R,
    notifier: N,
    notification: NotificationConfig,
    state: Mutex<PipelineState>,
    views: watch::Sender<TodoListView>,
}

/// Filter state plus the queries it drives.
///
/// Cloning yields another handle to the same pipeline. Queries run on the
/// runtime captured at construction, so setters may be called from any thread.
pub struct TodoListPipeline<R, N> {
    shared: Arc<Shared<R, N>>,
}

impl<R, N> Clone for TodoListPipeline<R, N> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R, N> TodoListPipeline<R, N>
where
    R: TodoRepository + 'static,
    N: Notifier + 'static,
{
    /// Creates an idle pipeline with no criteria set, running queries on the
    /// current tokio runtime. Call [`refresh`](Self::refresh) for the initial load.
    pub fn new(
        repository: R,
        notifier: N,
        notification: NotificationConfig,
    ) -> Result<Self, PipelineError> {
        let runtime = Handle::try_current()?;
        Ok(Self::with_runtime(repository, notifier, notification, runtime))
    }

    pub fn with_runtime(
        repository: R,
        notifier: N,
        notification: NotificationConfig,
        runtime: Handle,
    ) -> Self {
        let (views, _) = watch::channel(TodoListView::default());
        Self {
            shared: Arc::new(Shared {
                runtime,
                repository,
                notifier,
                notification,
                state: Mutex::new(PipelineState::default()),
                views,
            }),
        }
    }

    /// Sets or clears the owner criterion. Blank values clear it.
    pub fn set_owner_filter<S: Into<String>>(&self, owner: Option<S>) {
        let owner = normalize_criterion(owner.map(Into::into));
        self.update_criteria(|criteria| {
            if criteria.owner == owner {
                return false;
            }
            criteria.owner = owner;
            true
        });
    }

    /// Sets or clears the category criterion. Blank values clear it.
    pub fn set_category_filter<S: Into<String>>(&self, category: Option<S>) {
        let category = normalize_criterion(category.map(Into::into));
        self.update_criteria(|criteria| {
            if criteria.category == category {
                return false;
            }
            criteria.category = category;
            true
        });
    }

    /// Re-issues the query for the current criteria.
    pub fn refresh(&self) {
        let mut state = self.shared.state();
        self.shared.issue(&mut state);
    }

    /// The remote result filtered locally by the current criteria.
    pub fn current_results(&self) -> Vec<TodoRecord> {
        let state = self.shared.state();
        filter_todos(&state.remote, &state.criteria)
    }

    /// The message for the last failed query, until a query succeeds.
    pub fn last_error(&self) -> Option<String> {
        self.shared.state().last_error.clone()
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.shared.state().criteria.clone()
    }

    pub fn view(&self) -> TodoListView {
        self.shared.state().view()
    }

    /// A feed of views, updated whenever criteria or results change.
    pub fn subscribe(&self) -> watch::Receiver<TodoListView> {
        self.shared.views.subscribe()
    }

    /// Waits until the latest issued query has resolved.
    pub async fn settled(&self) -> TodoListView {
        let mut views = self.subscribe();
        let settled = match views.wait_for(|view| !view.loading).await {
            Ok(view) => view.clone(),
            Err(_) => self.view(),
        };
        settled
    }

    /// Creates a todo, then reloads the list so it can show up.
    ///
    /// Failures are returned to the caller untouched; they do not reach
    /// the notifier or [`last_error`](Self::last_error).
    pub async fn create_todo(&self, todo: NewTodo) -> Result<String, RepositoryError> {
        let id = self.shared.repository.create(&todo).await?;
        info!("Created todo {}, reloading list", id);
        self.refresh();
        Ok(id)
    }

    fn update_criteria(&self, change: impl FnOnce(&mut FilterCriteria) -> bool) {
        let mut state = self.shared.state();
        if !change(&mut state.criteria) {
            debug!("Criteria unchanged, not querying");
            return;
        }
        self.shared.issue(&mut state);
    }
}

impl<R, N> Shared<R, N>
where
    R: TodoRepository + 'static,
    N: Notifier + 'static,
{
    fn state(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a query for `state.criteria`, superseding any outstanding one.
    ///
    /// The lock stays held while spawning so generations and handles are
    /// recorded in issue order.
    fn issue(self: &Arc<Self>, state: &mut PipelineState) {
        state.generation += 1;
        state.loading = true;
        let generation = state.generation;
        let query = state.criteria.to_query();
        debug!(generation, ?query, "Issuing todo query");

        let shared = Arc::clone(self);
        let handle = self.runtime.spawn(async move {
            let outcome = shared.repository.list(&query).await;
            shared.resolve(generation, outcome);
        });
        if let Some(previous) = state.in_flight.replace(handle) {
            previous.abort();
        }
        self.views.send_replace(state.view());
    }

    fn resolve(&self, generation: u64, outcome: Result<Vec<TodoRecord>, RepositoryError>) {
        let failure = {
            let mut state = self.state();
            if generation != state.generation {
                debug!(
                    generation,
                    current = state.generation,
                    "Discarding superseded todo query"
                );
                return;
            }
            state.loading = false;
            state.in_flight = None;
            let failure = match outcome {
                Ok(todos) => {
                    state.remote = todos;
                    state.last_error = None;
                    None
                }
                Err(error) => {
                    warn!(?error, "Todo query failed");
                    let message = error.user_message();
                    state.remote = Vec::new();
                    state.last_error = Some(message.clone());
                    Some(message)
                }
            };
            self.views.send_replace(state.view());
            failure
        };

        if let Some(message) = failure {
            self.notifier.display(
                &message,
                &self.notification.dismiss_label,
                self.notification.duration(),
            );
        }
    }
}
