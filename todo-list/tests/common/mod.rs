#![allow(dead_code)]

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use todo_list::notify::Notifier;
use todo_list::{NewTodo, RepositoryError, TodoQuery, TodoRecord, TodoRepository};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};

pub fn init_tracing() {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn todo(id: &str, owner: &str, status: bool, body: &str, category: &str) -> TodoRecord {
    TodoRecord {
        id: id.to_string(),
        owner: owner.to_string(),
        status,
        body: body.to_string(),
        category: category.to_string(),
    }
}

pub fn test_todos() -> Vec<TodoRecord> {
    vec![
        todo(
            "58af3a600343927e48e8720f",
            "Blanche",
            false,
            "In sunt ex non tempor cillum commodo amet incididunt anim qui commodo quis.",
            "software design",
        ),
        todo(
            "58af3a600343927e48e87210",
            "Fry",
            false,
            "Ipsum esse est ullamco magna tempor anim laborum non officia deserunt veniam commodo.",
            "video games",
        ),
        todo(
            "58af3a600343927e48e87211",
            "Fry",
            true,
            "Ullamco irure laborum magna dolor non. Anim occaecat adipisicing cillum eu magna in.",
            "homework",
        ),
    ]
}

/// How the fake API answers list requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    Normal,
    Fail(StatusCode),
    Malformed,
}

/// A list request as the fake API saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub raw_query: Option<String>,
    pub params: HashMap<String, String>,
}

/// In-memory stand-in for the todos API, served by axum.
#[derive(Clone)]
pub struct FakeTodosApi {
    todos: Arc<Mutex<Vec<TodoRecord>>>,
    list_requests: Arc<Mutex<Vec<RecordedRequest>>>,
    create_count: Arc<Mutex<usize>>,
    mode: Arc<Mutex<ListMode>>,
}

impl FakeTodosApi {
    pub fn new(todos: Vec<TodoRecord>) -> Self {
        Self {
            todos: Arc::new(Mutex::new(todos)),
            list_requests: Arc::new(Mutex::new(Vec::new())),
            create_count: Arc::new(Mutex::new(0)),
            mode: Arc::new(Mutex::new(ListMode::Normal)),
        }
    }

    pub fn set_mode(&self, mode: ListMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn list_requests(&self) -> Vec<RecordedRequest> {
        self.list_requests.lock().unwrap().clone()
    }

    pub fn create_count(&self) -> usize {
        *self.create_count.lock().unwrap()
    }

    pub fn todos(&self) -> Vec<TodoRecord> {
        self.todos.lock().unwrap().clone()
    }

    fn router(self) -> Router {
        Router::new()
            .route("/api/todos", get(list_todos).post(create_todo))
            .route("/api/todos/{id}", get(get_todo))
            .with_state(self)
    }

    /// Serves the API on an ephemeral port and returns its api url.
    pub async fn spawn(self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake API");
        let addr = listener.local_addr().expect("Fake API has no address");
        tokio::spawn(async move {
            axum::serve(listener, self.router())
                .await
                .expect("Fake API stopped");
        });
        format!("http://{}/api", addr)
    }
}

/// Serves an API that accepts connections and never answers, holding each
/// connection open for `hold`.
pub async fn spawn_silent_api(hold: Duration) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind silent API");
    let addr = listener.local_addr().expect("Silent API has no address");
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                tokio::time::sleep(hold).await;
                drop(stream);
            });
        }
    });
    format!("http://{}/api", addr)
}

/// Serves an API that answers `200 OK` but closes the connection before the
/// promised body has been sent.
pub async fn spawn_truncating_api() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind truncating API");
    let addr = listener.local_addr().expect("Truncating API has no address");
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 512\r\n\r\n[{\"_id\":";
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    format!("http://{}/api", addr)
}

fn contains_ignoring_case(field: &str, needle: &str) -> bool {
    field.to_lowercase().contains(&needle.to_lowercase())
}

async fn list_todos(
    State(api): State<FakeTodosApi>,
    RawQuery(raw_query): RawQuery,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    api.list_requests.lock().unwrap().push(RecordedRequest {
        raw_query,
        params: params.clone(),
    });
    let mode = *api.mode.lock().unwrap();
    match mode {
        ListMode::Fail(status) => return (status, "the database is on fire").into_response(),
        ListMode::Malformed => return (StatusCode::OK, "this is not json").into_response(),
        ListMode::Normal => {}
    }

    let matching: Vec<TodoRecord> = api
        .todos()
        .into_iter()
        .filter(|t| params.get("owner").is_none_or(|o| contains_ignoring_case(&t.owner, o)))
        .filter(|t| {
            params
                .get("category")
                .is_none_or(|c| contains_ignoring_case(&t.category, c))
        })
        .filter(|t| params.get("status").is_none_or(|s| t.status.to_string() == *s))
        .filter(|t| params.get("body").is_none_or(|b| t.body == *b))
        .collect();
    Json(matching).into_response()
}

async fn get_todo(State(api): State<FakeTodosApi>, Path(id): Path<String>) -> Response {
    match api.todos().into_iter().find(|t| t.id == id) {
        Some(todo) => Json(todo).into_response(),
        None => (StatusCode::NOT_FOUND, "The requested todo was not found").into_response(),
    }
}

async fn create_todo(
    State(api): State<FakeTodosApi>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    *api.create_count.lock().unwrap() += 1;
    let field = |key: &str| body.get(key).and_then(|v| v.as_str()).unwrap_or("").to_string();
    let (owner, text, category) = (field("owner"), field("body"), field("category"));
    if owner.is_empty() || text.is_empty() || category.is_empty() {
        return (StatusCode::BAD_REQUEST, "Todo must have owner, body and category")
            .into_response();
    }
    let status = body.get("status").and_then(|v| v.as_bool()).unwrap_or(false);

    let mut todos = api.todos.lock().unwrap();
    let id = format!("58af3a600343927e48e8{:04x}", 0x7300 + todos.len());
    todos.push(todo(&id, &owner, status, &text, &category));
    (StatusCode::CREATED, Json(serde_json::json!({ "id": id }))).into_response()
}

/// Repository whose list calls wait until the test answers them.
///
/// Each call reports its query on the channel returned by [`ScriptedRepository::new`]
/// and then blocks until [`ScriptedRepository::respond`] is called for that query.
#[derive(Clone)]
pub struct ScriptedRepository {
    pending: Arc<Mutex<Vec<PendingList>>>,
    requests: mpsc::UnboundedSender<TodoQuery>,
}

struct PendingList {
    query: TodoQuery,
    reply: oneshot::Sender<Result<Vec<TodoRecord>, RepositoryError>>,
}

impl ScriptedRepository {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TodoQuery>) {
        let (requests, received) = mpsc::unbounded_channel();
        let repository = Self {
            pending: Arc::new(Mutex::new(Vec::new())),
            requests,
        };
        (repository, received)
    }

    /// Answers the outstanding call for `query`.
    ///
    /// Returns `false` when no caller is waiting for the answer any more.
    pub fn respond(
        &self,
        query: &TodoQuery,
        outcome: Result<Vec<TodoRecord>, RepositoryError>,
    ) -> bool {
        let mut pending = self.pending.lock().unwrap();
        let Some(position) = pending.iter().position(|p| &p.query == query) else {
            return false;
        };
        pending.remove(position).reply.send(outcome).is_ok()
    }
}

#[async_trait]
impl TodoRepository for ScriptedRepository {
    async fn list(&self, query: &TodoQuery) -> Result<Vec<TodoRecord>, RepositoryError> {
        let (reply, answer) = oneshot::channel();
        self.pending.lock().unwrap().push(PendingList {
            query: query.clone(),
            reply,
        });
        let _ = self.requests.send(query.clone());
        answer
            .await
            .unwrap_or_else(|_| Err(RepositoryError::Transport("no scripted answer".to_string())))
    }

    async fn get_by_id(&self, _id: &str) -> Result<Option<TodoRecord>, RepositoryError> {
        Ok(None)
    }

    async fn create(&self, _todo: &NewTodo) -> Result<String, RepositoryError> {
        Err(RepositoryError::InvalidRequest("not scripted".to_string()))
    }
}

/// Notifier that remembers every message it was asked to show.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<(String, String, Duration)>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|(message, _, _)| message.clone())
            .collect()
    }

    pub fn displays(&self) -> Vec<(String, String, Duration)> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn display(&self, message: &str, action: &str, duration: Duration) {
        self.messages
            .lock()
            .unwrap()
            .push((message.to_string(), action.to_string(), duration));
    }
}
