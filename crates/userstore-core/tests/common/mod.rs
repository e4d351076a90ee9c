//! Fake user backend for integration tests.
//!
//! Serves the same routes as the real backend on `127.0.0.1:0`. Replies to
//! `GET /users` can be scripted ahead of time; once the script runs out the
//! current user list is returned with 200.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use reqwest::Url;
use serde_json::{json, Value};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;
use userstore_core::{ApiClient, DataStore, MemoryTokenStore, RetryPolicy};

/// Short pause so retry tests stay fast
pub const FAST_RETRY: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Default)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct Backend {
    list_hits: AtomicUsize,
    list_script: Mutex<VecDeque<StatusCode>>,
    users: Mutex<Value>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl Backend {
    pub fn with_users(users: Value) -> Arc<Self> {
        let backend = Self::default();
        *backend.users.lock().unwrap() = users;
        Arc::new(backend)
    }

    /// Queue failure statuses for upcoming `GET /users` calls
    pub fn fail_next(&self, statuses: &[StatusCode]) {
        self.list_script.lock().unwrap().extend(statuses.iter().copied());
    }

    pub fn set_users(&self, users: Value) {
        *self.users.lock().unwrap() = users;
    }

    pub fn list_hits(&self) -> usize {
        self.list_hits.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    fn record(&self, method: &str, path: String, headers: &HeaderMap, body: Option<Value>) {
        let header_str = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.seen.lock().unwrap().push(SeenRequest {
            method: method.to_string(),
            path,
            authorization: header_str(header::AUTHORIZATION),
            content_type: header_str(header::CONTENT_TYPE),
            body,
        });
    }
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn list_users(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.list_hits.fetch_add(1, Ordering::SeqCst);
    backend.record("GET", "/users".to_string(), &headers, None);

    if !headers.contains_key(header::AUTHORIZATION) {
        return error_reply(StatusCode::UNAUTHORIZED, "Token is missing!");
    }
    let scripted = backend.list_script.lock().unwrap().pop_front();
    if let Some(status) = scripted {
        return error_reply(status, &format!("scripted failure {}", status.as_u16()));
    }
    let users = backend.users.lock().unwrap().clone();
    Json(users).into_response()
}

async fn create_user(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    backend.record("POST", "/users".to_string(), &headers, Some(body));
    (StatusCode::CREATED, Json(json!({ "message": "User created successfully!" }))).into_response()
}

async fn update_user(
    State(backend): State<Arc<Backend>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    backend.record("PUT", format!("/users/{}", id), &headers, Some(body));
    if id == 404 {
        return error_reply(StatusCode::NOT_FOUND, "User not found");
    }
    Json(json!({ "message": "User updated successfully!" })).into_response()
}

async fn delete_user(
    State(backend): State<Arc<Backend>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    backend.record("DELETE", format!("/users/{}", id), &headers, None);
    Json(json!({ "message": "User deleted successfully!" })).into_response()
}

/// Start the fake backend and return its base URL
pub async fn spawn_backend(backend: Arc<Backend>) -> Url {
    let app = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", put(update_user).delete(delete_user))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve fake backend");
    });

    Url::parse(&format!("http://{}/", addr)).expect("base url")
}

/// A base URL nothing is listening on
pub async fn dead_url() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);
    Url::parse(&format!("http://{}/", addr)).expect("base url")
}

pub fn client(base_url: Url, tokens: Arc<MemoryTokenStore>, retry_delay: Duration) -> ApiClient {
    ApiClient::new(base_url, tokens)
        .expect("build client")
        .with_retry_policy(RetryPolicy::new(3, retry_delay))
}

pub async fn store_for(backend: Arc<Backend>) -> DataStore {
    let url = spawn_backend(backend).await;
    DataStore::new(client(url, Arc::new(MemoryTokenStore::new("test-token")), FAST_RETRY))
}

/// Log output captured from a thread-local subscriber
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route this thread's tracing events into the capture until the guard drops
    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Captured lines logged at `level`, e.g. "WARN"
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.split_whitespace().any(|word| word == level))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
