use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde_json::{Value, json};

/// Behaviour of the fake event server.
#[derive(Default)]
pub struct MockState {
    pub events: Vec<Value>,
    /// When set, `GET /api/events` answers with this status and error message.
    pub fail_with: Option<(u16, String)>,
    /// When set, `GET /api/events` answers 200 with this raw body.
    pub raw_body: Option<String>,
}

pub type SharedMock = Arc<Mutex<MockState>>;

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: SharedMock,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn new() -> Self {
        let state: SharedMock = Arc::new(Mutex::new(MockState::default()));
        let app = axum::Router::new()
            .route("/api/events", get(list_events))
            .route("/api/events/clear", post(clear_events))
            .route("/test-webhook", post(test_webhook))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            state,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn push_event(&self, kind: &str, message: &str) {
        self.state.lock().unwrap().events.push(json!({
            "type": kind,
            "message": message,
            "repository": "test-repo",
            "timestamp": "1st January 2026 - 12:00 AM UTC",
        }));
    }

    pub fn fail_with(&self, status: u16, message: &str) {
        self.state.lock().unwrap().fail_with = Some((status, message.to_string()));
    }

    pub fn serve_raw(&self, body: &str) {
        self.state.lock().unwrap().raw_body = Some(body.to_string());
    }

    pub fn recover(&self) {
        let mut state = self.state.lock().unwrap();
        state.fail_with = None;
        state.raw_body = None;
    }
}

async fn list_events(State(state): State<SharedMock>) -> (StatusCode, String) {
    let state = state.lock().unwrap();
    if let Some((status, message)) = &state.fail_with {
        let code = StatusCode::from_u16(*status).unwrap();
        return (code, json!({ "error": message }).to_string());
    }
    if let Some(raw) = &state.raw_body {
        return (StatusCode::OK, raw.clone());
    }
    // Newest first, like the real server
    let events: Vec<Value> = state.events.iter().rev().cloned().collect();
    let body = json!({ "events": events, "count": state.events.len() });
    (StatusCode::OK, body.to_string())
}

async fn clear_events(State(state): State<SharedMock>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    let cleared = state.events.len();
    state.events.clear();
    Json(json!({
        "status": "success",
        "message": format!("Cleared {cleared} events from memory"),
    }))
}

async fn test_webhook(
    State(state): State<SharedMock>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let kind = body["type"].as_str().unwrap_or("push").to_string();
    let message = match kind.as_str() {
        "push" => "\"TestUser\" pushed to \"main\"",
        "pull_request" => "\"TestUser\" submitted a pull request from \"feature-branch\" to \"main\"",
        "merge" => "\"TestUser\" merged branch \"feature-branch\" to \"main\"",
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid event type" })),
            );
        },
    };
    state.lock().unwrap().events.push(json!({
        "type": kind,
        "message": message,
        "repository": "test-repo",
        "timestamp": "1st January 2026 - 12:00 AM UTC",
    }));
    (
        StatusCode::OK,
        Json(json!({ "status": "success", "message": "Test event created successfully" })),
    )
}
