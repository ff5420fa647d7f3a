//! Local JSON-RPC stub node for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const STATUS: &str = include_str!("../fixtures/status.json");
pub const VALIDATORS: &str = include_str!("../fixtures/validators.json");
pub const PROTOCOL_CONFIG: &str = include_str!("../fixtures/protocol_config.json");

/// How the stub answers a given method.
#[derive(Clone, Debug)]
pub enum Reply {
    Result(Value),
    Error(Value),
    Http(StatusCode, &'static str),
}

#[derive(Default)]
pub struct StubState {
    pub overrides: Mutex<Vec<(String, Reply)>>,
    pub requests: Mutex<Vec<Value>>,
    pub hits: AtomicU32,
}

impl StubState {
    pub fn set(&self, method: &str, reply: Reply) {
        let mut overrides = self.overrides.lock().unwrap();
        overrides.retain(|(m, _)| m != method);
        overrides.push((method.to_string(), reply));
    }

    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn hits_for(&self, method: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r["method"] == method)
            .count()
    }

    pub fn last_request(&self, method: &str) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r["method"] == method)
            .cloned()
    }
}

pub struct StubNode {
    pub addr: SocketAddr,
    pub state: Arc<StubState>,
    handle: JoinHandle<()>,
}

impl StubNode {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for StubNode {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn fixture_error() -> Value {
    json!({
        "name": "HANDLER_ERROR",
        "code": -32000,
        "message": "Server error",
        "data": "Unknown Epoch",
        "cause": { "name": "UNKNOWN_EPOCH", "info": null }
    })
}

/// Starts a stub node on an ephemeral port serving the fixtures.
pub async fn spawn_stub() -> StubNode {
    let state = Arc::new(StubState::default());
    let app = Router::new()
        .route("/", post(handle))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local server");
    let addr = listener.local_addr().expect("read addr");

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    StubNode {
        addr,
        state,
        handle,
    }
}

async fn handle(State(state): State<Arc<StubState>>, Json(req): Json<Value>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().unwrap().push(req.clone());

    let method = req["method"].as_str().unwrap_or_default().to_string();
    let id = req["id"].clone();

    let override_reply = state
        .overrides
        .lock()
        .unwrap()
        .iter()
        .find(|(m, _)| *m == method)
        .map(|(_, r)| r.clone());

    let reply = override_reply.unwrap_or_else(|| match method.as_str() {
        "status" => Reply::Result(serde_json::from_str(STATUS).unwrap()),
        "validators" => Reply::Result(serde_json::from_str(VALIDATORS).unwrap()),
        "EXPERIMENTAL_protocol_config" => {
            Reply::Result(serde_json::from_str(PROTOCOL_CONFIG).unwrap())
        }
        _ => Reply::Error(json!({
            "name": "REQUEST_VALIDATION_ERROR",
            "code": -32601,
            "message": "Method not found"
        })),
    });

    match reply {
        Reply::Result(result) => {
            Json(json!({ "jsonrpc": "2.0", "id": id, "result": result })).into_response()
        }
        Reply::Error(error) => {
            Json(json!({ "jsonrpc": "2.0", "id": id, "error": error })).into_response()
        }
        Reply::Http(status, body) => (status, body).into_response(),
    }
}
