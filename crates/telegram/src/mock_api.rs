//! In-process Bot API double for tests.

use std::{
    collections::VecDeque,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::State,
        http::{Method, StatusCode, Uri},
        response::{IntoResponse, Response},
        routing::any,
    },
    serde_json::{Value, json},
    tokio::{sync::oneshot, task::JoinHandle},
};

pub(crate) const CONFLICT_DESCRIPTION: &str = "Conflict: terminated by other getUpdates request; make sure that only one bot instance is running";

#[derive(Debug, Clone)]
pub(crate) struct Captured {
    pub method: String,
    pub body: Value,
}

#[derive(Clone, Default)]
struct MockState {
    requests: Arc<Mutex<Vec<Captured>>>,
    update_batches: Arc<Mutex<VecDeque<Value>>>,
    conflict: bool,
}

pub(crate) struct MockTelegramApi {
    pub addr: SocketAddr,
    state: MockState,
    shutdown: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

impl MockTelegramApi {
    pub async fn start() -> Self {
        Self::start_with(MockState::default()).await
    }

    /// `getUpdates` answers with each batch in turn, then with empty lists.
    pub async fn with_updates(batches: Vec<Value>) -> Self {
        let state = MockState::default();
        state
            .update_batches
            .lock()
            .expect("lock batches")
            .extend(batches);
        Self::start_with(state).await
    }

    /// `getUpdates` always fails with the duplicate-poller conflict.
    pub async fn conflicting() -> Self {
        Self::start_with(MockState {
            conflict: true,
            ..MockState::default()
        })
        .await
    }

    async fn start_with(state: MockState) -> Self {
        let app = Router::new()
            .route("/{*path}", any(api_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        Self {
            addr,
            state,
            shutdown,
            server,
        }
    }

    pub fn bot(&self) -> teloxide::Bot {
        let url = reqwest::Url::parse(&format!("http://{}/", self.addr)).expect("parse api url");
        teloxide::Bot::new("test-token").set_api_url(url)
    }

    /// Every request except `getUpdates`.
    pub fn requests(&self) -> Vec<Captured> {
        self.state.requests.lock().expect("lock requests").clone()
    }

    pub fn sent_messages(&self) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "SendMessage")
            .map(|r| r.body)
            .collect()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.server.await;
    }
}

fn ok(result: Value) -> Response {
    Json(json!({ "ok": true, "result": result })).into_response()
}

async fn api_handler(
    State(state): State<MockState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    // file downloads: GET /file/bot<token>/<path>
    if method == Method::GET && uri.path().starts_with("/file/") {
        return (StatusCode::OK, &b"jpeg-bytes"[..]).into_response();
    }

    let method = uri.path().rsplit('/').next().unwrap_or_default().to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    if method == "GetUpdates" {
        if state.conflict {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "ok": false,
                    "error_code": 409,
                    "description": CONFLICT_DESCRIPTION,
                })),
            )
                .into_response();
        }
        let batch = state.update_batches.lock().expect("lock batches").pop_front();
        return match batch {
            Some(batch) => ok(batch),
            None => {
                tokio::time::sleep(Duration::from_millis(20)).await;
                ok(json!([]))
            },
        };
    }

    state
        .requests
        .lock()
        .expect("lock requests")
        .push(Captured {
            method: method.clone(),
            body: body.clone(),
        });

    match method.as_str() {
        "GetMe" => ok(json!({
            "id": 1,
            "is_bot": true,
            "first_name": "Courier",
            "username": "courier_bot",
            "can_join_groups": false,
            "can_read_all_group_messages": false,
            "supports_inline_queries": false,
            "can_connect_to_business": false,
            "has_main_web_app": false
        })),
        "SendMessage" => ok(json!({
            "message_id": 1,
            "date": 0,
            "chat": { "id": body["chat_id"], "type": "private" },
            "text": body["text"],
        })),
        "GetFile" => ok(json!({
            "file_id": body["file_id"],
            "file_unique_id": "unique",
            "file_size": 10,
            "file_path": "photos/file_1.jpg"
        })),
        _ => ok(json!(true)),
    }
}
