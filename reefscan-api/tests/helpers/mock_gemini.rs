//! In-process stand-in for the Gemini `generateContent` endpoint
//!
//! Binds 127.0.0.1:0, records every request and answers with a canned reply.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the mock answers with
#[derive(Clone, Debug)]
pub enum MockReply {
    /// 200 with a single candidate carrying this text
    Text(String),
    /// 200 with this exact JSON envelope
    Envelope(Value),
    /// Non-2xx status with a body
    Status(u16, String),
    /// Sleep, then answer like `Text`
    Delayed(Duration, String),
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub path: String,
    pub api_key: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    reply: MockReply,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct MockGemini {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockGemini {
    pub async fn start(reply: MockReply) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            reply,
            requests: requests.clone(),
        };

        let app = Router::new().fallback(handle).with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn text_envelope(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

async fn handle(State(state): State<MockState>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    match state.reply {
        MockReply::Text(text) => Json(text_envelope(&text)).into_response(),
        MockReply::Envelope(value) => Json(value).into_response(),
        MockReply::Status(code, body) => {
            (StatusCode::from_u16(code).unwrap(), body).into_response()
        }
        MockReply::Delayed(delay, text) => {
            tokio::time::sleep(delay).await;
            Json(text_envelope(&text)).into_response()
        }
    }
}
