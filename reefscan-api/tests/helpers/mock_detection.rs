//! In-process stand-in for a live detection endpoint
//!
//! Records the content type and raw body of each request and answers with a
//! fixed status and JSON body.

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug)]
pub struct RecordedDetectionRequest {
    pub path: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl RecordedDetectionRequest {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Clone)]
struct MockState {
    status: u16,
    body: String,
    requests: Arc<Mutex<Vec<RecordedDetectionRequest>>>,
}

pub struct MockDetectionApi {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedDetectionRequest>>>,
}

impl MockDetectionApi {
    /// Serve `status` with a JSON `body` at `<base>/detect`
    pub async fn start(status: u16, body: &str) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            body: body.to_string(),
            requests: requests.clone(),
        };

        let app = Router::new().fallback(handle).with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}/detect", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedDetectionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn handle(State(state): State<MockState>, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    state.requests.lock().unwrap().push(RecordedDetectionRequest {
        path: uri.path().to_string(),
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        body: body.to_vec(),
    });

    (
        StatusCode::from_u16(state.status).unwrap(),
        [(CONTENT_TYPE, "application/json")],
        state.body,
    )
        .into_response()
}
