//! In-process fake of the Planet tasking API for tests: scripted replies, recorded calls.

use crate::{PollPolicy, Settings};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Path of the single job the fake hands out.
pub const JOB_PATH: &str = "/tasking/v2/imaging-windows/search/job-1";

/// How the fake answers a search submission.
#[derive(Debug, Clone)]
pub enum SubmitReply {
    /// 201 with `Location: /tasking/v2/imaging-windows/search/job-1`.
    RelativeLocation,
    /// 201 with an absolute `Location` on the fake's own address.
    AbsoluteLocation,
    /// 201 without a `Location` header.
    NoLocation,
    Error(u16, String),
}

/// One scripted poll response. The last scripted reply repeats forever.
#[derive(Debug, Clone)]
pub enum PollReply {
    Body(Value),
    Error(u16, String),
}

impl PollReply {
    pub fn running() -> Self {
        PollReply::Body(json!({ "status": "RUNNING" }))
    }

    pub fn done(imaging_windows: Value) -> Self {
        PollReply::Body(json!({ "status": "DONE", "imaging_windows": imaging_windows }))
    }

    pub fn failed(code: &str, message: &str) -> Self {
        PollReply::Body(json!({
            "status": "FAILED",
            "error_code": code,
            "error_message": message
        }))
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Option<Value>,
    pub at: Instant,
}

struct Script {
    submit: SubmitReply,
    polls: VecDeque<PollReply>,
    orders: HashMap<String, Value>,
    created_order: Option<Value>,
    products: Value,
}

struct FakeState {
    domain: String,
    script: Mutex<Script>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Fake vendor bound to an ephemeral localhost port; stopped on drop.
pub struct FakeVendor {
    addr: SocketAddr,
    state: Arc<FakeState>,
    server: JoinHandle<()>,
}

impl FakeVendor {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake vendor");
        let addr = listener.local_addr().expect("fake vendor address");
        let state = Arc::new(FakeState {
            domain: format!("http://{}", addr),
            script: Mutex::new(Script {
                submit: SubmitReply::RelativeLocation,
                polls: VecDeque::new(),
                orders: HashMap::new(),
                created_order: None,
                products: json!([]),
            }),
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route("/tasking/v2/imaging-windows/search", post(handle_submit))
            .route("/tasking/v2/imaging-windows/search/:job_id", get(handle_poll))
            .route("/tasking/v2/orders/", post(handle_create_order))
            .route("/tasking/v2/orders/:order_id", get(handle_get_order))
            .route("/tasking/v2/products", get(handle_products))
            .with_state(Arc::clone(&state));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app.into_make_service()).await;
        });
        Self {
            addr,
            state,
            server,
        }
    }

    pub fn domain(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn base_url(&self) -> String {
        format!("{}/tasking/v2", self.domain())
    }

    /// Settings pointing at the fake with the given poll interval and no poll budget.
    pub fn settings(&self, interval: Duration) -> Settings {
        let mut settings =
            Settings::with_urls(&self.domain(), &self.base_url()).expect("fake vendor urls");
        settings.poll = PollPolicy {
            interval,
            max_wait: None,
            max_polls: None,
        };
        settings
    }

    pub async fn set_submit(&self, reply: SubmitReply) {
        self.state.script.lock().await.submit = reply;
    }

    pub async fn push_poll(&self, reply: PollReply) {
        self.state.script.lock().await.polls.push_back(reply);
    }

    pub async fn put_order(&self, order_id: &str, order: Value) {
        self.state
            .script
            .lock()
            .await
            .orders
            .insert(order_id.to_string(), order);
    }

    pub async fn set_created_order(&self, order: Value) {
        self.state.script.lock().await.created_order = Some(order);
    }

    pub async fn set_products(&self, products: Value) {
        self.state.script.lock().await.products = products;
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().await.clone()
    }

    pub async fn calls(&self) -> usize {
        self.state.requests.lock().await.len()
    }
}

impl Drop for FakeVendor {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn record(state: &FakeState, method: &Method, uri: &Uri, headers: &HeaderMap, body: &[u8]) {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    state.requests.lock().await.push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        authorization,
        body: serde_json::from_slice(body).ok(),
        at: Instant::now(),
    });
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn handle_submit(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record(&state, &method, &uri, &headers, &body).await;
    let reply = state.script.lock().await.submit.clone();
    let accepted = Json(json!({ "id": "job-1", "status": "PENDING" }));
    match reply {
        SubmitReply::RelativeLocation => {
            (StatusCode::CREATED, [(header::LOCATION, JOB_PATH.to_string())], accepted)
                .into_response()
        }
        SubmitReply::AbsoluteLocation => {
            let location = format!("{}{}", state.domain, JOB_PATH);
            (StatusCode::CREATED, [(header::LOCATION, location)], accepted).into_response()
        }
        SubmitReply::NoLocation => (StatusCode::CREATED, accepted).into_response(),
        SubmitReply::Error(code, text) => (status(code), text).into_response(),
    }
}

async fn handle_poll(
    State(state): State<Arc<FakeState>>,
    Path(_job_id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&state, &method, &uri, &headers, &[]).await;
    let reply = {
        let mut script = state.script.lock().await;
        if script.polls.len() > 1 {
            script.polls.pop_front()
        } else {
            script.polls.front().cloned()
        }
    };
    match reply.unwrap_or_else(PollReply::running) {
        PollReply::Body(body) => (StatusCode::OK, Json(body)).into_response(),
        PollReply::Error(code, text) => (status(code), text).into_response(),
    }
}

async fn handle_get_order(
    State(state): State<Arc<FakeState>>,
    Path(order_id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&state, &method, &uri, &headers, &[]).await;
    match state.script.lock().await.orders.get(&order_id) {
        Some(order) => (StatusCode::OK, Json(order.clone())).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" }))).into_response(),
    }
}

async fn handle_create_order(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    record(&state, &method, &uri, &headers, &body).await;
    match state.script.lock().await.created_order.clone() {
        Some(order) => (StatusCode::CREATED, Json(order)).into_response(),
        None => (StatusCode::BAD_REQUEST, "no order scripted").into_response(),
    }
}

async fn handle_products(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    record(&state, &method, &uri, &headers, &[]).await;
    let products = state.script.lock().await.products.clone();
    (StatusCode::OK, Json(products)).into_response()
}
