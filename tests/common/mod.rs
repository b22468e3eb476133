#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use clickpesa_relay::{
    database::{memory::InMemoryStore, store::PaymentStore},
    models::{
        payment::{PaymentLog, PaymentStatusUpdate},
        webhook::WebhookLog,
    },
    AppConfig, AppError, AppState, Result,
};

/// How the fake ClickPesa API answers.
#[derive(Clone)]
pub struct FakeBehavior {
    pub token_status: StatusCode,
    pub omit_token: bool,
    pub token_delay: Duration,
    pub push_status: StatusCode,
}

impl Default for FakeBehavior {
    fn default() -> Self {
        FakeBehavior {
            token_status: StatusCode::OK,
            omit_token: false,
            token_delay: Duration::ZERO,
            push_status: StatusCode::OK,
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeClickPesa {
    behavior: FakeBehavior,
    pub token_calls: Arc<AtomicUsize>,
    pub push_calls: Arc<AtomicUsize>,
    pub push_payloads: Arc<Mutex<Vec<Value>>>,
    pub push_auth_headers: Arc<Mutex<Vec<String>>>,
}

impl FakeClickPesa {
    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn push_calls(&self) -> usize {
        self.push_calls.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<Value> {
        self.push_payloads.lock().unwrap().last().cloned()
    }

    pub fn last_auth_header(&self) -> Option<String> {
        self.push_auth_headers.lock().unwrap().last().cloned()
    }
}

async fn fake_generate_token(State(fake): State<FakeClickPesa>, headers: HeaderMap) -> impl IntoResponse {
    let n = fake.token_calls.fetch_add(1, Ordering::SeqCst) + 1;

    if !fake.behavior.token_delay.is_zero() {
        tokio::time::sleep(fake.behavior.token_delay).await;
    }

    if headers.get("client-id").is_none() || headers.get("api-key").is_none() {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Missing credentials"})));
    }

    if fake.behavior.token_status != StatusCode::OK {
        return (fake.behavior.token_status, Json(json!({"message": "Invalid credentials"})));
    }

    if fake.behavior.omit_token {
        return (StatusCode::OK, Json(json!({"success": true})));
    }

    (StatusCode::OK, Json(json!({"success": true, "token": format!("token-{n}")})))
}

async fn fake_ussd_push(
    State(fake): State<FakeClickPesa>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    fake.push_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        fake.push_auth_headers.lock().unwrap().push(auth.to_string());
    }
    fake.push_payloads.lock().unwrap().push(payload.clone());

    if fake.behavior.push_status != StatusCode::OK {
        return (
            fake.behavior.push_status,
            Json(json!({"message": "Insufficient balance", "code": "PAYMENT_FAILED"})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "id": "PAY-0001",
            "status": "PROCESSING",
            "channel": "TIGO-PESA",
            "orderReference": payload["orderReference"],
            "collectedAmount": payload["amount"],
            "collectedCurrency": "TZS",
        })),
    )
}

/// Serves a fake ClickPesa API on an ephemeral port. Returns its base URL.
pub async fn spawn_fake_clickpesa(behavior: FakeBehavior) -> (String, FakeClickPesa) {
    let fake = FakeClickPesa {
        behavior,
        ..FakeClickPesa::default()
    };

    let app = Router::new()
        .route("/third-parties/generate-token", post(fake_generate_token))
        .route(
            "/third-parties/payments/initiate-ussd-push-request",
            post(fake_ussd_push),
        )
        .with_state(fake.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), fake)
}

pub fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        clickpesa_client_id: Some("test-client".to_string()),
        clickpesa_api_key: Some("test-key".to_string()),
        clickpesa_base_url: base_url.to_string(),
        clickpesa_timeout_secs: 5,
        ..AppConfig::default()
    }
}

/// App state wired to a fresh fake upstream and an in-memory store.
pub async fn test_state(behavior: FakeBehavior) -> (AppState, FakeClickPesa, Arc<InMemoryStore>) {
    let (base_url, fake) = spawn_fake_clickpesa(behavior).await;
    let store = Arc::new(InMemoryStore::new());
    let state = AppState::new(test_config(&base_url), store.clone()).unwrap();
    (state, fake, store)
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub fn post_raw(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Store whose writes fail while `down` is set. Successful writes are passed
/// to an in-memory store so tests can inspect them.
#[derive(Default)]
pub struct FlakyStore {
    pub down: AtomicBool,
    pub inner: InMemoryStore,
}

impl FlakyStore {
    pub fn failing() -> Self {
        FlakyStore {
            down: AtomicBool::new(true),
            inner: InMemoryStore::new(),
        }
    }

    pub fn recover(&self) {
        self.down.store(false, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(AppError::persistence("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for FlakyStore {
    async fn record_payment(&self, log: PaymentLog) -> Result<()> {
        self.check()?;
        self.inner.record_payment(log).await
    }

    async fn log_webhook(&self, log: WebhookLog) -> Result<()> {
        self.check()?;
        self.inner.log_webhook(log).await
    }

    async fn update_payment_status(&self, update: PaymentStatusUpdate) -> Result<u64> {
        self.check()?;
        self.inner.update_payment_status(update).await
    }

    async fn ping(&self) -> Result<()> {
        self.check()
    }

    fn backend(&self) -> &'static str {
        "flaky"
    }
}
