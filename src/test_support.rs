//! Test helpers: a fake Billetweb API served on a loopback port.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::Mutex;

use crate::client::BilletwebClient;
use crate::domain::EventBus;
use crate::persistence::Store;

/// Scripted state of the fake API.
#[derive(Debug)]
pub struct FakeBilletweb {
    hits: AtomicUsize,
    last_authorization: Mutex<Option<String>>,
    response: Mutex<(StatusCode, String)>,
    delay: Mutex<Duration>,
}

impl FakeBilletweb {
    /// Replaces the scripted response.
    pub async fn respond(&self, status: StatusCode, body: serde_json::Value) {
        *self.response.lock().await = (status, body.to_string());
    }

    /// Replaces the scripted response with a raw (possibly non-JSON) body.
    pub async fn respond_raw(&self, status: StatusCode, body: &str) {
        *self.response.lock().await = (status, body.to_string());
    }

    /// Delays every response by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = delay;
    }

    /// Number of requests served so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// `Authorization` header of the last request.
    pub async fn last_authorization(&self) -> Option<String> {
        self.last_authorization.lock().await.clone()
    }
}

async fn attendees(State(fake): State<Arc<FakeBilletweb>>, headers: HeaderMap) -> impl IntoResponse {
    fake.hits.fetch_add(1, Ordering::SeqCst);
    *fake.last_authorization.lock().await = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let delay = *fake.delay.lock().await;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let (status, body) = fake.response.lock().await.clone();
    (status, [("content-type", "application/json")], body)
}

/// Serves a fake API answering `GET /api/attendees` with `body`.
///
/// Returns the base URL (ending in `/api`) and the scripted state.
///
/// # Panics
///
/// Panics if no loopback port can be bound.
#[allow(clippy::panic)]
pub async fn spawn_fake_billetweb(body: serde_json::Value) -> (String, Arc<FakeBilletweb>) {
    let fake = Arc::new(FakeBilletweb {
        hits: AtomicUsize::new(0),
        last_authorization: Mutex::new(None),
        response: Mutex::new((StatusCode::OK, body.to_string())),
        delay: Mutex::new(Duration::ZERO),
    });
    let app = Router::new()
        .route("/api/attendees", get(attendees))
        .with_state(Arc::clone(&fake));

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("cannot bind loopback port");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener has no address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/api"), fake)
}

/// Builds a client for `base_url` with a short timeout.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[allow(clippy::panic)]
pub fn client(base_url: &str) -> BilletwebClient {
    let Ok(client) = BilletwebClient::new(base_url, Duration::from_secs(5)) else {
        panic!("client build failed");
    };
    client
}

/// In-memory store with the default log capacity.
pub fn memory_store() -> Arc<Store> {
    Arc::new(Store::in_memory(EventBus::new(64), 1000))
}

/// Two attendees with a nested `custom` object and status codes.
pub fn sample_payload() -> serde_json::Value {
    serde_json::json!([
        {
            "id": "1001",
            "firstname": "Ada",
            "name": "Lovelace",
            "email": "ada@example.com",
            "event": "77",
            "event_name": "Conf 2026",
            "order_paid": "1",
            "custom": {"phone": "0600000001"}
        },
        {
            "id": "1002",
            "firstname": "Alan",
            "name": "Turing",
            "email": "alan@example.org",
            "event": "77",
            "event_name": "Conf 2026",
            "order_paid": "0",
            "used": "2"
        }
    ])
}
