//! In-process mock of the portal gateway for HTTP tests.
//!
//! Binds an axum server on `127.0.0.1:0`, records every request
//! (method, path, headers, JSON body) and answers from scripted
//! responses keyed by `(method, path)`. Shuts down when dropped.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::sync::oneshot;

/// A request received by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    /// Parsed JSON body; `Null` when empty or not JSON.
    pub body: serde_json::Value,
}

impl RecordedCall {
    /// Header value by lowercase name.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_ascii_lowercase()).cloned()
    }
}

#[derive(Debug, Clone)]
struct Scripted {
    status: StatusCode,
    body: String,
    json: bool,
    delay: Option<Duration>,
}

#[derive(Default)]
struct MockState {
    routes: HashMap<(String, String), VecDeque<Scripted>>,
    calls: Vec<RecordedCall>,
}

type Shared = Arc<Mutex<MockState>>;

pub struct MockBackend {
    addr: std::net::SocketAddr,
    state: Shared,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::default()));
        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replace every scripted response for `(method, path)` with one JSON reply.
    pub fn respond(&self, method: &str, path: &str, status: StatusCode, body: serde_json::Value) {
        self.script(method, path, true, Scripted::json(status, body, None));
    }

    /// Same as `respond` with a non-JSON body.
    pub fn respond_text(&self, method: &str, path: &str, status: StatusCode, body: &str) {
        let scripted = Scripted {
            status,
            body: body.to_string(),
            json: false,
            delay: None,
        };
        self.script(method, path, true, scripted);
    }

    /// JSON reply held back by `delay` before it is sent.
    pub fn respond_delayed(
        &self,
        method: &str,
        path: &str,
        status: StatusCode,
        body: serde_json::Value,
        delay: Duration,
    ) {
        self.script(method, path, true, Scripted::json(status, body, Some(delay)));
    }

    /// Queue a further reply. Replies are consumed in order; the last one sticks.
    pub fn then_respond(&self, method: &str, path: &str, status: StatusCode, body: serde_json::Value) {
        self.script(method, path, false, Scripted::json(status, body, None));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().expect("mock state").calls.clone()
    }

    pub fn calls_to(&self, method: &str, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }

    fn script(&self, method: &str, path: &str, replace: bool, scripted: Scripted) {
        let mut state = self.state.lock().expect("mock state");
        let queue = state
            .routes
            .entry((method.to_string(), path.to_string()))
            .or_default();
        if replace {
            queue.clear();
        }
        queue.push_back(scripted);
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Scripted {
    fn json(status: StatusCode, body: serde_json::Value, delay: Option<Duration>) -> Self {
        Self {
            status,
            body: body.to_string(),
            json: true,
            delay,
        }
    }
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let call = RecordedCall {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers: headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect(),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    };

    let key = (call.method.clone(), call.path.clone());
    let scripted = {
        let mut guard = state.lock().expect("mock state");
        guard.calls.push(call);
        guard.routes.get_mut(&key).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        })
    };

    let Some(scripted) = scripted else {
        let body = serde_json::json!({ "message": format!("no mock for {} {}", key.0, key.1) });
        return (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response();
    };

    if let Some(delay) = scripted.delay {
        tokio::time::sleep(delay).await;
    }

    let content_type = if scripted.json { "application/json" } else { "text/html" };
    (
        scripted.status,
        [(header::CONTENT_TYPE, content_type)],
        scripted.body,
    )
        .into_response()
}

// ═══════════════════════════════════════════════════════════
// Fixtures
// ═══════════════════════════════════════════════════════════

/// Flat appointment DTO as the services return it.
pub fn appointment_json(id: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "patientId": "p1",
        "patientName": "Amina Benali",
        "patientEmail": "amina@example.org",
        "doctorId": "d1",
        "doctorName": "Dr Martin",
        "specialization": "Cardiologie",
        "appointmentDateTime": [2025, 1, 10, 9, 0],
        "appointmentType": "CONSULTATION",
        "reason": "checkup",
        "status": status
    })
}

pub fn appointment(id: &str, status: crate::models::AppointmentStatus) -> crate::models::Appointment {
    serde_json::from_value(appointment_json(id, status.as_str())).expect("fixture appointment")
}

/// `{success, message, data}` wrapper used by user-service.
pub fn envelope(data: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "success": true, "message": "OK", "data": data })
}
