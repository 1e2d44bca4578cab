#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use hamro_client::{Gateway, HamroClient};
use hamro_core::models::UserPublic;
use hamro_session::{MemoryStore, SessionStore};

// ---------------------------------------------------------------------------
// Recorded requests
// ---------------------------------------------------------------------------

/// One request as the stub backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

// ---------------------------------------------------------------------------
// Stub backend
// ---------------------------------------------------------------------------

type Routes = HashMap<(Method, String), (StatusCode, String)>;

#[derive(Default)]
struct StubState {
    routes: Mutex<Routes>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// In-process backend serving canned responses on `127.0.0.1:<random>`.
///
/// Unregistered routes answer `404 {"detail": "Not Found"}`.
pub struct StubBackend {
    pub base_url: String,
    state: Arc<StubState>,
}

impl StubBackend {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        let app = Router::new()
            .fallback(record_and_respond)
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Answer `method path` with `status` and a JSON body.
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: serde_json::Value) {
        self.respond_raw(method, path, status, body.to_string());
    }

    /// Answer `method path` with `status` and a literal body.
    pub fn respond_raw(&self, method: Method, path: &str, status: StatusCode, body: impl Into<String>) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), (status, body.into()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    /// The single recorded request to `path`.
    pub fn only_request_to(&self, path: &str) -> RecordedRequest {
        let matching: Vec<_> = self
            .requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect();
        assert_eq!(matching.len(), 1, "expected one request to {path}: {matching:?}");
        matching.into_iter().next().unwrap()
    }
}

async fn record_and_respond(State(state): State<Arc<StubState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let header = |name: HeaderName| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let recorded = RecordedRequest {
        method: parts.method.clone(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        authorization: header(AUTHORIZATION),
        content_type: header(CONTENT_TYPE),
        body: to_bytes(body, usize::MAX).await.unwrap_or_default().to_vec(),
    };
    let key = (recorded.method.clone(), recorded.path.clone());
    state.requests.lock().unwrap().push(recorded);

    let canned = state.routes.lock().unwrap().get(&key).cloned();
    let (status, body) = canned.unwrap_or((
        StatusCode::NOT_FOUND,
        serde_json::json!({"detail": "Not Found"}).to_string(),
    ));
    (status, [(CONTENT_TYPE, "application/json")], Body::from(body)).into_response()
}

// ---------------------------------------------------------------------------
// Dropping backend
// ---------------------------------------------------------------------------

/// Raw TCP backend that answers `POST /user/login/` with `token` and drops
/// every other connection without a response.
///
/// Returns the base URL and a counter of dropped requests.
pub async fn start_dropping_backend(token: &str) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let dropped = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&dropped);
    let login_body = serde_json::json!({"access_token": token, "token_type": "bearer"}).to_string();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let head = read_request(&mut stream).await.unwrap_or_default();
            if head.starts_with("POST /user/login/ ") {
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    login_body.len(),
                    login_body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            } else {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(stream);
            }
        }
    });

    (format!("http://{addr}"), dropped)
}

/// Read one HTTP/1.1 request (head and `Content-Length` body) and return
/// the head.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        if let Some(end) = find_head_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let wanted = end + 4 + content_length(&head);
            while buf.len() < wanted {
                let n = stream.read(&mut chunk).await?;
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            return Ok(head);
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(String::from_utf8_lossy(&buf).to_string());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Client helpers
// ---------------------------------------------------------------------------

/// Client against `base_url` with a fresh in-memory session. The returned
/// store shares the session's storage for reload checks.
pub fn client_for(base_url: &str) -> (HamroClient, MemoryStore) {
    let storage = MemoryStore::new();
    let session = SessionStore::initialize(Arc::new(storage.clone())).unwrap();
    let gateway = Gateway::new(reqwest::Client::new(), base_url, Arc::new(session)).unwrap();
    (HamroClient::new(gateway), storage)
}

pub fn citizen() -> UserPublic {
    UserPublic {
        id: "u-citizen".into(),
        name: Some("Sita Gurung".into()),
        phone: "9812345678".into(),
        admin: false,
        citizenship_num: None,
        district: Some("Kaski".into()),
        city: Some("Pokhara".into()),
        ward_num: Some(8),
    }
}

pub fn admin() -> UserPublic {
    UserPublic {
        id: "u-admin".into(),
        phone: "9841000000".into(),
        admin: true,
        ..citizen()
    }
}

pub fn user_json(user: &UserPublic) -> serde_json::Value {
    serde_json::to_value(user).unwrap()
}

/// Log `user` in locally without talking to the backend.
pub fn sign_in(client: &HamroClient, user: UserPublic, token: &str) {
    client.session().login_success(user, token).unwrap();
}

pub fn project_json(id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "created_at": "2024-01-10T08:30:00Z",
        "title": "Ward 8 drainage",
        "type": "Gov-funded",
        "ward_num": 8,
        "district": "Kaski",
        "city": "Pokhara",
        "contractor": "9841000000",
        "contractor_name": "Himal Builders",
        "total_budget": 500000.0,
        "budget_utilized": 120000.0,
        "fundraised": 0.0,
        "deadline": "2024-12-31T00:00:00Z",
        "status": "ongoing"
    })
}
