//! End to end over real HTTP: reqwest transport and file-backed store against
//! an in-process axum backend that mimics the HRMS auth endpoints.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use hrms_session::identity::ME_PATH;
use hrms_session::storage::IDENTITY_KEY;
use hrms_session::{BootstrapOutcome, FileKv, HrmsClient, KvBackend, Method, RequestBody, RequestError, ReqwestTransport};

struct Backend {
    access: Mutex<String>,
    refresh: Mutex<String>,
    generation: AtomicUsize,
    me_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    uploads: Mutex<Vec<(Option<String>, Vec<u8>)>>,
}

impl Backend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            access: Mutex::new(String::new()),
            refresh: Mutex::new(String::new()),
            generation: AtomicUsize::new(0),
            me_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
        })
    }

    fn issue(&self) -> Value {
        let n = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (a, r) = (format!("access-{}", n), format!("refresh-{}", n));
        *self.access.lock() = a.clone();
        *self.refresh.lock() = r.clone();
        json!({ "access_token": a, "refresh_token": r, "token_type": "bearer" })
    }

    /// Server-side expiry of the current access token.
    fn expire_access(&self) { *self.access.lock() = "expired".into(); }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.access.lock());
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(expected.as_str())
    }
}

fn user() -> Value {
    json!({
        "id": 1, "username": "admin", "email": "admin@example.com", "role": "admin",
        "employee_id": null, "full_name": "Admin", "is_active": true
    })
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Could not validate credentials." })))
}

async fn login(State(b): State<Arc<Backend>>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["username"] != "admin" || body["password"] != "secret1" {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Incorrect username or password." })));
    }
    let mut tokens = b.issue();
    tokens["user"] = user();
    (StatusCode::OK, Json(tokens))
}

async fn refresh(State(b): State<Arc<Backend>>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    b.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if body["refresh_token"].as_str() != Some(b.refresh.lock().as_str()) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Invalid refresh token." })));
    }
    (StatusCode::OK, Json(b.issue()))
}

async fn me(State(b): State<Arc<Backend>>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    b.me_calls.fetch_add(1, Ordering::SeqCst);
    if !b.authorized(&headers) {
        return unauthorized();
    }
    (StatusCode::OK, Json(user()))
}

async fn employees(State(b): State<Arc<Backend>>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !b.authorized(&headers) {
        return unauthorized();
    }
    (StatusCode::OK, Json(json!([{ "id": 1, "full_name": "Jane Doe" }])))
}

async fn import(State(b): State<Arc<Backend>>, headers: HeaderMap, body: Bytes) -> (StatusCode, Json<Value>) {
    if !b.authorized(&headers) {
        return unauthorized();
    }
    let content_type = headers.get("content-type").and_then(|v| v.to_str().ok()).map(str::to_string);
    b.uploads.lock().push((content_type, body.to_vec()));
    (StatusCode::CREATED, Json(json!({ "imported": 1 })))
}

async fn spawn_backend(b: Arc<Backend>) -> String {
    let app = Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/refresh", post(refresh))
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/employees", get(employees))
        .route("/api/v1/employees/import", post(import))
        .with_state(b);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/v1", addr)
}

fn client(base: &str, dir: &std::path::Path) -> HrmsClient {
    let transport = ReqwestTransport::new(base, Duration::from_secs(5)).unwrap();
    HrmsClient::new(Arc::new(transport), Arc::new(FileKv::open(dir).unwrap()))
}

#[tokio::test]
async fn login_renewal_and_restart_over_http() {
    let backend = Backend::new();
    let base = spawn_backend(backend.clone()).await;
    let dir = tempfile::tempdir().unwrap();

    let c = client(&base, dir.path());
    let s = c.auth.login("admin", "secret1").await.unwrap();
    assert_eq!(s.credentials.access_token, "access-1");

    backend.expire_access();
    let resp = c.executor.execute(Method::Get, "/employees", None, None).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);

    // A fresh process picks up the renewed pair and the cached identity.
    let restarted = client(&base, dir.path());
    let outcome = restarted.bootstrap.run().await;
    let session = outcome.session().cloned().unwrap();
    assert_eq!(session.credentials.access_token, "access-2");
    assert_eq!(session.identity.role, "admin");
    assert_eq!(backend.me_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_identity_file_is_refetched_at_startup() {
    let backend = Backend::new();
    let base = spawn_backend(backend.clone()).await;
    let dir = tempfile::tempdir().unwrap();

    client(&base, dir.path()).auth.login("admin", "secret1").await.unwrap();
    FileKv::open(dir.path()).unwrap().remove(IDENTITY_KEY).unwrap();

    let restarted = client(&base, dir.path());
    assert!(matches!(restarted.bootstrap.run().await, BootstrapOutcome::LoggedIn(_)));
    assert_eq!(backend.me_calls.load(Ordering::SeqCst), 1);
    assert!(FileKv::open(dir.path()).unwrap().get(IDENTITY_KEY).is_some());

    let again = client(&base, dir.path());
    again.bootstrap.run().await;
    assert_eq!(backend.me_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn revoked_refresh_token_logs_out_across_restart() {
    let backend = Backend::new();
    let base = spawn_backend(backend.clone()).await;
    let dir = tempfile::tempdir().unwrap();

    let c = client(&base, dir.path());
    c.auth.login("admin", "secret1").await.unwrap();
    backend.expire_access();
    *backend.refresh.lock() = "revoked".into();

    let err = c.executor.execute(Method::Get, "/employees", None, None).await.unwrap_err();
    assert!(matches!(err, RequestError::SessionExpired { .. }));

    let restarted = client(&base, dir.path());
    assert_eq!(restarted.bootstrap.run().await, BootstrapOutcome::LoggedOut);
    assert_eq!(backend.me_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn wrong_password_is_reported_with_server_detail() {
    let backend = Backend::new();
    let base = spawn_backend(backend.clone()).await;
    let dir = tempfile::tempdir().unwrap();

    let err = client(&base, dir.path()).auth.login("admin", "nope").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.message(), "Incorrect username or password.");
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let dir = tempfile::tempdir().unwrap();

    let c = client(&format!("http://{}/api/v1", addr), dir.path());
    let err = c.executor.execute(Method::Get, ME_PATH, None, Some("t")).await.unwrap_err();
    assert!(matches!(err, RequestError::Network(_)));
}

#[tokio::test]
async fn raw_upload_reaches_backend_byte_for_byte() {
    let backend = Backend::new();
    let base = spawn_backend(backend.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let c = client(&base, dir.path());
    c.auth.login("admin", "secret1").await.unwrap();
    backend.expire_access();

    let payload = b"--x\r\nContent-Disposition: form-data; name=\"file\"; filename=\"staff.csv\"\r\n\r\nid,name\n1,Jane\xff\r\n--x--\r\n".to_vec();
    let body = RequestBody::Raw { content_type: "multipart/form-data; boundary=x".into(), bytes: payload.clone() };
    let resp = c.executor.execute(Method::Post, "/employees/import", Some(body), None).await.unwrap();
    assert_eq!(resp.status(), 201);

    let uploads = backend.uploads.lock().clone();
    assert_eq!(uploads, vec![(Some("multipart/form-data; boundary=x".to_string()), payload)]);
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
}
