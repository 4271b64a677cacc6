//! Shared fixtures: a scripted `HttpTransport` that records every call, and
//! identity/session builders.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use hrms_session::{
    CredentialPair, HttpRequest, HttpTransport, Identity, MemoryKv, Method, RawResponse, RequestError,
    RequestExecutor, RequestResult, Session, SessionStore, SharedSession,
};

#[derive(Clone)]
enum Reply {
    Http { status: u16, body: Vec<u8>, delay: Option<Duration> },
    NetworkDown,
}

/// Replies are queued per `METHOD path` and consumed in order. An exhausted
/// queue answers 599 so unexpected calls show up as test failures.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<HttpRequest>>,
}

fn key(method: Method, path: &str) -> String { format!("{} {}", method, path) }

impl ScriptedTransport {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.replies.lock().entry(key(method, path)).or_default().push_back(reply);
    }

    pub fn reply(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, Reply::Http { status, body: body.to_string().into_bytes(), delay: None });
    }

    pub fn reply_raw(&self, method: Method, path: &str, status: u16, body: &[u8]) {
        self.push(method, path, Reply::Http { status, body: body.to_vec(), delay: None });
    }

    pub fn reply_after(&self, delay: Duration, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, Reply::Http { status, body: body.to_string().into_bytes(), delay: Some(delay) });
    }

    pub fn network_down(&self, method: Method, path: &str) {
        self.push(method, path, Reply::NetworkDown);
    }

    pub fn calls(&self) -> Vec<HttpRequest> { self.calls.lock().clone() }

    pub fn calls_to(&self, path: &str) -> Vec<HttpRequest> {
        self.calls.lock().iter().filter(|c| c.path == path).cloned().collect()
    }

    pub fn count(&self, path: &str) -> usize { self.calls_to(path).len() }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, req: HttpRequest) -> RequestResult<RawResponse> {
        let k = key(req.method, &req.path);
        self.calls.lock().push(req);
        let next = self.replies.lock().get_mut(&k).and_then(|q| q.pop_front());
        match next {
            Some(Reply::Http { status, body, delay }) => {
                if let Some(d) = delay {
                    tokio::time::sleep(d).await;
                }
                Ok(RawResponse::new(status, body))
            }
            Some(Reply::NetworkDown) => Err(RequestError::Network("connection refused".into())),
            None => Ok(RawResponse::json(599, &json!({ "detail": format!("unscripted call {}", k) }))),
        }
    }
}

pub fn identity(id: i64, role: &str) -> Identity {
    Identity {
        id,
        username: Some(format!("user{}", id)),
        email: format!("user{}@example.com", id),
        role: role.to_string(),
        employee_id: if role == "employee" { Some(format!("EMP-{:03}", id)) } else { None },
        full_name: Some(format!("User {}", id)),
        department: None,
        is_active: true,
    }
}

pub fn identity_json(identity: &Identity) -> Value { serde_json::to_value(identity).unwrap() }

pub fn session(access: &str, refresh: &str, identity: Identity) -> Session {
    Session::new(CredentialPair::new(access, refresh), identity)
}

pub fn unauthorized() -> Value { json!({ "detail": "Could not validate credentials." }) }

pub fn refreshed(access: &str, refresh: &str) -> Value {
    json!({ "access_token": access, "refresh_token": refresh, "token_type": "bearer" })
}

pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub kv: MemoryKv,
    pub store: SessionStore,
    pub shared: SharedSession,
    pub executor: RequestExecutor,
}

impl Harness {
    pub fn new() -> Self {
        let transport = ScriptedTransport::new();
        let kv = MemoryKv::new();
        let store = SessionStore::new(Arc::new(kv.clone()));
        let shared = SharedSession::new();
        let executor = RequestExecutor::new(transport.clone(), store.clone(), shared.clone());
        Self { transport, kv, store, shared, executor }
    }

    /// Persist `s` and adopt it in memory, as after a login.
    pub fn logged_in(s: Session) -> Self {
        let h = Self::new();
        h.store.save(&s).unwrap();
        h.shared.set(s);
        h
    }
}
