//!
//! hrms request executor
//! ---------------------
//! Runs one logical HTTP operation against the backend and renews the bearer
//! credential transparently when it has expired.
//!
//! Protocol for a single `execute` call:
//! 1. Send once with the current access token (or an explicit override).
//! 2. Any status other than 401 goes back to the caller verbatim.
//! 3. On 401 with a stored refresh token, renew through `POST /auth/refresh`.
//!    Renewal either persists the new pair or clears the session; it is
//!    complete before anything else happens.
//! 4. On success, retry the original request exactly once with the new token
//!    and return whatever comes back. A second 401 is never renewed again.
//!
//! Concurrent 401s share one in-flight renewal keyed by the refresh token being
//! exchanged, so a refresh token is never presented twice.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{extract_error_message, RequestError, RequestResult};
use crate::identity::{CredentialPair, Identity, Session, SharedSession};
use crate::storage::SessionStore;
use crate::transport::{HttpRequest, HttpTransport, Method, RawResponse, RequestBody};

pub const REFRESH_PATH: &str = "/auth/refresh";

/// A completed HTTP exchange, returned as-is for the caller to interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    body: Vec<u8>,
}

impl Response {
    pub fn status(&self) -> u16 { self.status }

    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }

    pub fn bytes(&self) -> &[u8] { &self.body }

    /// Error for non-2xx responses, using the body's error descriptor when present.
    pub fn error_for_status(&self) -> RequestResult<()> {
        if self.is_success() { Ok(()) } else { Err(RequestError::http(self.status, &self.body)) }
    }

    pub fn json<T: DeserializeOwned>(&self) -> RequestResult<T> {
        self.error_for_status()?;
        serde_json::from_slice(&self.body).map_err(|e| RequestError::Parse(e.to_string()))
    }

    /// Like `json`, but a 204 or empty body yields `None`.
    pub fn json_opt<T: DeserializeOwned>(&self) -> RequestResult<Option<T>> {
        self.error_for_status()?;
        if self.status == 204 || self.body.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(None);
        }
        serde_json::from_slice(&self.body).map(Some).map_err(|e| RequestError::Parse(e.to_string()))
    }
}

impl From<RawResponse> for Response {
    fn from(r: RawResponse) -> Self { Self { status: r.status, body: r.body } }
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    user: Option<Identity>,
}

type RenewalFuture = Shared<BoxFuture<'static, Result<CredentialPair, String>>>;

struct InFlightRenewal {
    refresh_token: String,
    fut: RenewalFuture,
}

struct Inner {
    transport: Arc<dyn HttpTransport>,
    store: SessionStore,
    session: SharedSession,
    in_flight: Mutex<Option<InFlightRenewal>>,
}

#[derive(Clone)]
pub struct RequestExecutor {
    inner: Arc<Inner>,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>, store: SessionStore, session: SharedSession) -> Self {
        Self { inner: Arc::new(Inner { transport, store, session, in_flight: Mutex::new(None) }) }
    }

    pub fn store(&self) -> &SessionStore { &self.inner.store }

    pub fn session(&self) -> &SharedSession { &self.inner.session }

    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        credential_override: Option<&str>,
    ) -> RequestResult<Response> {
        let bearer = credential_override
            .map(str::to_string)
            .or_else(|| self.inner.session.access_token())
            .or_else(|| self.inner.store.access_token());

        let first = self.send(method, path, body.clone(), bearer.clone()).await?;
        if first.status != 401 {
            return Ok(first);
        }

        let Some(refresh_token) = self.inner.store.refresh_token() else {
            debug!(target: "hrms::executor", "{} {} -> 401 with no refresh token; not renewing", method, path);
            return Ok(first);
        };

        let new_access = match (bearer.as_deref(), self.inner.store.access_token()) {
            // Another caller rotated the pair after this request went out.
            (Some(sent), Some(current)) if sent != current => {
                debug!(target: "hrms::executor", "{} {} -> 401 on a superseded token; retrying with current", method, path);
                current
            }
            _ => match self.renew(refresh_token).await {
                Ok(pair) => pair.access_token,
                Err(reason) => {
                    warn!(target: "hrms::executor", "{} {} -> 401 and renewal failed: {}", method, path, reason);
                    return Err(RequestError::SessionExpired { message: extract_error_message(401, &first.body) });
                }
            },
        };

        let retried = self.send(method, path, body, Some(new_access)).await?;
        if retried.status == 401 {
            warn!(target: "hrms::executor", "{} {} -> 401 after renewal; giving up", method, path);
        }
        Ok(retried)
    }

    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        credential_override: Option<&str>,
    ) -> RequestResult<T> {
        self.execute(method, path, body, credential_override).await?.json()
    }

    /// One exchange with no bearer and no renewal, for login and register.
    /// A 401 here means rejected credentials, not an expired token.
    pub async fn send_unauthenticated(&self, method: Method, path: &str, body: Option<RequestBody>) -> RequestResult<Response> {
        self.send(method, path, body, None).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<RequestBody>, bearer: Option<String>) -> RequestResult<Response> {
        let req = HttpRequest { method, path: path.to_string(), body, bearer };
        let resp = self.inner.transport.send(req).await.map_err(|e| {
            debug!(target: "hrms::executor", "{} {} transport failure: {}", method, path, e);
            e
        })?;
        debug!(target: "hrms::executor", "{} {} -> {}", method, path, resp.status);
        Ok(resp.into())
    }

    /// Join the renewal in flight for this refresh token, or start one.
    async fn renew(&self, refresh_token: String) -> Result<CredentialPair, String> {
        let fut = {
            let mut slot = self.inner.in_flight.lock();
            match slot.as_ref() {
                Some(f) if f.refresh_token == refresh_token => {
                    debug!(target: "hrms::executor", "joining in-flight renewal");
                    f.fut.clone()
                }
                _ => {
                    // A renewal that finished after this caller read its tokens has already
                    // spent `refresh_token`; adopt what it stored instead of exchanging again.
                    let stored = self.inner.store.refresh_token();
                    if stored.as_deref() != Some(refresh_token.as_str()) {
                        return match (self.inner.store.access_token(), stored) {
                            (Some(access), Some(refresh)) => {
                                debug!(target: "hrms::executor", "refresh token already rotated; adopting stored pair");
                                Ok(CredentialPair::new(access, refresh))
                            }
                            _ => Err("session cleared by a concurrent renewal".to_string()),
                        };
                    }
                    let fut = renew_and_persist(
                        self.inner.transport.clone(),
                        self.inner.store.clone(),
                        self.inner.session.clone(),
                        refresh_token.clone(),
                    )
                    .boxed()
                    .shared();
                    *slot = Some(InFlightRenewal { refresh_token: refresh_token.clone(), fut: fut.clone() });
                    fut
                }
            }
        };
        let out = fut.await;
        let mut slot = self.inner.in_flight.lock();
        if slot.as_ref().is_some_and(|f| f.refresh_token == refresh_token) {
            *slot = None;
        }
        out
    }
}

/// Exchange the refresh token and persist the outcome. On any failure the
/// session is cleared, durable and in-memory, before the error is returned.
async fn renew_and_persist(
    transport: Arc<dyn HttpTransport>,
    store: SessionStore,
    session: SharedSession,
    refresh_token: String,
) -> Result<CredentialPair, String> {
    let outcome = exchange_refresh_token(transport.as_ref(), refresh_token)
        .await
        .and_then(|renewed| persist_renewal(&store, &session, renewed));
    match outcome {
        Ok(pair) => {
            info!(target: "hrms::executor", "access token renewed");
            Ok(pair)
        }
        Err(reason) => {
            session.clear();
            if let Err(e) = store.clear() {
                warn!(target: "hrms::executor", "failed to clear session store after renewal failure: {}", e);
            }
            Err(reason)
        }
    }
}

async fn exchange_refresh_token(transport: &dyn HttpTransport, refresh_token: String) -> Result<RefreshResponse, String> {
    let req = HttpRequest {
        method: Method::Post,
        path: REFRESH_PATH.to_string(),
        body: Some(RequestBody::Json(serde_json::json!({ "refresh_token": refresh_token }))),
        bearer: None,
    };
    let resp = transport.send(req).await.map_err(|e| format!("refresh transport: {}", e))?;
    if !(200..300).contains(&resp.status) {
        return Err(format!("refresh rejected: {}", extract_error_message(resp.status, &resp.body)));
    }
    let parsed: RefreshResponse = serde_json::from_slice(&resp.body).map_err(|e| format!("refresh body: {}", e))?;
    if parsed.access_token.is_empty() || parsed.refresh_token.is_empty() {
        return Err("refresh body: empty token".to_string());
    }
    Ok(parsed)
}

fn persist_renewal(store: &SessionStore, session: &SharedSession, renewed: RefreshResponse) -> Result<CredentialPair, String> {
    let pair = CredentialPair::new(renewed.access_token, renewed.refresh_token);
    let known = session.identity().or_else(|| store.load().and_then(|s| s.identity));
    let identity = match (known, renewed.user) {
        (Some(known), Some(returned)) => {
            if !known.same_principal(&returned) {
                return Err(format!(
                    "refresh returned a different identity (id {} role {} -> id {} role {})",
                    known.id, known.role, returned.id, returned.role
                ));
            }
            Some(returned)
        }
        (known, returned) => returned.or(known),
    };
    match identity {
        Some(identity) => {
            let s = Session::new(pair.clone(), identity);
            store.save(&s).map_err(|e| format!("persist renewed session: {}", e))?;
            session.set(s);
        }
        None => {
            store.save_credentials(&pair).map_err(|e| format!("persist renewed credentials: {}", e))?;
        }
    }
    Ok(pair)
}
