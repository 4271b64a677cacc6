use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::bootstrap::ME_PATH;
use super::principal::Identity;
use super::session::{CredentialPair, Session};
use crate::error::{RequestError, RequestResult};
use crate::executor::RequestExecutor;
use crate::transport::{Method, RequestBody};

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const CHANGE_PASSWORD_PATH: &str = "/auth/change-password";

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub user: Identity,
}

fn default_token_type() -> String { "bearer".to_string() }

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Typed access to the `/auth/*` endpoints. Session-creating calls persist
/// to the store before updating the in-memory copy.
#[derive(Clone)]
pub struct AuthApi {
    executor: RequestExecutor,
}

impl AuthApi {
    pub fn new(executor: RequestExecutor) -> Self { Self { executor } }

    pub fn executor(&self) -> &RequestExecutor { &self.executor }

    pub fn current(&self) -> Option<Session> { self.executor.session().get() }

    /// Exchange username/password for a fresh session.
    pub async fn login(&self, username: &str, password: &str) -> RequestResult<Session> {
        let body = RequestBody::json(&LoginRequest { username: username.to_string(), password: password.to_string() })?;
        let resp = self.executor.send_unauthenticated(Method::Post, LOGIN_PATH, Some(body)).await?;
        let login: LoginResponse = resp.json()?;
        if !login.token_type.eq_ignore_ascii_case("bearer") {
            return Err(RequestError::Parse(format!("unsupported token type '{}'", login.token_type)));
        }
        let session = Session::new(CredentialPair::new(login.access_token, login.refresh_token), login.user);
        self.executor.store().save(&session)?;
        self.executor.session().set(session.clone());
        info!(target: "hrms::auth", "login ok user_id={} role={}", session.identity.id, session.identity.role);
        Ok(session)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, req: &RegisterRequest) -> RequestResult<Identity> {
        let body = RequestBody::json(req)?;
        self.executor.send_unauthenticated(Method::Post, REGISTER_PATH, Some(body)).await?.json()
    }

    /// Resolve the identity behind the current access token.
    pub async fn current_user(&self) -> RequestResult<Identity> {
        self.executor.execute_json(Method::Get, ME_PATH, None, None).await
    }

    /// Rotate the password. Tokens stay as they are.
    pub async fn change_password(&self, current_password: &str, new_password: &str) -> RequestResult<()> {
        let body = RequestBody::json(&ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        })?;
        self.executor
            .execute(Method::Post, CHANGE_PASSWORD_PATH, Some(body), None)
            .await?
            .error_for_status()
    }

    /// Drop the session locally. There is no server-side logout endpoint.
    pub fn logout(&self) -> RequestResult<()> {
        self.executor.session().clear();
        if let Err(e) = self.executor.store().clear() {
            warn!(target: "hrms::auth", "logout could not clear the session store: {}", e);
            return Err(e.into());
        }
        info!(target: "hrms::auth", "logged out");
        Ok(())
    }
}
