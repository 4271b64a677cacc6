use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::principal::Identity;

/// Access token plus the long-lived refresh token that mints new pairs.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
    }
}

// Tokens stay out of logs and panic messages.
impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Credentials together with the identity they were issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub credentials: CredentialPair,
    pub identity: Identity,
}

impl Session {
    pub fn new(credentials: CredentialPair, identity: Identity) -> Self {
        Self { credentials, identity }
    }
}

/// In-memory copy of the current session, shared between the bootstrapper,
/// the request executor and the auth API. Either a whole `Session` or nothing.
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SharedSession {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self) -> Option<Session> { self.inner.read().clone() }

    pub fn is_present(&self) -> bool { self.inner.read().is_some() }

    pub fn access_token(&self) -> Option<String> {
        self.inner.read().as_ref().map(|s| s.credentials.access_token.clone())
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.read().as_ref().map(|s| s.identity.clone())
    }

    pub fn set(&self, session: Session) {
        debug!(target: "hrms::session", "session set user_id={} role={}", session.identity.id, session.identity.role);
        *self.inner.write() = Some(session);
    }

    pub fn clear(&self) {
        if self.inner.write().take().is_some() {
            debug!(target: "hrms::session", "session cleared");
        }
    }
}
