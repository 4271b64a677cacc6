//!
//! hrms session store
//! ------------------
//! Durable persistence of the current credential pair and a cached identity
//! snapshot under three fixed keys. The store is the only owner of the durable
//! copy; everything else reads and writes through it.
//!
//! Write ordering: the identity key is removed before the tokens are written
//! and re-written last. A write interrupted part way leaves tokens without an
//! identity, which `load` reports as "credentials only" and the bootstrapper
//! resolves with a remote identity fetch. Tokens are never paired with an
//! identity that was not saved alongside them.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::identity::{CredentialPair, Identity, Session};

pub mod kv;

pub use kv::{FileKv, KvBackend, MemoryKv};

pub const ACCESS_TOKEN_KEY: &str = "hrms_token";
pub const REFRESH_TOKEN_KEY: &str = "hrms_refresh_token";
pub const IDENTITY_KEY: &str = "hrms_user";

/// Result of `SessionStore::load`: credentials, and the cached identity when
/// one was present and well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub credentials: CredentialPair,
    pub identity: Option<Identity>,
}

impl StoredSession {
    pub fn into_session(self) -> Option<Session> {
        let StoredSession { credentials, identity } = self;
        identity.map(|identity| Session::new(credentials, identity))
    }
}

#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KvBackend>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self { Self { backend } }

    pub fn in_memory() -> Self { Self::new(Arc::new(MemoryKv::new())) }

    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        let identity_json = serde_json::to_string(&session.identity)?;
        self.write_credentials(&session.credentials)?;
        self.backend.set(IDENTITY_KEY, &identity_json)?;
        debug!(target: "hrms::store", "saved session user_id={}", session.identity.id);
        Ok(())
    }

    /// Persist a credential pair with no identity snapshot.
    pub fn save_credentials(&self, credentials: &CredentialPair) -> Result<(), StoreError> {
        self.write_credentials(credentials)?;
        debug!(target: "hrms::store", "saved credentials without identity");
        Ok(())
    }

    /// Rewrite only the identity snapshot, for tokens already stored.
    pub fn save_identity(&self, identity: &Identity) -> Result<(), StoreError> {
        let identity_json = serde_json::to_string(identity)?;
        self.backend.set(IDENTITY_KEY, &identity_json)
    }

    fn write_credentials(&self, credentials: &CredentialPair) -> Result<(), StoreError> {
        self.backend.remove(IDENTITY_KEY)?;
        self.backend.set(ACCESS_TOKEN_KEY, &credentials.access_token)?;
        self.backend.set(REFRESH_TOKEN_KEY, &credentials.refresh_token)?;
        Ok(())
    }

    pub fn load(&self) -> Option<StoredSession> {
        let access_token = non_empty(self.backend.get(ACCESS_TOKEN_KEY))?;
        let refresh_token = non_empty(self.backend.get(REFRESH_TOKEN_KEY))?;
        let identity = match self.backend.get(IDENTITY_KEY) {
            None => None,
            Some(raw) => match serde_json::from_str::<Identity>(&raw) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    warn!(target: "hrms::store", "discarding corrupt identity snapshot: {}", e);
                    // Best-effort: the entry is ignored either way.
                    if let Err(e) = self.backend.remove(IDENTITY_KEY) {
                        debug!(target: "hrms::store", "could not remove corrupt identity snapshot: {}", e);
                    }
                    None
                }
            },
        };
        Some(StoredSession { credentials: CredentialPair { access_token, refresh_token }, identity })
    }

    pub fn access_token(&self) -> Option<String> { non_empty(self.backend.get(ACCESS_TOKEN_KEY)) }

    pub fn refresh_token(&self) -> Option<String> { non_empty(self.backend.get(REFRESH_TOKEN_KEY)) }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend.remove(ACCESS_TOKEN_KEY)?;
        self.backend.remove(REFRESH_TOKEN_KEY)?;
        self.backend.remove(IDENTITY_KEY)?;
        debug!(target: "hrms::store", "cleared session keys");
        Ok(())
    }
}

fn non_empty(v: Option<String>) -> Option<String> { v.filter(|s| !s.is_empty()) }
