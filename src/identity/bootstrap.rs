//! Startup reconstruction of the in-memory session from the durable store.
//!
//! Observers subscribe to an `AuthPhase` channel: it starts at `Loading` and
//! moves to `Resolved` exactly once. Nothing identity-dependent should render
//! before that transition.

use tokio::sync::{watch, OnceCell};
use tracing::{info, warn};

use super::principal::Identity;
use super::session::Session;
use crate::executor::RequestExecutor;
use crate::storage::StoredSession;
use crate::transport::Method;

pub const ME_PATH: &str = "/auth/me";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    LoggedIn(Session),
    LoggedOut,
}

impl BootstrapOutcome {
    pub fn session(&self) -> Option<&Session> {
        match self {
            BootstrapOutcome::LoggedIn(s) => Some(s),
            BootstrapOutcome::LoggedOut => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPhase {
    Loading,
    Resolved(BootstrapOutcome),
}

pub struct Bootstrapper {
    executor: RequestExecutor,
    outcome: OnceCell<BootstrapOutcome>,
    phase: watch::Sender<AuthPhase>,
}

impl Bootstrapper {
    pub fn new(executor: RequestExecutor) -> Self {
        let (phase, _) = watch::channel(AuthPhase::Loading);
        Self { executor, outcome: OnceCell::new(), phase }
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthPhase> { self.phase.subscribe() }

    pub fn phase(&self) -> AuthPhase { self.phase.borrow().clone() }

    /// Resolve the session. Runs the procedure on the first call only; later
    /// and concurrent calls get the same outcome.
    pub async fn run(&self) -> BootstrapOutcome {
        self.outcome
            .get_or_init(|| async {
                let outcome = self.resolve().await;
                match &outcome {
                    BootstrapOutcome::LoggedIn(s) => {
                        self.executor.session().set(s.clone());
                        info!(target: "hrms::bootstrap", "resolved: logged in user_id={} role={}", s.identity.id, s.identity.role);
                    }
                    BootstrapOutcome::LoggedOut => {
                        self.executor.session().clear();
                        info!(target: "hrms::bootstrap", "resolved: logged out");
                    }
                }
                self.phase.send_replace(AuthPhase::Resolved(outcome.clone()));
                outcome
            })
            .await
            .clone()
    }

    async fn resolve(&self) -> BootstrapOutcome {
        let store = self.executor.store();
        let Some(StoredSession { credentials, identity }) = store.load() else {
            return BootstrapOutcome::LoggedOut;
        };
        if let Some(identity) = identity {
            // Cached snapshot: adopt without a round trip.
            return BootstrapOutcome::LoggedIn(Session::new(credentials, identity));
        }

        let fetched = self
            .executor
            .execute_json::<Identity>(Method::Get, ME_PATH, None, Some(&credentials.access_token))
            .await;
        let identity = match fetched {
            Ok(identity) => identity,
            Err(e) => {
                warn!(target: "hrms::bootstrap", "identity fetch failed ({}); discarding stored session", e.code_str());
                self.discard();
                return BootstrapOutcome::LoggedOut;
            }
        };

        // The call may have renewed the pair; pair the identity with what is stored now.
        let Some(current) = store.load() else {
            warn!(target: "hrms::bootstrap", "credentials vanished during identity fetch");
            self.discard();
            return BootstrapOutcome::LoggedOut;
        };
        let session = Session::new(current.credentials, identity);
        if let Err(e) = store.save_identity(&session.identity) {
            warn!(target: "hrms::bootstrap", "failed to persist identity snapshot: {}", e);
            self.discard();
            return BootstrapOutcome::LoggedOut;
        }
        BootstrapOutcome::LoggedIn(session)
    }

    fn discard(&self) {
        if let Err(e) = self.executor.store().clear() {
            warn!(target: "hrms::bootstrap", "failed to clear session store: {}", e);
        }
    }
}
