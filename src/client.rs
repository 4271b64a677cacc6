use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::RequestResult;
use crate::executor::RequestExecutor;
use crate::identity::{AuthApi, Bootstrapper, SharedSession};
use crate::storage::{FileKv, KvBackend, SessionStore};
use crate::transport::{HttpTransport, ReqwestTransport};

/// Wires store, transport, executor, bootstrapper and auth API together.
pub struct HrmsClient {
    pub executor: RequestExecutor,
    pub bootstrap: Bootstrapper,
    pub auth: AuthApi,
}

impl HrmsClient {
    pub fn new(transport: Arc<dyn HttpTransport>, backend: Arc<dyn KvBackend>) -> Self {
        let executor = RequestExecutor::new(transport, SessionStore::new(backend), SharedSession::new());
        Self {
            bootstrap: Bootstrapper::new(executor.clone()),
            auth: AuthApi::new(executor.clone()),
            executor,
        }
    }

    /// File-backed session under `cfg.session_dir`, reqwest transport to `cfg.base_url`.
    pub fn from_config(cfg: &ClientConfig) -> RequestResult<Self> {
        let transport = ReqwestTransport::from_config(cfg)?;
        let backend = FileKv::open(&cfg.session_dir)?;
        Ok(Self::new(Arc::new(transport), Arc::new(backend)))
    }
}
