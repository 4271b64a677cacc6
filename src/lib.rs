pub mod error;
pub mod config;
pub mod storage;
pub mod identity;
pub mod transport;
pub mod executor;
pub mod client;
pub mod cli;

pub use client::HrmsClient;
pub use config::ClientConfig;
pub use error::{RequestError, RequestResult, StoreError};
pub use executor::{RequestExecutor, Response};
pub use identity::{AuthApi, Bootstrapper, BootstrapOutcome, CredentialPair, Identity, Navigation, Route, Session, SharedSession};
pub use storage::{FileKv, KvBackend, MemoryKv, SessionStore, StoredSession};
pub use transport::{HttpRequest, HttpTransport, Method, RawResponse, RequestBody, ReqwestTransport};
