use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/v1";
pub const DEFAULT_SESSION_DIR: &str = ".hrms";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Client settings, read from `HRMS_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub session_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            session_dir: PathBuf::from(DEFAULT_SESSION_DIR),
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary variable source; unset or blank values keep defaults.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Self {
        let get = |k: &str| get(k).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();
        if let Some(v) = get("HRMS_API_BASE_URL") { cfg.base_url = v.trim().to_string(); }
        if let Some(v) = get("HRMS_SESSION_DIR") { cfg.session_dir = PathBuf::from(v); }
        if let Some(ms) = get("HRMS_REQUEST_TIMEOUT_MS").and_then(|v| v.trim().parse::<u64>().ok()) {
            cfg.request_timeout = Duration::from_millis(ms);
        }
        cfg
    }
}
