//! HTTP transport seam.
//! The executor speaks to the backend only through `HttpTransport`, which sends
//! one request and returns status plus body. `ReqwestTransport` is the real
//! implementation; tests substitute scripted fakes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Url;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{RequestError, RequestResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as JSON with `content-type: application/json`.
    Json(Value),
    /// Sent as-is, e.g. a multipart upload built by the caller.
    Raw { content_type: String, bytes: Vec<u8> },
}

impl RequestBody {
    pub fn json<T: serde::Serialize>(value: &T) -> RequestResult<Self> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|e| RequestError::Parse(format!("request body: {}", e)))
    }
}

/// One outgoing request, path relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<RequestBody>,
    pub bearer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self { Self { status, body: body.into() } }

    pub fn json(status: u16, value: &Value) -> Self { Self { status, body: value.to_string().into_bytes() } }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform exactly one exchange. Only transport-level failures are errors;
    /// every status code comes back as a `RawResponse`.
    async fn send(&self, req: HttpRequest) -> RequestResult<RawResponse>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(base: &str, timeout: Duration) -> RequestResult<Self> {
        let base = parse_base(base)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RequestError::Config(format!("http client: {}", e)))?;
        Ok(Self { base, client })
    }

    pub fn from_config(cfg: &ClientConfig) -> RequestResult<Self> {
        Self::new(&cfg.base_url, cfg.request_timeout)
    }

    fn url_for(&self, path: &str) -> RequestResult<Url> {
        // Paths are relative to the base, which may carry its own prefix (/api/v1).
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| RequestError::Config(format!("invalid path '{}': {}", path, e)))
    }
}

fn parse_base(base: &str) -> RequestResult<Url> {
    let mut s = base.trim().to_string();
    if !s.ends_with('/') { s.push('/'); }
    Url::parse(&s).map_err(|e| RequestError::Config(format!("invalid base URL '{}': {}", base, e)))
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, req: HttpRequest) -> RequestResult<RawResponse> {
        let url = self.url_for(&req.path)?;
        let mut headers = HeaderMap::new();
        if let Some(token) = req.bearer.as_deref() {
            let v = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| RequestError::Config("access token is not a valid header value".into()))?;
            headers.insert(AUTHORIZATION, v);
        }
        let mut builder = self.client.request(req.method.to_reqwest(), url);
        match req.body {
            Some(RequestBody::Json(v)) => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                builder = builder.body(v.to_string());
            }
            Some(RequestBody::Raw { content_type, bytes }) => {
                let ct = HeaderValue::from_str(&content_type)
                    .map_err(|_| RequestError::Config(format!("invalid content type '{}'", content_type)))?;
                headers.insert(CONTENT_TYPE, ct);
                builder = builder.body(bytes);
            }
            None => {}
        }
        let resp = builder.headers(headers).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }
}
