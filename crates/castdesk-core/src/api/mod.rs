//! HTTP client adapter.
//!
//! Wraps every outbound request: base URL, fixed timeout, and the bearer
//! token. The token is re-read from the token store on every call, never
//! cached, so a logout or a fresh login is visible to the next request.

mod error;
mod query;

use std::sync::Arc;
use std::time::{Duration, Instant};

pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use query::ListQuery;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::storage::TokenStore;

/// Standard User-Agent header for castdesk API requests.
pub const USER_AGENT: &str = concat!("castdesk/", env!("CARGO_PKG_VERSION"));

/// Whether a request carries the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Bearer,
    Anonymous,
}

/// REST client for the castdesk API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Creates a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        tokens: Arc<dyn TokenStore>,
    ) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::from_reqwest(&e))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            timeout,
            http,
            tokens,
        })
    }

    /// Creates a client from resolved configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn from_config(config: &Config, tokens: Arc<dyn TokenStore>) -> anyhow::Result<Self> {
        let base_url = config.effective_base_url()?;
        Ok(Self::new(base_url, config.request_timeout(), tokens)?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Authenticated GET with query parameters.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, or unexpected body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> ApiResult<T> {
        let value = self
            .send(Method::GET, path, query, None, Auth::Bearer)
            .await?;
        decode(path, value)
    }

    /// Authenticated POST with a JSON body.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, or unexpected body.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let body = encode(body)?;
        let value = self
            .send(Method::POST, path, &[], Some(body), Auth::Bearer)
            .await?;
        decode(path, value)
    }

    /// Unauthenticated POST (credential issuance, account creation).
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, or unexpected body.
    pub async fn post_public<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let body = encode(body)?;
        let value = self
            .send(Method::POST, path, &[], Some(body), Auth::Anonymous)
            .await?;
        decode(path, value)
    }

    /// Authenticated PUT with an optional JSON body.
    ///
    /// # Errors
    /// Returns an error on transport failure or non-2xx status.
    pub async fn put_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<Value> {
        let body = body.map(encode).transpose()?;
        self.send(Method::PUT, path, &[], body, Auth::Bearer).await
    }

    /// Authenticated DELETE.
    ///
    /// # Errors
    /// Returns an error on transport failure or non-2xx status.
    pub async fn delete(&self, path: &str) -> ApiResult<Value> {
        self.send(Method::DELETE, path, &[], None, Auth::Bearer)
            .await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<Value>,
        auth: Auth,
    ) -> ApiResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if auth == Auth::Bearer
            && let Some(token) = self.current_token()
        {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            let err = ApiError::from_reqwest(&e);
            warn!(%method, path, kind = %err.kind, "request failed: {err}");
            err
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            let err = ApiError::from_reqwest(&e);
            warn!(%method, path, kind = %err.kind, "reading response failed: {err}");
            err
        })?;
        debug!(
            %method,
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "api response"
        );

        if !status.is_success() {
            return Err(ApiError::http_status(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            warn!(path, "response is not JSON: {e}");
            ApiError::decode(format!("Invalid JSON from {path}: {e}"))
        })
    }

    fn current_token(&self) -> Option<String> {
        match self.tokens.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("failed to read stored token: {e:#}");
                None
            }
        }
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> ApiResult<Value> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::new(ApiErrorKind::Request, format!("Failed to encode body: {e}")))
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| {
        warn!(path, "unexpected response shape: {e}");
        ApiError::decode(format!("Unexpected response from {path}: {e}"))
    })
}
