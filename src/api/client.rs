//! HTTP client with auth header injection and GET response caching.
//!
//! Every request goes through `ApiClient::request`, which:
//! - serves fresh cached GET responses without touching the network,
//! - attaches `Authorization: Bearer <access>` unless the URL is public,
//! - stores successful (200) GET responses in the cache,
//! - clears the cache and the stored tokens on any 401.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::multipart::Form;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::cache::{CacheEntry, ResponseCache};
use super::error::{ApiError, ErrorBody};
use crate::config::ClientConfig;
use crate::state::ClientState;

/// URL fragments that must never carry the bearer token (substring match).
pub const PUBLIC_ENDPOINTS: &[&str] = &[
    "/auth/login/",
    "/auth/register/",
    "/auth/google/",
    "/admin_app/verify-invite/",
    "/admin_app/accept-invite/",
];

/// Whether a request URL targets a public endpoint.
pub fn is_public(url: &str) -> bool {
    PUBLIC_ENDPOINTS.iter().any(|endpoint| url.contains(endpoint))
}

/// Request payload.
#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(Form),
}

impl RequestBody {
    /// Serialize any value into a JSON body.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_value(value)
            .map(RequestBody::Json)
            .map_err(|e| ApiError::Unexpected(format!("Failed to encode request body: {}", e)))
    }
}

/// Per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Replaces the client's default timeout.
    pub timeout: Option<Duration>,
    /// Neither read from nor write to the response cache.
    pub bypass_cache: bool,
    /// Value for the `Accept` header.
    pub accept: Option<String>,
}

impl RequestOptions {
    pub fn timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    /// Uncached binary download with the given timeout.
    pub fn download(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            bypass_cache: true,
            accept: Some("application/octet-stream".to_string()),
        }
    }

    pub fn uncached() -> Self {
        Self {
            bypass_cache: true,
            ..Self::default()
        }
    }
}

/// A successful response, from the network or from the cache.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    /// Header names are lowercase. Cached responses carry the headers stored
    /// with the entry, not regenerated ones.
    pub headers: HashMap<String, String>,
    pub from_cache: bool,
    body: Vec<u8>,
}

impl ApiResponse {
    fn from_cache(entry: CacheEntry) -> Self {
        Self {
            status: 200,
            headers: entry.headers,
            from_cache: true,
            body: entry.data,
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::Unexpected(format!("Failed to parse response: {}", e)))
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

/// HTTP client for the paperwork API.
///
/// Owns no session data itself: the cache and tokens live in the shared
/// `ClientState` passed in at construction.
pub struct ApiClient {
    client: Client,
    base_url: String,
    default_timeout: Duration,
    state: Arc<ClientState>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, state: Arc<ClientState>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_timeout: config.default_timeout,
            state,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn state(&self) -> &Arc<ClientState> {
        &self.state
    }

    /// Current access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.state.tokens.get()
    }

    /// Absolute URL for a path; absolute URLs pass through unchanged.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url, url)
        }
    }

    /// Drop cached responses matching each prefix.
    pub fn invalidate(&self, prefixes: &[&str]) {
        for prefix in prefixes {
            self.state.cache.invalidate(prefix);
        }
    }

    /// Send a request.
    ///
    /// `url` is used verbatim in the cache key, so callers must pass the same
    /// form (relative path or absolute URL) for the same resource.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, &str)],
        body: RequestBody,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let cache_key = (method == Method::GET && !options.bypass_cache)
            .then(|| ResponseCache::key(method.as_str(), url, params));

        if let Some(key) = &cache_key {
            if let Some(entry) = self.state.cache.get(key) {
                log::debug!("Cache hit: {}", key);
                return Ok(ApiResponse::from_cache(entry));
            }
            log::debug!("Cache miss: {}", key);
        }

        let mut builder = self
            .client
            .request(method.clone(), self.resolve_url(url))
            .timeout(options.timeout.unwrap_or(self.default_timeout));

        if !params.is_empty() {
            builder = builder.query(params);
        }
        if !is_public(url) {
            if let Some(token) = self.state.tokens.get() {
                builder = builder.bearer_auth(token);
            }
        }
        if let Some(accept) = &options.accept {
            builder = builder.header(ACCEPT, accept.as_str());
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let headers = header_map(resp.headers());
        let payload = resp.bytes().await;

        if status == 401 {
            log::warn!("{} {} returned 401, clearing cache and tokens", method, url);
            self.state.reset();
            let body = payload
                .map(|b| ErrorBody::from_bytes(&b))
                .unwrap_or_default();
            return Err(ApiError::Auth { body });
        }

        let body = payload?.to_vec();
        if !(200..300).contains(&status) {
            return Err(ApiError::from_status(status, ErrorBody::from_bytes(&body)));
        }

        if let Some(key) = cache_key {
            if status == 200 {
                log::debug!("Cache store: {}", key);
                self.state.cache.put(&key, body.clone(), headers.clone());
            }
        }

        Ok(ApiResponse {
            status,
            headers,
            from_cache: false,
            body,
        })
    }

    /// GET with default options.
    pub async fn get(&self, url: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::GET, url, &[], RequestBody::Empty, RequestOptions::default())
            .await
    }

    pub async fn get_with(
        &self,
        url: &str,
        params: &[(&str, &str)],
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::GET, url, params, RequestBody::Empty, options)
            .await
    }

    /// POST a JSON body.
    pub async fn post<T: Serialize>(&self, url: &str, body: &T) -> Result<ApiResponse, ApiError> {
        self.request(
            Method::POST,
            url,
            &[],
            RequestBody::json(body)?,
            RequestOptions::default(),
        )
        .await
    }

    /// POST without a body.
    pub async fn post_empty(&self, url: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::POST, url, &[], RequestBody::Empty, RequestOptions::default())
            .await
    }

    /// PATCH a JSON body.
    pub async fn patch<T: Serialize>(&self, url: &str, body: &T) -> Result<ApiResponse, ApiError> {
        self.request(
            Method::PATCH,
            url,
            &[],
            RequestBody::json(body)?,
            RequestOptions::default(),
        )
        .await
    }

    /// POST a multipart form (file uploads).
    pub async fn post_multipart(
        &self,
        url: &str,
        form: Form,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        self.request(Method::POST, url, &[], RequestBody::Multipart(form), options)
            .await
    }
}
