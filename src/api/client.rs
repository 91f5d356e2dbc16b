use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::warn;

use crate::api::{chat, models, ApiError, ChatRequest, ModelInfo};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a request goes and how it authenticates. Captured from the settings
/// snapshot at submit time so later settings edits do not affect it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    pub api_key: String,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

/// The two operations the session needs from a server.
#[async_trait]
pub trait ApiBackend: Send + Sync {
    async fn list_models(&self, endpoint: &Endpoint) -> Result<Vec<ModelInfo>, ApiError>;

    async fn chat_completion(
        &self,
        endpoint: &Endpoint,
        request: &ChatRequest,
    ) -> Result<String, ApiError>;
}

/// [`ApiBackend`] over HTTP with a shared connection pool.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
}

impl HttpBackend {
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("parley/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ApiError::Internal {
                message: format!("failed to build HTTP client: {err}"),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ApiBackend for HttpBackend {
    async fn list_models(&self, endpoint: &Endpoint) -> Result<Vec<ModelInfo>, ApiError> {
        models::fetch_models(&self.client, endpoint).await
    }

    async fn chat_completion(
        &self,
        endpoint: &Endpoint,
        request: &ChatRequest,
    ) -> Result<String, ApiError> {
        chat::chat_completion(&self.client, endpoint, request).await
    }
}

/// Adds `Authorization: Bearer <key>` only when a key is configured.
pub(crate) fn authorize(request: RequestBuilder, api_key: &str) -> RequestBuilder {
    if api_key.is_empty() {
        request
    } else {
        request.header("Authorization", format!("Bearer {api_key}"))
    }
}

/// Returns the body of a 2xx response, or an [`ApiError::HttpStatus`].
pub(crate) async fn read_success_body(response: Response) -> Result<String, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "request failed");
        return Err(ApiError::http_status(status.as_u16(), &error_text));
    }
    Ok(response.text().await?)
}
