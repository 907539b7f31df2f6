/*
[INPUT]:  HTTP configuration (environment, timeouts, API key)
[OUTPUT]: Raw response bytes or structured API errors
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{Span, debug, info_span, warn};

use super::error::{HypheError, Result, TOO_MANY_REQUESTS};
use crate::types::Environment;
use crate::ws::HypheWebSocket;

const BODY_LOG_MAX_BYTES: usize = 1024;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub environment: Environment,
    /// Log every response body at debug level for this client only
    pub log_responses: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            environment: Environment::Production,
            log_responses: false,
        }
    }
}

/// Error body returned by the venue on non-2xx responses
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default, rename = "error")]
    message: Option<String>,
    #[serde(default)]
    errors: Option<HashMap<String, serde_json::Value>>,
}

/// Main HTTP client for the Hyphe API
#[derive(Debug)]
pub struct HypheClient {
    http_client: Client,
    base_url: Url,
    api_key: Option<String>,
    config: ClientConfig,
    span: Span,
}

impl HypheClient {
    /// Create a new client with default configuration
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(ClientConfig::default(), Some(api_key.into()))
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig, api_key: Option<String>) -> Result<Self> {
        let base_url = config.environment.rest_url();
        Self::with_config_and_base_url(config, api_key, base_url)
    }

    /// Create a client pointed at an explicit REST base URL
    pub fn with_config_and_base_url(
        config: ClientConfig,
        api_key: Option<String>,
        base_url: &str,
    ) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        let span = info_span!("hyphe_client", environment = ?config.environment);

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
            api_key: api_key.filter(|key| !key.is_empty()),
            config,
            span,
        })
    }

    /// Switch to the sandbox deployment
    pub fn sandbox(&mut self) -> Result<()> {
        self.config.environment = Environment::Sandbox;
        self.base_url = Url::parse(Environment::Sandbox.rest_url())?;
        self.span = info_span!("hyphe_client", environment = ?self.config.environment);
        Ok(())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Streaming client sharing this client's credential and environment
    pub fn websocket(&self) -> Result<HypheWebSocket> {
        HypheWebSocket::for_environment(self.config.environment, self.api_key.clone())
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| HypheError::Config("no api key specified".to_string()))
    }

    /// Base URL carries a path prefix (`/v1`), so endpoints are appended, not joined
    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{endpoint}"))?)
    }

    pub(crate) fn authorized_request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let api_key = self.api_key()?;
        let url = self.endpoint_url(endpoint)?;
        Ok(self
            .http_client
            .request(method, url)
            .bearer_auth(api_key)
            .header(CONTENT_TYPE, "application/json"))
    }

    /// GET an endpoint and return the raw body
    pub async fn get(&self, endpoint: &str) -> Result<Vec<u8>> {
        let builder = self.authorized_request(Method::GET, endpoint)?;
        self.execute(builder).await
    }

    /// POST a JSON body to an endpoint and return the raw body
    pub async fn post<T: Serialize + ?Sized>(&self, endpoint: &str, request: &T) -> Result<Vec<u8>> {
        let builder = self.authorized_request(Method::POST, endpoint)?;
        let body = serde_json::to_vec(request)?;
        self.execute(builder.body(body)).await
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let bytes = self.execute(builder).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Vec<u8>> {
        let request = builder.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self.http_client.execute(request).await?;
        let status = response.status();
        let bytes = response.bytes().await?.to_vec();

        if self.config.log_responses {
            let _entered = self.span.enter();
            debug!(
                %method,
                path = %path,
                status = status.as_u16(),
                bytes = bytes.len(),
                body = %truncate_for_log(&String::from_utf8_lossy(&bytes), BODY_LOG_MAX_BYTES),
                "http response"
            );
        }

        if status.as_u16() >= 300 {
            let err = api_error_from_response(status, &bytes);
            let _entered = self.span.enter();
            warn!(%method, path = %path, status = status.as_u16(), error = %err, "http request rejected");
            return Err(err);
        }

        Ok(bytes)
    }
}

/// Map a non-2xx response onto `HypheError::Api`.
///
/// 429 without a server message becomes [`TOO_MANY_REQUESTS`]. A body that is
/// not the venue's JSON error shape is kept verbatim as the message.
pub(crate) fn api_error_from_response(status: StatusCode, body: &[u8]) -> HypheError {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();

    let parsed = if trimmed.is_empty() {
        ApiErrorBody::default()
    } else {
        match serde_json::from_str::<ApiErrorBody>(trimmed) {
            Ok(parsed) => parsed,
            Err(_) => ApiErrorBody {
                message: Some(trimmed.to_string()),
                errors: None,
            },
        }
    };

    let message = match parsed.message.filter(|message| !message.is_empty()) {
        Some(message) => message,
        None if status == StatusCode::TOO_MANY_REQUESTS => TOO_MANY_REQUESTS.to_string(),
        None => status.canonical_reason().unwrap_or_default().to_lowercase(),
    };

    HypheError::Api {
        code: status.as_u16(),
        message,
        errors: parsed.errors.unwrap_or_default(),
    }
}

pub(crate) fn truncate_for_log(value: &str, max_len: usize) -> String {
    if value.len() <= max_len {
        return value.to_string();
    }
    let mut end = max_len;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = String::with_capacity(end + 3);
    out.push_str(&value[..end]);
    out.push_str("...");
    out
}
