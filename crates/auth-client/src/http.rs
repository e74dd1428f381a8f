//! HTTP transport for the auth service
//!
//! This module provides request/response types, transport error handling and
//! the reqwest-backed client used by `RemoteAuthGateway`. Endpoints speak JSON
//! and report failures as `{ "code": ..., "message": ... }` bodies.

use reqwest::Method;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::ClientConfig;

// =============================================================================
// Error Types
// =============================================================================

/// Transport-level error with HTTP status and server-provided details
///
/// Status `0` marks failures that never produced an HTTP response (connection
/// errors, timeouts) or a response that could not be decoded.
///
/// # Examples
/// ```
/// use auth_client::http::HttpError;
///
/// let error = HttpError::new(401, Some("INVALID_EMAIL_OR_PASSWORD".into()), Some("Invalid email or password".into()));
/// assert_eq!(error.status(), 401);
/// assert!(!error.is_network_error());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    /// HTTP status code
    status: u16,
    /// Machine-readable error code (e.g., "USER_ALREADY_EXISTS")
    code: Option<String>,
    /// Human-readable error message from the server
    message: Option<String>,
    /// Diagnostic detail that is not meant for users
    detail: Option<String>,
}

impl HttpError {
    /// Create a new HTTP error
    pub fn new(status: u16, code: Option<String>, message: Option<String>) -> Self {
        Self { status, code, message, detail: None }
    }

    /// Transport failure before any response arrived
    pub fn transport(detail: impl Into<String>) -> Self {
        Self {
            status: 0,
            code: Some("NETWORK_ERROR".to_string()),
            message: None,
            detail: Some(detail.into()),
        }
    }

    /// Response arrived but could not be decoded
    pub fn decode(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            code: Some("PARSE_ERROR".to_string()),
            message: None,
            detail: Some(detail.into()),
        }
    }

    /// Get the HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the error code
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Get the server-provided message
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Get the diagnostic detail
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Whether the body could not be decoded
    pub fn is_decode_error(&self) -> bool {
        self.code() == Some("PARSE_ERROR")
    }

    /// Check if this is a network-class failure
    ///
    /// Network failure statuses: 0 (no response), 408, 425, 429, 502, 503, 504, 522, 524
    pub fn is_network_error(&self) -> bool {
        if self.status == 0 {
            return !self.is_decode_error();
        }
        matches!(self.status, 408 | 425 | 429 | 502 | 503 | 504 | 522 | 524)
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "HTTP error {}: {} - {}",
            self.status,
            self.code.as_deref().unwrap_or("UNKNOWN"),
            self.message
                .as_deref()
                .or(self.detail.as_deref())
                .unwrap_or("no message")
        )
    }
}

impl std::error::Error for HttpError {}

/// Standard error body returned by the auth service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error code
    #[serde(default)]
    pub code: Option<String>,
    /// Error message
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Requests
// =============================================================================

/// A call to one auth endpoint
///
/// Only two verbs are needed: session lookups are `GET`, every mutating auth
/// call is a `POST` with a JSON body (`{}` when none is attached).
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    bearer: Option<String>,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Session lookup
    pub fn get(path: impl Into<String>) -> Self {
        Self::with_method(Method::GET, path)
    }

    /// Mutating auth call
    pub fn post(path: impl Into<String>) -> Self {
        Self::with_method(Method::POST, path)
    }

    fn with_method(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), bearer: None, body: None }
    }

    /// Authenticate with `token`; `None` leaves the call anonymous
    pub fn bearer(mut self, token: Option<&str>) -> Self {
        self.bearer = token.map(str::to_owned);
        self
    }

    /// Serialize `value` as the JSON body
    pub fn json_body<T: Serialize>(mut self, value: &T) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(value)?);
        Ok(self)
    }

    /// Endpoint path relative to the auth base
    pub fn path(&self) -> &str {
        &self.path
    }

    /// HTTP verb
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Bearer token, if any
    pub fn token(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    /// JSON body, if one was attached
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }
}

/// Decoded body of a successful call
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    /// HTTP status code
    pub status: u16,
    /// Decoded JSON payload
    pub data: T,
}

// =============================================================================
// Client
// =============================================================================

/// reqwest-backed transport for the auth service
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    /// Build the underlying reqwest client from `config`
    pub fn new(config: ClientConfig) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client, config })
    }

    /// Perform `request` and decode a successful body as `T`
    ///
    /// Non-2xx answers become an [`HttpError`] carrying the service's
    /// `{ code, message }` body when it sent one.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<ApiResponse<T>, HttpError> {
        let url = self.config.endpoint(&request.path);
        tracing::debug!(method = %request.method, path = %request.path, "auth request");

        let mut builder = self.client.request(request.method.clone(), url);
        for (name, value) in &self.config.default_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match request.body {
            Some(body) => builder.json(&body),
            None if request.method == Method::POST => builder.json(&serde_json::json!({})),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| HttpError::transport(format!("Request failed: {e}")))?;
        decode(response).await
    }

    /// Settings this client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<ApiResponse<T>, HttpError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| HttpError::decode(status.as_u16(), format!("Failed to read response: {e}")))?;

    if !status.is_success() {
        return Err(error_from_body(status.as_u16(), text));
    }

    // An empty success body decodes like JSON null
    let json = if text.trim().is_empty() { "null" } else { text.as_str() };
    serde_json::from_str(json)
        .map(|data| ApiResponse { status: status.as_u16(), data })
        .map_err(|e| HttpError::decode(status.as_u16(), format!("Failed to parse JSON: {e}")))
}

fn error_from_body(status: u16, text: String) -> HttpError {
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let mut error = HttpError::new(status, body.code, body.message);
    if error.message.is_none() && !text.is_empty() {
        error.detail = Some(text);
    }
    error
}
