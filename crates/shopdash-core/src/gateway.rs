//! API gateway client: the only component that talks HTTP to the backend.
//!
//! Every request picks up the session credential at dispatch time. Every
//! response is inspected before the caller sees it: a 401 on an
//! authenticated call tears the session down and raises
//! [`GatewayEvent::SessionExpired`]. The gateway itself knows nothing about
//! routes; whoever hosts the pages subscribes and navigates.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::session::{AuthEndpoint, Authenticator, SessionStore};

/// Standard User-Agent header for shopdash API requests.
pub const USER_AGENT: &str = concat!("shopdash/", env!("CARGO_PKG_VERSION"));

/// Fallback message when a login rejection carries no message.
pub const DEFAULT_AUTH_ERROR: &str = "Invalid email or password";
/// Fallback message when a signup rejection carries no message.
pub const DEFAULT_SIGNUP_ERROR: &str = "Failed to create account";

const EVENT_CAPACITY: usize = 16;

/// Categories of API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Login or signup rejected; the session is untouched
    Authentication,
    /// 401 on an authenticated call; the session has been cleared
    AuthorizationExpired,
    /// Any other non-success status (4xx or 5xx)
    HttpStatus,
    /// Connection failure or timeout
    Network,
    /// Response body did not have the expected shape
    Parse,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Authentication => write!(f, "authentication"),
            ApiErrorKind::AuthorizationExpired => write!(f, "authorization_expired"),
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Network => write!(f, "network"),
            ApiErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from the API with kind and details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error, preferring the server's own message.
    pub fn http_status(status: u16, body: &str) -> Self {
        let message = match server_message(body) {
            Some(msg) => format!("HTTP {status}: {msg}"),
            None => format!("HTTP {status}"),
        };
        Self {
            kind: ApiErrorKind::HttpStatus,
            status: Some(status),
            message,
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Creates a login/signup rejection.
    pub fn authentication(endpoint: AuthEndpoint, status: u16, body: &str) -> Self {
        let fallback = match endpoint {
            AuthEndpoint::Login => DEFAULT_AUTH_ERROR,
            AuthEndpoint::Signup => DEFAULT_SIGNUP_ERROR,
        };
        Self {
            kind: ApiErrorKind::Authentication,
            status: Some(status),
            message: server_message(body).unwrap_or_else(|| fallback.to_string()),
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    pub fn authorization_expired() -> Self {
        Self {
            kind: ApiErrorKind::AuthorizationExpired,
            status: Some(StatusCode::UNAUTHORIZED.as_u16()),
            message: "Session expired, please log in again".to_string(),
            details: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Parse, message)
    }

    pub fn is_authorization_expired(&self) -> bool {
        self.kind == ApiErrorKind::AuthorizationExpired
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for gateway operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Pulls a human message out of `{"message": ..}`, `{"error": {"message": ..}}`
/// or `{"error": ..}`, skipping any that is not a non-empty string.
fn server_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    let text = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    };
    text(json.get("message"))
        .or_else(|| text(json.get("error").and_then(|e| e.get("message"))))
        .or_else(|| text(json.get("error")))
}

fn transport_error(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::network(format!("Request timed out: {err}"))
    } else {
        ApiError::network(format!("Network error: {err}"))
    }
}

/// Cross-cutting notifications raised by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// The server rejected the credential; the session is already cleared.
    SessionExpired {
        /// Path of the request that was rejected
        path: String,
    },
}

/// How a response status is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    /// Regular API call: 401 means the session is gone
    Authorized,
    /// Login/signup submission: any failure is a bad-credentials error
    Authenticate(AuthEndpoint),
}

/// HTTP client for the analytics API.
#[derive(Debug)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
    events: broadcast::Sender<GatewayEvent>,
}

impl GatewayClient {
    /// Creates a client for `base_url` (e.g. `http://localhost:8080/api`).
    pub fn new(base_url: &str, session: SessionStore, timeout: Option<Duration>) -> Result<Self> {
        url::Url::parse(base_url).with_context(|| format!("Invalid API base URL: {base_url}"))?;

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Subscribes to gateway events. Events raised before subscribing are
    /// not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.events.subscribe()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` with `query` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let request = self.http.get(self.url(path)).query(query);
        let response = self.dispatch(request, path, Dispatch::Authorized).await?;
        decode(response, path).await
    }

    /// POST `path` without a body; only the status matters.
    pub async fn post_empty(&self, path: &str) -> ApiResult<()> {
        let request = self.http.post(self.url(path));
        self.dispatch(request, path, Dispatch::Authorized).await?;
        Ok(())
    }

    /// Attaches the credential, sends, and applies the status policy.
    async fn dispatch(
        &self,
        request: RequestBuilder,
        path: &str,
        mode: Dispatch,
    ) -> ApiResult<reqwest::Response> {
        let request = match self.session.credential() {
            Some(credential) => request.header(reqwest::header::AUTHORIZATION, credential.bearer()),
            None => request,
        };

        tracing::debug!(path, ?mode, "dispatching request");
        let response = request.send().await.map_err(|e| transport_error(&e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match mode {
            Dispatch::Authenticate(endpoint) => {
                tracing::debug!(path, status = status.as_u16(), "authentication rejected");
                Err(ApiError::authentication(endpoint, status.as_u16(), &body))
            }
            Dispatch::Authorized if status == StatusCode::UNAUTHORIZED => {
                tracing::warn!(path, "credential rejected, clearing session");
                self.session.expire();
                // No subscribers is fine: the session is already cleared.
                let _ = self.events.send(GatewayEvent::SessionExpired {
                    path: path.to_string(),
                });
                Err(ApiError::authorization_expired())
            }
            Dispatch::Authorized => {
                tracing::debug!(path, status = status.as_u16(), "request failed");
                Err(ApiError::http_status(status.as_u16(), &body))
            }
        }
    }
}

impl Authenticator for GatewayClient {
    async fn authenticate(&self, endpoint: AuthEndpoint, body: Value) -> ApiResult<Value> {
        let path = endpoint.path();
        let request = self.http.post(self.url(path)).json(&body);
        let response = self.dispatch(request, path, Dispatch::Authenticate(endpoint)).await?;
        decode(response, path).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response, path: &str) -> ApiResult<T> {
    let bytes = response.bytes().await.map_err(|e| transport_error(&e))?;
    serde_json::from_slice(&bytes).map_err(|err| ApiError {
        kind: ApiErrorKind::Parse,
        status: None,
        message: format!("Failed to parse response from {path}: {err}"),
        details: Some(String::from_utf8_lossy(&bytes).into_owned()),
    })
}
