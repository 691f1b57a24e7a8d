//! Error types for identity and calendar API calls.
//!
//! Every remote failure is a [`ProviderError`]. Whether it is fatal depends
//! on where it happens: a token failure aborts the run, a failed batch or
//! deletion is recorded by the caller and the run continues.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// No token, or the token was rejected (401).
    AuthenticationFailed,
    /// The application lacks the calendar permission (403).
    AuthorizationFailed,
    /// Connection, DNS or timeout failure.
    NetworkError,
    /// Throttled (429).
    RateLimited,
    /// 5xx from the service.
    ServerError,
    /// Unparsable or unexpected response.
    InvalidResponse,
    /// The mailbox or event does not exist (404).
    NotFound,
    /// Malformed request (400).
    BadRequest,
    /// Local settings are unusable.
    ConfigurationError,
    /// The HTTP client could not be set up.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if running again later may succeed.
    ///
    /// Nothing is retried automatically; this only shapes reporting.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    /// Returns a stable name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }

    /// Classifies an unsuccessful HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::AuthenticationFailed,
            403 => Self::AuthorizationFailed,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            _ => Self::InvalidResponse,
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure talking to the identity platform or the Graph API.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// Which service produced the error ("entra", "graph").
    provider: Option<String>,
    /// Server-requested delay, for throttling responses.
    retry_after: Option<Duration>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates an error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            retry_after: None,
            source: None,
        }
    }

    /// Builds an error from an unsuccessful HTTP response.
    ///
    /// A Graph error envelope (`{"error": {"code", "message"}}`) is reduced
    /// to `code: message`; any other body is quoted, cut to `max_body` chars.
    pub fn from_http(what: &str, status: u16, body: &str, max_body: usize) -> Self {
        let detail = serde_json::from_str::<GraphErrorEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.error.describe())
            .unwrap_or_else(|| truncate(body.trim(), max_body));

        Self::new(
            ProviderErrorCode::from_status(status),
            format!("{} failed ({}): {}", what, status, detail),
        )
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Tags the error with the service that produced it.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Records the delay requested by a `Retry-After` header.
    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    /// Returns true if running again later may succeed.
    pub fn is_transient(&self) -> bool {
        self.code.is_transient()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(delay) = self.retry_after {
            write!(f, " (retry after {} seconds)", delay.as_secs())?;
        }
        Ok(())
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GraphErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl GraphErrorDetail {
    fn describe(self) -> Option<String> {
        match (self.code, self.message) {
            (Some(code), Some(message)) if !message.is_empty() => {
                Some(format!("{}: {}", code, message))
            }
            (Some(code), _) => Some(code),
            (None, Some(message)) => Some(message),
            (None, None) => None,
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_codes() {
        assert!(ProviderErrorCode::NetworkError.is_transient());
        assert!(ProviderErrorCode::RateLimited.is_transient());
        assert!(ProviderErrorCode::ServerError.is_transient());
        assert!(!ProviderErrorCode::AuthenticationFailed.is_transient());
        assert!(!ProviderErrorCode::NotFound.is_transient());
    }

    #[test]
    fn status_classification() {
        let cases = [
            (400, ProviderErrorCode::BadRequest),
            (401, ProviderErrorCode::AuthenticationFailed),
            (403, ProviderErrorCode::AuthorizationFailed),
            (404, ProviderErrorCode::NotFound),
            (429, ProviderErrorCode::RateLimited),
            (503, ProviderErrorCode::ServerError),
            (302, ProviderErrorCode::InvalidResponse),
        ];
        for (status, code) in cases {
            assert_eq!(ProviderErrorCode::from_status(status), code, "{}", status);
        }
    }

    #[test]
    fn from_http_reads_graph_envelope() {
        let body = r#"{"error":{"code":"ErrorAccessDenied","message":"Access is denied."}}"#;
        let err = ProviderError::from_http("batch request", 403, body, 100);
        assert_eq!(err.code(), ProviderErrorCode::AuthorizationFailed);
        assert_eq!(
            err.message(),
            "batch request failed (403): ErrorAccessDenied: Access is denied."
        );
    }

    #[test]
    fn from_http_truncates_plain_body() {
        let body = "x".repeat(50);
        let err = ProviderError::from_http("delete request", 502, &body, 10);
        assert_eq!(err.code(), ProviderErrorCode::ServerError);
        assert!(err.message().ends_with("xxxxxxxxxx..."));
    }

    #[test]
    fn display_includes_provider_and_delay() {
        let err = ProviderError::new(ProviderErrorCode::RateLimited, "too many requests")
            .with_provider("graph")
            .with_retry_after(Duration::from_secs(12));
        assert_eq!(
            err.to_string(),
            "[graph] rate_limited: too many requests (retry after 12 seconds)"
        );
    }

    #[test]
    fn source_is_preserved() {
        use std::error::Error;
        let io_err = std::io::Error::other("connection reset");
        let err = ProviderError::network("batch request failed").with_source(io_err);
        assert!(err.source().is_some());
        assert!(err.retry_after().is_none());
    }
}
