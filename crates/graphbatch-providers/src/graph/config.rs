//! Microsoft Graph provider configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// OAuth 2.0 client-credentials settings for the Microsoft identity platform.
#[derive(Clone)]
pub struct ClientCredentials {
    /// Application (client) ID of the app registration.
    pub client_id: String,
    /// Client secret of the app registration.
    pub client_secret: String,
    /// Directory (tenant) ID the app is registered in.
    pub tenant_id: String,
    /// Authority base URL; the tenant ID is appended to it.
    pub authority: String,
    /// Scope requested for the token.
    pub scope: String,
}

impl ClientCredentials {
    /// Default authority for the public cloud.
    pub const DEFAULT_AUTHORITY: &'static str = "https://login.microsoftonline.com/";

    /// Default scope granting the app's configured Graph permissions.
    pub const DEFAULT_SCOPE: &'static str = "https://graph.microsoft.com/.default";

    /// Creates credentials with the default authority and scope.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: tenant_id.into(),
            authority: Self::DEFAULT_AUTHORITY.to_string(),
            scope: Self::DEFAULT_SCOPE.to_string(),
        }
    }

    /// Sets the authority base URL.
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    /// Sets the requested scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Returns the v2.0 token endpoint: `{authority}{tenant}/oauth2/v2.0/token`.
    ///
    /// A missing trailing slash on the authority is tolerated.
    pub fn token_url(&self) -> ProviderResult<Url> {
        let authority = if self.authority.ends_with('/') {
            self.authority.clone()
        } else {
            format!("{}/", self.authority)
        };

        let raw = format!(
            "{}{}/oauth2/v2.0/token",
            authority,
            urlencoding::encode(&self.tenant_id)
        );
        Url::parse(&raw).map_err(|e| {
            ProviderError::configuration(format!("invalid authority '{}': {}", self.authority, e))
        })
    }

    /// Validates that every field is present and the authority is a URL.
    pub fn validate(&self) -> Result<(), String> {
        if self.client_id.is_empty() {
            return Err("client_id is required".to_string());
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required".to_string());
        }
        if self.tenant_id.is_empty() {
            return Err("tenant_id is required".to_string());
        }
        if self.scope.is_empty() {
            return Err("scope is required".to_string());
        }
        self.token_url().map_err(|e| e.message().to_string())?;
        Ok(())
    }
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("authority", &self.authority)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Configuration for the Graph calendar client.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Mailbox whose calendar receives the events (UPN or object ID).
    pub calendar_email: String,

    /// Graph API root, e.g. `https://graph.microsoft.com/v1.0`.
    ///
    /// National clouds use a different host.
    pub base_url: String,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,
}

impl GraphConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default Graph API root.
    pub const DEFAULT_BASE_URL: &'static str = "https://graph.microsoft.com/v1.0";

    /// Creates a configuration targeting the given mailbox.
    pub fn new(calendar_email: impl Into<String>) -> Self {
        Self {
            calendar_email: calendar_email.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("graphbatch/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the Graph API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the `$batch` endpoint.
    pub fn batch_url(&self) -> String {
        format!("{}/$batch", self.base_url.trim_end_matches('/'))
    }

    /// Returns the events collection path relative to the API root.
    ///
    /// This is the `url` of every batched creation sub-request.
    pub fn events_path(&self) -> String {
        format!("/users/{}/events", urlencoding::encode(&self.calendar_email))
    }

    /// Returns the absolute URL of a single event.
    pub fn event_url(&self, event_id: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url.trim_end_matches('/'),
            self.events_path(),
            urlencoding::encode(event_id)
        )
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.calendar_email.is_empty() {
            return Err("calendar_email is required".to_string());
        }
        let url = Url::parse(&self.base_url)
            .map_err(|e| format!("invalid graph base URL '{}': {}", self.base_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "graph base URL must be http or https, got '{}'",
                url.scheme()
            ));
        }
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}
