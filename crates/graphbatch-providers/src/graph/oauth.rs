//! OAuth 2.0 client-credentials flow for the Microsoft identity platform.
//!
//! The application authenticates as itself (no user involved): the client
//! ID and secret are posted to the tenant's v2.0 token endpoint together
//! with a `.default` scope, and the returned access token is used as a
//! bearer credential for Graph calls.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, Credential, TokenProvider};

use super::config::ClientCredentials;

/// OAuth client for the client-credentials grant.
#[derive(Debug)]
pub struct ClientCredentialsClient {
    credentials: ClientCredentials,
    http_client: reqwest::Client,
}

impl ClientCredentialsClient {
    /// Creates a new OAuth client with the given credentials.
    ///
    /// # Errors
    ///
    /// Fails if the credentials are incomplete or the HTTP client cannot be
    /// constructed.
    pub fn new(credentials: ClientCredentials, timeout: Duration) -> ProviderResult<Self> {
        credentials
            .validate()
            .map_err(ProviderError::configuration)?;

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::internal(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            credentials,
            http_client,
        })
    }

    /// Requests an access token from the token endpoint.
    pub async fn request_token(&self) -> ProviderResult<Credential> {
        let token_url = self.credentials.token_url()?;
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("scope", self.credentials.scope.as_str()),
            ("grant_type", "client_credentials"),
        ];

        debug!(url = %token_url, client_id = %self.credentials.client_id, "requesting token");

        let response = self
            .http_client
            .post(token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                ProviderError::authentication(format!("token request failed: {}", e))
                    .with_source(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::authentication(format!("failed to read token response: {}", e))
        })?;

        if !status.is_success() {
            let detail = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|err| err.describe())
                .unwrap_or(body);
            return Err(ProviderError::authentication(format!(
                "token request rejected ({}): {}",
                status, detail
            )));
        }

        let token_response: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::authentication(format!("invalid token response: {}", e))
        })?;

        if let Some(ref token_type) = token_response.token_type {
            if !token_type.eq_ignore_ascii_case("bearer") {
                return Err(ProviderError::authentication(format!(
                    "unexpected token type '{}'",
                    token_type
                )));
            }
        }

        info!(expires_in = ?token_response.expires_in, "obtained access token");
        Ok(Credential::with_lifetime(
            token_response.access_token,
            token_response.expires_in,
        ))
    }
}

impl TokenProvider for ClientCredentialsClient {
    fn name(&self) -> &str {
        "entra"
    }

    fn acquire_token(&self) -> BoxFuture<'_, ProviderResult<Credential>> {
        Box::pin(async move {
            self.request_token()
                .await
                .map_err(|e| e.with_provider("entra"))
        })
    }
}

/// Successful response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
}

/// Error response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenErrorResponse {
    fn describe(&self) -> String {
        match self.error_description {
            Some(ref description) => format!("{}: {}", self.error, description),
            None => self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials(server: &MockServer) -> ClientCredentials {
        ClientCredentials::new("app-id", "s3cret", "tenant-1")
            .with_authority(format!("{}/", server.uri()))
    }

    fn client(server: &MockServer) -> ClientCredentialsClient {
        ClientCredentialsClient::new(credentials(server), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn parse_token_response() {
        let json = r#"{
            "token_type": "Bearer",
            "expires_in": 3599,
            "ext_expires_in": 3599,
            "access_token": "eyJ0eXAi"
        }"#;
        let response: TokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.access_token, "eyJ0eXAi");
        assert_eq!(response.expires_in, Some(3599));
    }

    #[test]
    fn describe_token_error() {
        let json = r#"{
            "error": "invalid_client",
            "error_description": "AADSTS7000215: Invalid client secret provided."
        }"#;
        let response: TokenErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.describe(),
            "invalid_client: AADSTS7000215: Invalid client secret provided."
        );
    }

    #[test]
    fn incomplete_credentials_are_rejected() {
        let err = ClientCredentialsClient::new(
            ClientCredentials::new("", "secret", "tenant"),
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
    }

    #[tokio::test]
    async fn acquires_token_with_client_credentials_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=app-id"))
            .and(body_string_contains("client_secret=s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "token-abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let credential = client(&server).acquire_token().await.unwrap();
        assert_eq!(credential.access_token(), "token-abc");
        assert!(!credential.is_expired());
    }

    #[tokio::test]
    async fn rejected_secret_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_client",
                "error_description": "Invalid client secret provided."
            })))
            .mount(&server)
            .await;

        let err = client(&server).acquire_token().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(err.provider(), Some("entra"));
        assert!(err.message().contains("invalid_client"));
    }

    #[tokio::test]
    async fn malformed_token_body_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server).acquire_token().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
    }
}
