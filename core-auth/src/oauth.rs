//! OAuth 2.0 refresh-token grant
//!
//! [`TokenRefresher`] is the seam [`TokenGuard`](crate::TokenGuard) calls when a
//! stored access token is inside the refresh margin. [`GoogleTokenRefresher`]
//! posts the grant to the configured token endpoint exactly once; failures are
//! returned to the caller, never retried here.

use crate::error::{AuthError, Result};
use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use bytes::Bytes;
use core_runtime::config::OAuthClientConfig;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Token endpoint reply to a refresh grant.
#[derive(Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Only present when the provider rotates the refresh token.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish()
    }
}

#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant>;
}

pub struct GoogleTokenRefresher {
    config: OAuthClientConfig,
    http_client: Arc<dyn HttpClient>,
}

impl GoogleTokenRefresher {
    pub fn new(config: OAuthClientConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
        }
    }

    fn build_request(&self, refresh_token: &str) -> Result<HttpRequest> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let encoded = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::Other(format!("Failed to encode token request: {}", e)))?;

        Ok(
            HttpRequest::new(HttpMethod::Post, self.config.token_url.clone())
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Bytes::from(encoded)),
        )
    }
}

#[async_trait]
impl TokenRefresher for GoogleTokenRefresher {
    #[instrument(skip(self, refresh_token), fields(token_url = %self.config.token_url))]
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        debug!("Refreshing access token");

        let request = self.build_request(refresh_token)?;
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;

        if !response.is_success() {
            let status = response.status;
            let body = response.text_lossy();
            warn!(status, error = %body, "Token endpoint rejected refresh grant");
            return Err(AuthError::TokenRefreshFailed(format!(
                "Token endpoint returned {}: {}",
                status, body
            )));
        }

        let grant: TokenGrant = response
            .json()
            .map_err(|e| AuthError::Other(format!("Failed to parse token response: {}", e)))?;

        debug!(expires_in = grant.expires_in, "Access token refreshed");
        Ok(grant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::HttpResponse;
    use bridge_traits::BridgeError;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn refresher(client: MockHttpClient) -> GoogleTokenRefresher {
        GoogleTokenRefresher::new(
            OAuthClientConfig::new("client-123", "shh"),
            Arc::new(client),
        )
    }

    #[tokio::test]
    async fn test_refresh_sends_form_encoded_grant() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .withf(|request| {
                let body = request
                    .body
                    .as_ref()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .unwrap_or_default();
                request.method == HttpMethod::Post
                    && request.url == "https://oauth2.googleapis.com/token"
                    && request.headers.get("Content-Type").map(String::as_str)
                        == Some("application/x-www-form-urlencoded")
                    && body.contains("grant_type=refresh_token")
                    && body.contains("refresh_token=1%2F%2Fold")
                    && body.contains("client_id=client-123")
                    && body.contains("client_secret=shh")
            })
            .times(1)
            .returning(|_| {
                Ok(response(
                    200,
                    r#"{"access_token":"ya29.new","expires_in":1800,"token_type":"Bearer"}"#,
                ))
            });

        let grant = refresher(client).refresh("1//old").await.unwrap();

        assert_eq!(grant.access_token, "ya29.new");
        assert_eq!(grant.expires_in, 1800);
        assert!(grant.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_missing_expires_in_defaults_to_one_hour() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .returning(|_| Ok(response(200, r#"{"access_token":"a","refresh_token":"r2"}"#)));

        let grant = refresher(client).refresh("r1").await.unwrap();

        assert_eq!(grant.expires_in, 3600);
        assert_eq!(grant.refresh_token.as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_rejected_grant_is_not_retried() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .times(1)
            .returning(|_| Ok(response(400, r#"{"error":"invalid_grant"}"#)));

        let err = refresher(client).refresh("revoked").await.unwrap_err();

        match err {
            AuthError::TokenRefreshFailed(message) => {
                assert!(message.contains("400"));
                assert!(message.contains("invalid_grant"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let mut client = MockHttpClient::new();
        client
            .expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("connection reset".to_string())));

        let err = refresher(client).refresh("r").await.unwrap_err();
        assert!(matches!(err, AuthError::NetworkError(_)));
    }
}
