//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("channel-studio/", env!("CARGO_PKG_VERSION"));

/// Reqwest-based HTTP client
///
/// [`HttpClient::execute`] is a single attempt, so inserts and uploads are
/// never replayed. [`HttpClient::execute_with_retry`] retries transport
/// failures and 429/5xx responses according to the [`RetryPolicy`]. When the
/// final attempt still yields a retryable status the response is returned
/// rather than replaced by an error, so the provider body (quota reasons,
/// rate-limit details) stays available for classification.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a client with a 30 second default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a client with a custom default timeout
    ///
    /// Media uploads override this per request via [`HttpRequest::timeout`].
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    async fn into_response(response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn backoff(policy: &RetryPolicy, attempt: u32) -> Duration {
        if policy.use_exponential_backoff {
            let exponential_delay = policy.base_delay * 2u32.pow(attempt.saturating_sub(1));
            exponential_delay.min(policy.max_delay)
        } else {
            policy.base_delay
        }
    }

    async fn execute_with_retry_internal(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < max_attempts {
            attempt += 1;
            debug!(
                attempt = attempt,
                max_attempts = max_attempts,
                url = %request.url,
                "Executing HTTP request"
            );

            match self.build_request(request.clone()).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let retryable = status >= 500 || status == 429;

                    if !retryable || attempt >= max_attempts {
                        return Self::into_response(response).await;
                    }

                    warn!(
                        status = status,
                        attempt = attempt,
                        "HTTP request failed with retryable status"
                    );
                }
                Err(e) => {
                    warn!(error = %e, attempt = attempt, "HTTP request failed");

                    last_error = Some(if e.is_timeout() {
                        BridgeError::OperationFailed("Request timed out".to_string())
                    } else if e.is_connect() {
                        BridgeError::OperationFailed(format!("Connection failed: {}", e))
                    } else {
                        BridgeError::OperationFailed(e.to_string())
                    });
                }
            }

            if attempt < max_attempts {
                let delay = Self::backoff(&policy, attempt);
                debug!(delay_ms = delay.as_millis(), "Retrying after delay");
                sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::OperationFailed("All retry attempts exhausted".to_string())
        }))
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let single_attempt = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        };
        self.execute_with_retry_internal(request, single_attempt)
            .await
    }

    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        policy: RetryPolicy,
    ) -> Result<HttpResponse> {
        self.execute_with_retry_internal(request, policy).await
    }
}
