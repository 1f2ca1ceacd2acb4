//! Outbound HTTP for the gateway
//!
//! Clients are built per logical operation with the headers that operation
//! needs, used, and dropped.

use crate::config::{GatewayConfig, SESSION_HEADER};
use crate::error::GatewayError;
use crate::types::ContentFetchOutcome;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// Which backend a client talks to; decides the default headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Backend {
    /// Documentation pages, search and recommendation APIs
    Documentation,
    /// Code host REST API and raw file host
    GitHub,
}

/// Thin wrapper over a configured reqwest client
pub(crate) struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Build a client for one operation against `backend`
    pub(crate) fn new(
        config: &GatewayConfig,
        backend: Backend,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(crate::DEFAULT_USER_AGENT)),
        );

        match backend {
            Backend::Documentation => {
                if let Ok(value) = HeaderValue::from_str(config.session_id.as_str()) {
                    headers.insert(SESSION_HEADER, value);
                }
            }
            Backend::GitHub => {
                headers.insert(
                    ACCEPT,
                    HeaderValue::from_static("application/vnd.github+json"),
                );
                if let Some(token) = &config.github_token {
                    match HeaderValue::from_str(&format!("Bearer {}", token)) {
                        Ok(mut value) => {
                            value.set_sensitive(true);
                            headers.insert(AUTHORIZATION, value);
                        }
                        Err(_) => error!("GitHub token contains invalid header characters, ignoring it"),
                    }
                }
            }
        }

        let inner = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(GatewayError::ClientBuild)?;

        Ok(Self { inner })
    }

    /// GET a URL and return the body as text
    pub(crate) async fn get_text(&self, url: &str) -> Result<String, GatewayError> {
        let response = self.send(self.inner.get(url), url).await?;
        response.text().await.map_err(GatewayError::from_reqwest)
    }

    /// GET a URL and decode the JSON body
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, GatewayError> {
        let response = self.send(self.inner.get(url), url).await?;
        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidPayload(e.to_string()))
    }

    /// POST a JSON body and decode the JSON reply
    pub(crate) async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, GatewayError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.inner.post(url).json(body), url).await?;
        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidPayload(e.to_string()))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, GatewayError> {
        debug!(url = %url, "Sending request");
        let response = request.send().await.map_err(GatewayError::from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::UpstreamStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

/// Append query parameters to a base URL
pub(crate) fn with_query(base: &str, params: &[(&str, &str)]) -> Result<String, GatewayError> {
    Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| GatewayError::Http(format!("Invalid URL {}: {}", base, e)))
}

/// Fetch a documentation page, tagging it with the session id
///
/// Failures are logged and folded into the outcome; nothing is retried.
pub(crate) async fn fetch_page(config: &GatewayConfig, url: &str) -> ContentFetchOutcome {
    debug!(url = %url, "Fetching page");

    let result = async {
        let client = HttpClient::new(config, Backend::Documentation, config.page_timeout)?;
        let target = with_query(url, &[("session", config.session_id.as_str())])?;
        client.get_text(&target).await
    }
    .await;

    match result {
        Ok(body) => ContentFetchOutcome::success(body),
        Err(err) => {
            let message = fetch_failure_message(url, &err);
            error!("{}", message);
            ContentFetchOutcome::failure(message)
        }
    }
}

/// The error string a read returns when its primary fetch failed
pub(crate) fn fetch_failure_message(url: &str, err: &GatewayError) -> String {
    match err {
        GatewayError::UpstreamStatus { status, .. } => {
            format!("Failed to fetch {} - status code {}", url, status)
        }
        other => format!("Failed to fetch {}: {}", url, other),
    }
}
