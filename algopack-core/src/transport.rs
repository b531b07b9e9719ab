use std::time::Duration;

use algopack_types::AlgopackError;
use async_trait::async_trait;

/// Raw HTTP response envelope handed back by a [`Transport`].
///
/// Status and content-type interpretation belongs to the client, not the
/// transport: a transport only reports what the server said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// The `content-type` header, empty when absent.
    pub content_type: String,
    /// Response body as text.
    pub body: String,
}

impl RawResponse {
    /// A 200 response with a JSON content type, for tests and fixtures.
    #[must_use]
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "application/json; charset=utf-8".to_owned(),
            body: body.into(),
        }
    }

    /// `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// The narrow HTTP contract the core consumes.
///
/// One GET per call; query parameters are passed separately so transports can
/// encode them. Implementations must be cheap to share behind an `Arc`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a GET request against `url` with the given query parameters.
    ///
    /// # Errors
    /// Returns [`AlgopackError::Transport`] with status 0 when the request
    /// never produced an HTTP response (connect failure, timeout).
    async fn get(&self, url: &str, params: &[(String, String)])
    -> Result<RawResponse, AlgopackError>;
}

/// Production transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    const USER_AGENT: &'static str = "algopack-rs/0.1";

    /// Build with connection pooling, redirects, a cookie store, and a
    /// 300-second timeout.
    ///
    /// # Errors
    /// Returns [`AlgopackError::Validation`] if the underlying client cannot
    /// be constructed.
    pub fn new() -> Result<Self, AlgopackError> {
        let client = reqwest::Client::builder()
            .user_agent(Self::USER_AGENT)
            .cookie_store(true)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| AlgopackError::Validation(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an already-configured `reqwest::Client`.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<RawResponse, AlgopackError> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| AlgopackError::transport_io(url, e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let body = response
            .text()
            .await
            .map_err(|e| AlgopackError::transport_io(url, e.to_string()))?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RawResponse;

    #[test]
    fn success_covers_the_2xx_range_only() {
        assert!(RawResponse::ok_json("{}").is_success());
        let redirect = RawResponse {
            status: 302,
            content_type: String::new(),
            body: String::new(),
        };
        assert!(!redirect.is_success());
    }
}
