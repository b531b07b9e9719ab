use std::sync::Arc;

use algopack_types::AlgopackError;
use url::Url;

use crate::throttle::RateLimiter;
use crate::transport::Transport;
use crate::wire::WireResponse;

/// The wire format suffix appended to every resource path.
const WIRE_SUFFIX: &str = ".json";

/// A throttled client over the ISS wire protocol.
///
/// Joins resource path segments, appends the wire-format suffix, paces the
/// request through the shared [`RateLimiter`], and parses the structured
/// response. Cheap to clone; clones share the transport and the limiter.
#[derive(Clone)]
pub struct IssClient {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    base_url: Url,
    authorized: bool,
}

impl IssClient {
    /// Build a client over the given transport and limiter.
    #[must_use]
    pub const fn new(
        transport: Arc<dyn Transport>,
        limiter: Arc<RateLimiter>,
        base_url: Url,
        authorized: bool,
    ) -> Self {
        Self {
            transport,
            limiter,
            base_url,
            authorized,
        }
    }

    /// Whether this client carries credentials (bearer token or passport
    /// cookie). Authorized clients skip the public-endpoint pacing.
    #[must_use]
    pub const fn authorized(&self) -> bool {
        self.authorized
    }

    /// Fetch one resource and parse its wire response.
    ///
    /// `path` is a logical resource path; segments are joined and suffixed
    /// with the wire-format extension before hitting the transport.
    ///
    /// # Errors
    /// - [`AlgopackError::Transport`] for non-2xx statuses, and for 2xx
    ///   responses whose content type is not the structured wire format
    ///   (reported as 403).
    /// - [`AlgopackError::MalformedResponse`] when a successful body fails to
    ///   parse as a non-empty wire response.
    pub async fn get_objects(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<WireResponse, AlgopackError> {
        let url = self.resource_url(path);
        let display_url = url.trim_end_matches(WIRE_SUFFIX);

        self.limiter.acquire(self.authorized).await;
        let response = self.transport.get(&url, params).await?;
        tracing::debug!(url = display_url, status = response.status, "iss request");

        if !response.is_success() {
            return Err(AlgopackError::transport(display_url, response.status));
        }
        if !response.content_type.starts_with("application/json") {
            return Err(AlgopackError::transport(display_url, 403));
        }
        WireResponse::parse(&response.body)
    }

    fn resource_url(&self, path: &str) -> String {
        let joined = path
            .split('/')
            .filter(|segment| !segment.trim().is_empty())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "{}/{joined}{WIRE_SUFFIX}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

impl std::fmt::Debug for IssClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssClient")
            .field("base_url", &self.base_url.as_str())
            .field("authorized", &self.authorized)
            .finish_non_exhaustive()
    }
}
