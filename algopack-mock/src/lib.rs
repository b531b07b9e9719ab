//! algopack-mock
//!
//! A deterministic, in-memory [`Transport`] plus wire-payload fixture
//! builders. Lets every layer above the transport be tested without a
//! network: handlers see the same URL and query parameters the production
//! transport would send, and answer with canned wire bodies.

use std::sync::Mutex;

use algopack_core::transport::{RawResponse, Transport};
use algopack_types::AlgopackError;
use async_trait::async_trait;

pub mod fixtures;

pub use fixtures::SectionFixture;

type Handler =
    Box<dyn Fn(&str, &[(String, String)]) -> Result<RawResponse, AlgopackError> + Send + Sync>;

/// One captured request: the resource URL and its query parameters.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// Full request URL (with the wire-format suffix).
    pub url: String,
    /// Query parameters in send order.
    pub params: Vec<(String, String)>,
}

impl CapturedRequest {
    /// Look a query parameter up by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory transport driven by a handler closure.
///
/// Captures every request so tests can assert on the URLs and parameters the
/// client actually produced.
pub struct MockTransport {
    handler: Handler,
    captured: Mutex<Vec<CapturedRequest>>,
}

impl MockTransport {
    /// Build from a handler deciding the response per request.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str, &[(String, String)]) -> Result<RawResponse, AlgopackError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            handler: Box::new(handler),
            captured: Mutex::new(Vec::new()),
        }
    }

    /// A transport answering every request with the same successful JSON body.
    pub fn always(body: impl Into<String>) -> Self {
        let body = body.into();
        Self::with_handler(move |_, _| Ok(RawResponse::ok_json(body.clone())))
    }

    /// A transport serving one [`SectionFixture`] page by page: the `start`
    /// query parameter selects the slice, `page_size` rows per page.
    #[must_use]
    pub fn paged(fixture: SectionFixture, page_size: usize) -> Self {
        Self::with_handler(move |_, params| {
            let start = params
                .iter()
                .find(|(k, _)| k == "start")
                .and_then(|(_, v)| v.parse::<usize>().ok())
                .unwrap_or(0);
            Ok(RawResponse::ok_json(fixture.page(start, page_size)))
        })
    }

    /// Requests captured so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured
            .lock()
            .map(|reqs| reqs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<RawResponse, AlgopackError> {
        if let Ok(mut captured) = self.captured.lock() {
            captured.push(CapturedRequest {
                url: url.to_owned(),
                params: params.to_vec(),
            });
        }
        (self.handler)(url, params)
    }
}
