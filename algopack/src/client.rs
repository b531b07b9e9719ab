use std::sync::Arc;

use algopack_core::identity::{resolve_market, resolve_security};
use algopack_core::throttle::RateLimiter;
use algopack_core::transport::{ReqwestTransport, Transport};
use algopack_core::IssClient;
use algopack_types::AlgopackError;
use url::Url;

use crate::market::Market;
use crate::ticker::Ticker;

/// Public ISS endpoint for anonymous access.
const BASE_URL: &str = "https://iss.moex.com/iss";
/// Token-gated endpoint used when a bearer token is supplied.
const TOKEN_URL: &str = "https://apim.moex.com/iss";
/// Environment variable consulted by [`AlgopackBuilder::token_from_env`].
const TOKEN_ENV: &str = "ALGOPACK_TOKEN";

/// The service client. Cheap to clone; clones share the transport and the
/// request pacing watermark.
#[derive(Debug, Clone)]
pub struct Algopack {
    iss: IssClient,
}

impl Algopack {
    /// An anonymous client against the public endpoint.
    ///
    /// # Errors
    /// Propagates HTTP client construction failures.
    pub fn new() -> Result<Self, AlgopackError> {
        Self::builder().build()
    }

    /// Start configuring a client.
    #[must_use]
    pub fn builder() -> AlgopackBuilder {
        AlgopackBuilder::default()
    }

    /// A market handle for a market name or alias (`"EQ"`, `"shares"`,
    /// `"index"`, `"FO"`, ...), on its default board.
    ///
    /// # Errors
    /// Returns [`AlgopackError::Unsupported`] for unknown market names.
    pub fn market(&self, name: &str) -> Result<Market, AlgopackError> {
        self.market_on(name, None)
    }

    /// A market handle on an explicit board.
    ///
    /// # Errors
    /// Returns [`AlgopackError::Unsupported`] for unknown market names.
    pub fn market_on(&self, name: &str, board: Option<&str>) -> Result<Market, AlgopackError> {
        let id = resolve_market(name, board)?;
        Ok(Market::new(self.iss.clone(), id))
    }

    /// Resolve a ticker, selecting its primary board (or the board embedded
    /// in a `"SBER.TQBR"` form).
    ///
    /// # Errors
    /// See [`Ticker`] resolution: [`AlgopackError::Lookup`] for unknown
    /// symbols, [`AlgopackError::Validation`] for board conflicts.
    pub async fn ticker(&self, symbol: &str) -> Result<Ticker, AlgopackError> {
        self.ticker_on(symbol, None).await
    }

    /// Resolve a ticker on an explicit board.
    ///
    /// # Errors
    /// See [`Algopack::ticker`].
    pub async fn ticker_on(
        &self,
        symbol: &str,
        board: Option<&str>,
    ) -> Result<Ticker, AlgopackError> {
        let identity = resolve_security(&self.iss, symbol, board).await?;
        tracing::debug!(
            ticker = identity.ticker.as_str(),
            board = identity.board.as_str(),
            delisted = identity.delisted,
            "resolved ticker"
        );
        Ok(Ticker::new(self.iss.clone(), identity))
    }
}

/// Configuration for an [`Algopack`] client: endpoint, credentials,
/// transport, and request pacing.
#[derive(Default)]
pub struct AlgopackBuilder {
    base_url: Option<String>,
    token: Option<String>,
    passport_cert: Option<String>,
    plain_http: bool,
    transport: Option<Arc<dyn Transport>>,
    limiter: Option<Arc<RateLimiter>>,
}

impl AlgopackBuilder {
    /// Use a bearer token; switches to the token-gated endpoint and lifts
    /// the public-endpoint request pacing.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Read the bearer token from the `ALGOPACK_TOKEN` environment variable
    /// when set.
    #[must_use]
    pub fn token_from_env(mut self) -> Self {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                self.token = Some(token);
            }
        }
        self
    }

    /// Attach a passport authentication cookie.
    #[must_use]
    pub fn passport_cert(mut self, cert: impl Into<String>) -> Self {
        self.passport_cert = Some(cert.into());
        self
    }

    /// Override the endpoint base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Downgrade to plain HTTP (HTTPS is enforced by default).
    #[must_use]
    pub const fn plain_http(mut self, plain: bool) -> Self {
        self.plain_http = plain;
        self
    }

    /// Substitute the transport (tests, instrumentation).
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Share or replace the request pacing watermark.
    #[must_use]
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns [`AlgopackError::Validation`] for an unparsable base URL or a
    /// failed HTTP client construction.
    pub fn build(self) -> Result<Algopack, AlgopackError> {
        let authorized = self.token.is_some() || self.passport_cert.is_some();

        let mut base = self
            .base_url
            .unwrap_or_else(|| {
                if self.token.is_some() {
                    TOKEN_URL.to_owned()
                } else {
                    BASE_URL.to_owned()
                }
            });
        if self.plain_http {
            if let Some(rest) = base.strip_prefix("https:") {
                base = format!("http:{rest}");
            }
        } else if let Some(rest) = base.strip_prefix("http:") {
            base = format!("https:{rest}");
        }
        let base = Url::parse(&base)
            .map_err(|e| AlgopackError::Validation(format!("bad base URL `{base}`: {e}")))?;

        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(build_transport(
                self.token.as_deref(),
                self.passport_cert.as_deref(),
            )?),
        };
        let limiter = self.limiter.unwrap_or_default();

        Ok(Algopack {
            iss: IssClient::new(transport, limiter, base, authorized),
        })
    }
}

fn build_transport(
    token: Option<&str>,
    passport_cert: Option<&str>,
) -> Result<ReqwestTransport, AlgopackError> {
    let mut headers = reqwest::header::HeaderMap::new();
    if let Some(token) = token {
        let value = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| AlgopackError::Validation("bearer token is not a valid header".into()))?;
        headers.insert(reqwest::header::AUTHORIZATION, value);
    }
    if let Some(cert) = passport_cert {
        let value =
            reqwest::header::HeaderValue::from_str(&format!("MicexPassportCert={cert}"))
                .map_err(|_| {
                    AlgopackError::Validation("passport cert is not a valid header".into())
                })?;
        headers.insert(reqwest::header::COOKIE, value);
    }

    let client = reqwest::Client::builder()
        .user_agent("algopack-rs/0.1")
        .default_headers(headers)
        .cookie_store(true)
        .build()
        .map_err(|e| AlgopackError::Validation(format!("cannot build HTTP client: {e}")))?;
    Ok(ReqwestTransport::with_client(client))
}

#[cfg(test)]
mod tests {
    use super::Algopack;

    #[test]
    fn https_is_enforced_unless_downgraded() {
        let client = Algopack::builder()
            .base_url("http://iss.moex.test/iss")
            .build()
            .unwrap();
        assert!(format!("{client:?}").contains("https://"));

        let plain = Algopack::builder()
            .base_url("https://iss.moex.test/iss")
            .plain_http(true)
            .build()
            .unwrap();
        assert!(format!("{plain:?}").contains("http://"));
    }

    #[test]
    fn unknown_market_names_are_rejected() {
        let client = Algopack::new().unwrap();
        assert!(client.market("bonds").is_err());
        assert!(client.market("EQ").is_ok());
    }
}
