use thiserror::Error;

/// Unified error type for the algopack workspace.
///
/// Covers argument validation, identity lookup failures, transport-level
/// failures, and malformed service responses. Errors surface directly to the
/// caller; nothing in the workspace retries or silently downgrades.
#[derive(Debug, Error)]
pub enum AlgopackError {
    /// Malformed or inverted date window, or required date parameters missing.
    #[error("invalid date range: {0}")]
    InvalidRange(String),

    /// Unrecognized candle/bucket granularity token or integer code.
    #[error("invalid period: {0}")]
    InvalidPeriod(String),

    /// A symbol or market name could not be resolved to a known identity.
    #[error("not found: {what}")]
    Lookup {
        /// Description of the missing resource, e.g. "ticker SBER on TQBR".
        what: String,
    },

    /// Caller-supplied arguments conflict with the service's reference data.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Non-success HTTP status (a success response with a non-JSON body is
    /// reported as 403).
    #[error("HTTP request to {url} failed with code: {status}; {hint}")]
    Transport {
        /// Request URL with the wire-format suffix stripped.
        url: String,
        /// HTTP status code; 0 when the request never reached the server.
        status: u16,
        /// Human-readable recommendation (authenticate vs. retry later).
        hint: String,
    },

    /// A successful response whose body does not parse as the expected
    /// structured wire format, or whose row width disagrees with its columns.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// An operation invoked against a market or instrument type that does not
    /// support it.
    #[error("unsupported operation: {capability}")]
    Unsupported {
        /// What was requested, e.g. "orderbook for currency instruments".
        capability: String,
    },
}

impl AlgopackError {
    /// Helper: build a `Lookup` error for a description of the missing resource.
    pub fn lookup(what: impl Into<String>) -> Self {
        Self::Lookup { what: what.into() }
    }

    /// Helper: build an `Unsupported` error for a capability description.
    pub fn unsupported(capability: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: capability.into(),
        }
    }

    /// Helper: build a `Transport` error with the standard recommendation for
    /// the given status code.
    pub fn transport(url: impl Into<String>, status: u16) -> Self {
        let hint = if status == 403 {
            "Please authenticate"
        } else {
            "Please try again later"
        };
        Self::Transport {
            url: url.into(),
            status,
            hint: hint.to_owned(),
        }
    }

    /// Helper: build a `Transport` error for a request that failed before an
    /// HTTP status was available (connect failure, timeout).
    pub fn transport_io(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            status: 0,
            hint: detail.into(),
        }
    }

    /// Helper: build a `MalformedResponse` error.
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedResponse(detail.into())
    }
}
