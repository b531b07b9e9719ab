//! algopack-core
//!
//! The request/pagination/type-coercion core of the algopack workspace:
//!
//! - `transport`: the narrow HTTP contract the core consumes, plus the
//!   production reqwest implementation.
//! - `throttle`: the shared inter-request rate limiter.
//! - `client`: the ISS client tying transport, throttling, and wire parsing
//!   together behind `get_objects`.
//! - `wire`: the `{metadata, columns, data}` block deserializer.
//! - `params`: date-window, offset/limit, and period normalization.
//! - `fetch`: the cursor pagination engine producing lazy record streams.
//! - `identity`: market alias and security/board resolution.
//! - `resample`: re-bucketing of candle and metric series.
//!
//! Async runtime (Tokio)
//! ---------------------
//! The crate assumes the Tokio ecosystem: the rate limiter sleeps with
//! `tokio::time`, and the pagination engine yields `futures::Stream`s that
//! must be polled under a Tokio 1.x runtime.
#![warn(missing_docs)]

/// The ISS client: throttled `get_objects` over a transport.
pub mod client;
/// Cursor pagination over response sections.
pub mod fetch;
/// Market aliases and security/board resolution.
pub mod identity;
/// Date-window, offset/limit, and period normalization.
pub mod params;
/// Re-bucketing of candle and metric record series.
pub mod resample;
/// Inter-request pacing shared across clients.
pub mod throttle;
/// The HTTP transport contract and reqwest implementation.
pub mod transport;
/// The `{metadata, columns, data}` wire format.
pub mod wire;

pub use algopack_types::{
    AlgopackError, CandlePeriod, MetricFamily, PeriodSpec, Record, ResamplePeriod, Value,
};
pub use client::IssClient;
pub use fetch::{RecordStream, SectionQuery, collect, fetch_section};
pub use identity::{MarketId, SecurityIdentity, resolve_market, resolve_security};
pub use params::{DateLike, QueryWindow};
pub use resample::resample;
pub use throttle::RateLimiter;
pub use transport::{RawResponse, ReqwestTransport, Transport};
pub use wire::{WireBlock, WireResponse};
