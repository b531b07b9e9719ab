//! algopack
//!
//! Typed Rust client for the MOEX ISS / AlgoPack market data service.
//!
//! The entry point is [`Algopack`]: build one (optionally with a bearer
//! token), then take [`Market`] and [`Ticker`] handles from it. Paginated
//! queries come back as lazy [`RecordStream`]s of typed [`Record`]s;
//! fixed-schema families additionally decode into the structs in
//! [`models`].
//!
//! ```no_run
//! use algopack::{Algopack, CandleQuery};
//! use futures::TryStreamExt;
//!
//! # async fn run() -> Result<(), algopack::AlgopackError> {
//! let client = Algopack::new()?;
//! let sber = client.ticker("SBER").await?;
//!
//! let candles = sber
//!     .candles(CandleQuery::range("2024-01-05", "2024-01-10").period("1h"))?
//!     .try_collect::<Vec<_>>()
//!     .await?;
//! println!("{} candles", candles.len());
//! # Ok(())
//! # }
//! ```
//!
//! Everything is async on Tokio; the [`blocking`] module wraps the same
//! surface behind an owned runtime for synchronous callers.
#![warn(missing_docs)]

/// Synchronous wrappers over the async surface.
pub mod blocking;
mod client;
mod market;
/// Typed views of the fixed-schema record families.
pub mod models;
mod query;
mod ticker;

pub use algopack_core::{
    DateLike, RateLimiter, RecordStream, Transport, collect, resample,
};
pub use algopack_types::{
    AlgopackError, CandlePeriod, MetricFamily, PeriodSpec, Record, ResamplePeriod, Value,
};
pub use client::{Algopack, AlgopackBuilder};
pub use market::Market;
pub use models::{Candle, FromRecord, FutOi, ObStat, OrderStat, TradeStat};
pub use query::{CandleQuery, MarketStatQuery, StatQuery, TradesQuery};
pub use ticker::Ticker;
