//! Synchronous wrappers over the async surface.
//!
//! Each blocking client owns a current-thread Tokio runtime and drives the
//! async implementation to completion per call, the same way a blocking HTTP
//! client wraps an async one. Semantics are identical; paginated queries
//! come back fully collected.

use std::sync::Arc;

use algopack_core::{RecordStream, collect};
use algopack_types::{AlgopackError, Record};
use tokio::runtime::Runtime;

use crate::client::AlgopackBuilder;
use crate::query::{CandleQuery, MarketStatQuery, StatQuery, TradesQuery};

fn runtime() -> Result<Arc<Runtime>, AlgopackError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map(Arc::new)
        .map_err(|e| AlgopackError::Validation(format!("cannot build runtime: {e}")))
}

/// Blocking counterpart of [`crate::Algopack`].
#[derive(Debug, Clone)]
pub struct Algopack {
    inner: crate::Algopack,
    rt: Arc<Runtime>,
}

impl Algopack {
    /// An anonymous blocking client against the public endpoint.
    ///
    /// # Errors
    /// See [`crate::Algopack::new`].
    pub fn new() -> Result<Self, AlgopackError> {
        Self::from_builder(crate::Algopack::builder())
    }

    /// Build from a configured [`AlgopackBuilder`].
    ///
    /// # Errors
    /// Propagates client and runtime construction failures.
    pub fn from_builder(builder: AlgopackBuilder) -> Result<Self, AlgopackError> {
        Ok(Self {
            inner: builder.build()?,
            rt: runtime()?,
        })
    }

    /// See [`crate::Algopack::market`].
    ///
    /// # Errors
    /// See [`crate::Algopack::market`].
    pub fn market(&self, name: &str) -> Result<Market, AlgopackError> {
        self.market_on(name, None)
    }

    /// See [`crate::Algopack::market_on`].
    ///
    /// # Errors
    /// See [`crate::Algopack::market_on`].
    pub fn market_on(&self, name: &str, board: Option<&str>) -> Result<Market, AlgopackError> {
        Ok(Market {
            inner: self.inner.market_on(name, board)?,
            rt: Arc::clone(&self.rt),
        })
    }

    /// See [`crate::Algopack::ticker`].
    ///
    /// # Errors
    /// See [`crate::Algopack::ticker`].
    pub fn ticker(&self, symbol: &str) -> Result<Ticker, AlgopackError> {
        self.ticker_on(symbol, None)
    }

    /// See [`crate::Algopack::ticker_on`].
    ///
    /// # Errors
    /// See [`crate::Algopack::ticker_on`].
    pub fn ticker_on(&self, symbol: &str, board: Option<&str>) -> Result<Ticker, AlgopackError> {
        let inner = self.rt.block_on(self.inner.ticker_on(symbol, board))?;
        Ok(Ticker {
            inner,
            rt: Arc::clone(&self.rt),
        })
    }
}

/// Blocking counterpart of [`crate::Market`].
#[derive(Debug, Clone)]
pub struct Market {
    inner: crate::Market,
    rt: Arc<Runtime>,
}

impl Market {
    fn drain(&self, stream: Result<RecordStream, AlgopackError>) -> Result<Vec<Record>, AlgopackError> {
        self.rt.block_on(collect(stream?))
    }

    /// See [`crate::Market::tickers`].
    ///
    /// # Errors
    /// See [`crate::Market::tickers`].
    pub fn tickers(&self, fields: &[&str]) -> Result<Vec<Record>, AlgopackError> {
        self.rt.block_on(self.inner.tickers(fields))
    }

    /// See [`crate::Market::marketdata`].
    ///
    /// # Errors
    /// See [`crate::Market::marketdata`].
    pub fn marketdata(&self, fields: &[&str]) -> Result<Vec<Record>, AlgopackError> {
        self.rt.block_on(self.inner.marketdata(fields))
    }

    /// See [`crate::Market::tradestats`].
    ///
    /// # Errors
    /// See [`crate::Market::tradestats`].
    pub fn tradestats(&self, query: &MarketStatQuery) -> Result<Vec<Record>, AlgopackError> {
        self.drain(self.inner.tradestats(query))
    }

    /// See [`crate::Market::orderstats`].
    ///
    /// # Errors
    /// See [`crate::Market::orderstats`].
    pub fn orderstats(&self, query: &MarketStatQuery) -> Result<Vec<Record>, AlgopackError> {
        self.drain(self.inner.orderstats(query))
    }

    /// See [`crate::Market::obstats`].
    ///
    /// # Errors
    /// See [`crate::Market::obstats`].
    pub fn obstats(&self, query: &MarketStatQuery) -> Result<Vec<Record>, AlgopackError> {
        self.drain(self.inner.obstats(query))
    }

    /// See [`crate::Market::hi2`].
    ///
    /// # Errors
    /// See [`crate::Market::hi2`].
    pub fn hi2(&self, query: &MarketStatQuery) -> Result<Vec<Record>, AlgopackError> {
        self.drain(self.inner.hi2(query))
    }

    /// See [`crate::Market::alerts`].
    ///
    /// # Errors
    /// See [`crate::Market::alerts`].
    pub fn alerts(&self, query: &MarketStatQuery) -> Result<Vec<Record>, AlgopackError> {
        self.drain(self.inner.alerts(query))
    }

    /// See [`crate::Market::futoi`].
    ///
    /// # Errors
    /// See [`crate::Market::futoi`].
    pub fn futoi(&self, query: &MarketStatQuery) -> Result<Vec<Record>, AlgopackError> {
        self.drain(self.inner.futoi(query))
    }

    /// See [`crate::Market::trades`].
    ///
    /// # Errors
    /// See [`crate::Market::trades`].
    pub fn trades(&self, cursor: Option<i64>) -> Result<Vec<Record>, AlgopackError> {
        self.rt.block_on(self.inner.trades(cursor))
    }

    /// See [`crate::Market::candles`].
    ///
    /// # Errors
    /// See [`crate::Market::candles`].
    pub fn candles(&self) -> Result<Vec<Record>, AlgopackError> {
        self.rt.block_on(self.inner.candles())
    }
}

/// Blocking counterpart of [`crate::Ticker`].
#[derive(Debug, Clone)]
pub struct Ticker {
    inner: crate::Ticker,
    rt: Arc<Runtime>,
}

impl Ticker {
    fn drain(&self, stream: Result<RecordStream, AlgopackError>) -> Result<Vec<Record>, AlgopackError> {
        self.rt.block_on(collect(stream?))
    }

    /// Canonical ticker.
    #[must_use]
    pub fn ticker(&self) -> &str {
        self.inner.ticker()
    }

    /// The board the instrument resolved on.
    #[must_use]
    pub fn board(&self) -> &str {
        self.inner.board()
    }

    /// Declared price precision in decimal places.
    #[must_use]
    pub const fn decimals(&self) -> u32 {
        self.inner.decimals()
    }

    /// Whether the listing's validity window has already ended.
    #[must_use]
    pub const fn delisted(&self) -> bool {
        self.inner.delisted()
    }

    /// See [`crate::Ticker::info`].
    ///
    /// # Errors
    /// See [`crate::Ticker::info`].
    pub fn info(&self, fields: &[&str]) -> Result<Vec<Record>, AlgopackError> {
        self.rt.block_on(self.inner.info(fields))
    }

    /// See [`crate::Ticker::candles`].
    ///
    /// # Errors
    /// See [`crate::Ticker::candles`].
    pub fn candles(&self, query: CandleQuery) -> Result<Vec<Record>, AlgopackError> {
        self.drain(self.inner.candles(query))
    }

    /// See [`crate::Ticker::trades`].
    ///
    /// # Errors
    /// See [`crate::Ticker::trades`].
    pub fn trades(&self, query: TradesQuery) -> Result<Vec<Record>, AlgopackError> {
        self.drain(self.inner.trades(query))
    }

    /// See [`crate::Ticker::orderbook`].
    ///
    /// # Errors
    /// See [`crate::Ticker::orderbook`].
    pub fn orderbook(&self) -> Result<Vec<Record>, AlgopackError> {
        self.drain(self.inner.orderbook())
    }

    /// See [`crate::Ticker::tradestats`].
    ///
    /// # Errors
    /// See [`crate::Ticker::tradestats`].
    pub fn tradestats(&self, query: &StatQuery) -> Result<Vec<Record>, AlgopackError> {
        self.drain(self.inner.tradestats(query))
    }

    /// See [`crate::Ticker::orderstats`].
    ///
    /// # Errors
    /// See [`crate::Ticker::orderstats`].
    pub fn orderstats(&self, query: &StatQuery) -> Result<Vec<Record>, AlgopackError> {
        self.drain(self.inner.orderstats(query))
    }

    /// See [`crate::Ticker::obstats`].
    ///
    /// # Errors
    /// See [`crate::Ticker::obstats`].
    pub fn obstats(&self, query: &StatQuery) -> Result<Vec<Record>, AlgopackError> {
        self.drain(self.inner.obstats(query))
    }

    /// See [`crate::Ticker::hi2`].
    ///
    /// # Errors
    /// See [`crate::Ticker::hi2`].
    pub fn hi2(&self, query: &StatQuery) -> Result<Vec<Record>, AlgopackError> {
        self.drain(self.inner.hi2(query))
    }

    /// See [`crate::Ticker::alerts`].
    ///
    /// # Errors
    /// See [`crate::Ticker::alerts`].
    pub fn alerts(&self, query: &StatQuery) -> Result<Vec<Record>, AlgopackError> {
        self.drain(self.inner.alerts(query))
    }

    /// See [`crate::Ticker::futoi`].
    ///
    /// # Errors
    /// See [`crate::Ticker::futoi`].
    pub fn futoi(&self, query: &StatQuery) -> Result<Vec<Record>, AlgopackError> {
        let stream = self.rt.block_on(self.inner.futoi(query))?;
        self.rt.block_on(collect(stream))
    }
}
