use algopack_core::fetch::{SectionQuery, collect, fetch_section};
use algopack_core::identity::{MarketId, SecurityIdentity};
use algopack_core::params::{UNBOUNDED, clamp_offset_limit, resolve_dates};
use algopack_core::{IssClient, RecordStream, resample};
use algopack_types::{AlgopackError, CandlePeriod, MetricFamily, PeriodSpec, Record};
use futures::TryStreamExt as _;
use futures::stream;

use crate::query::{CandleQuery, StatQuery, TradesQuery};

/// Default fields for a ticker's board-listing info.
const INFO_FIELDS: &[&str] = &[
    "title",
    "is_primary",
    "decimals",
    "is_traded",
    "market",
    "engine",
    "listed_from",
    "listed_till",
];

/// One resolved instrument: candles, trades, the order book, AlgoPack
/// metrics, and (for derivatives) open-interest metrics.
///
/// Obtained from [`crate::Algopack::ticker`]; resolution fixes the engine,
/// market, board, price precision, and delisting state once per handle.
#[derive(Debug, Clone)]
pub struct Ticker {
    iss: IssClient,
    identity: SecurityIdentity,
    market: MarketId,
}

impl Ticker {
    pub(crate) fn new(iss: IssClient, identity: SecurityIdentity) -> Self {
        let market = MarketId {
            engine: identity.engine.clone(),
            market: identity.market.clone(),
            board: identity.board.clone(),
        };
        Self {
            iss,
            identity,
            market,
        }
    }

    /// Canonical ticker.
    #[must_use]
    pub fn ticker(&self) -> &str {
        &self.identity.ticker
    }

    /// The board the instrument resolved on.
    #[must_use]
    pub fn board(&self) -> &str {
        &self.identity.board
    }

    /// Declared price precision in decimal places.
    #[must_use]
    pub const fn decimals(&self) -> u32 {
        self.identity.decimals
    }

    /// Whether the listing's validity window has already ended.
    #[must_use]
    pub const fn delisted(&self) -> bool {
        self.identity.delisted
    }

    /// The instrument's board-listing rows from the reference-data endpoint.
    ///
    /// `fields` limits the output; empty selects the default info set,
    /// `["*"]` selects everything.
    ///
    /// # Errors
    /// Propagates transport and wire-format failures.
    pub async fn info(&self, fields: &[&str]) -> Result<Vec<Record>, AlgopackError> {
        let select = if fields.contains(&"*") {
            Vec::new()
        } else if fields.is_empty() {
            INFO_FIELDS.to_vec()
        } else {
            fields.to_vec()
        };
        let response = self
            .iss
            .get_objects(&format!("securities/{}", self.identity.ticker), &[])
            .await?;
        let rows = response.records("boards", &select)?;
        Ok(rows
            .into_iter()
            .filter(|row| row.str("ticker") == Some(self.identity.ticker.as_str()))
            .collect())
    }

    /// Candle series over a date range.
    ///
    /// Native periods stream straight off the wire. Compound periods
    /// (`"5min"`, `"2h"`, ...) fetch the base granularity and resample
    /// locally, which buffers the series. `latest` reverses the service
    /// order and collapses the limit to the single most recent candle.
    ///
    /// # Errors
    /// [`AlgopackError::InvalidPeriod`] and [`AlgopackError::InvalidRange`]
    /// for bad parameters.
    pub fn candles(&self, query: CandleQuery) -> Result<RecordStream, AlgopackError> {
        let spec = query
            .period
            .unwrap_or(PeriodSpec::Period(CandlePeriod::I1h));
        let (period, resample_to) = spec.resolve()?;
        let (from, till) = resolve_dates(Some(query.start), Some(query.end))?;
        let (offset, limit) = clamp_offset_limit(query.offset, None, 10_000);
        let limit = if query.latest { 1 } else { limit };

        let mut section = SectionQuery::new(
            format!("{}/candles", self.market.security_path(&self.identity.ticker)),
            "candles",
            limit,
        )
        .offset(offset)
        .option("from", from)
        .option("till", till)
        .option("interval", period.interval());
        if query.latest {
            section = section.option("iss.reverse", "true");
        }

        let stream = fetch_section(self.iss.clone(), section);
        match resample_to {
            Some(minutes) if minutes != period.minutes() => {
                Ok(self.resampled(stream, MetricFamily::Candles, minutes))
            }
            _ => Ok(stream),
        }
    }

    /// Trades for the last day, or ascending from a trade number.
    ///
    /// # Errors
    /// Propagates transport and wire-format failures via the stream.
    pub fn trades(&self, query: TradesQuery) -> Result<RecordStream, AlgopackError> {
        let (offset, limit) = clamp_offset_limit(query.offset, None, 10_000);
        let limit = if query.latest { 1 } else { limit };
        let cursor_key = if matches!(self.identity.market.as_str(), "forts" | "options") {
            "recno"
        } else {
            "tradeno"
        };

        let mut section = SectionQuery::new(
            format!("{}/trades", self.market.security_path(&self.identity.ticker)),
            "trades",
            limit,
        )
        .offset(offset);
        if let Some(no) = query.cursor {
            section = section.option(cursor_key, no);
        }
        if query.latest {
            section = section.option("iss.reverse", "true");
        }
        Ok(fetch_section(self.iss.clone(), section))
    }

    /// The current order book of best prices.
    ///
    /// # Errors
    /// Returns [`AlgopackError::Unsupported`] for currency instruments; the
    /// service does not publish their books.
    pub fn orderbook(&self) -> Result<RecordStream, AlgopackError> {
        if self.identity.engine == "currency" {
            return Err(AlgopackError::unsupported(
                "orderbook for currency instruments",
            ));
        }
        let section = SectionQuery::new(
            format!(
                "{}/orderbook",
                self.market.security_path(&self.identity.ticker)
            ),
            "orderbook",
            UNBOUNDED,
        );
        Ok(fetch_section(self.iss.clone(), section))
    }

    /// Per-instrument `TradeStat` metrics over a date range.
    ///
    /// # Errors
    /// [`AlgopackError::Unsupported`] for markets without AlgoPack coverage;
    /// [`AlgopackError::InvalidRange`] when both dates are missing or the
    /// range is inverted.
    pub fn tradestats(&self, query: &StatQuery) -> Result<RecordStream, AlgopackError> {
        self.metric_stream("tradestats", query)
    }

    /// Per-instrument `OrderStat` metrics over a date range.
    ///
    /// # Errors
    /// See [`Ticker::tradestats`].
    pub fn orderstats(&self, query: &StatQuery) -> Result<RecordStream, AlgopackError> {
        self.metric_stream("orderstats", query)
    }

    /// Per-instrument `ObStat` metrics over a date range.
    ///
    /// # Errors
    /// See [`Ticker::tradestats`].
    pub fn obstats(&self, query: &StatQuery) -> Result<RecordStream, AlgopackError> {
        self.metric_stream("obstats", query)
    }

    /// Per-instrument market concentration (`hi2`) metrics.
    ///
    /// # Errors
    /// See [`Ticker::tradestats`].
    pub fn hi2(&self, query: &StatQuery) -> Result<RecordStream, AlgopackError> {
        self.metric_stream("hi2", query)
    }

    /// Per-instrument abnormal-activity alerts.
    ///
    /// # Errors
    /// See [`Ticker::tradestats`].
    pub fn alerts(&self, query: &StatQuery) -> Result<RecordStream, AlgopackError> {
        self.metric_stream("alerts", query)
    }

    /// Open-interest metrics by holder category over a date range.
    /// Derivatives only: the contract's asset code keys the endpoint, so the
    /// market ticker table is consulted once per call.
    ///
    /// # Errors
    /// [`AlgopackError::Unsupported`] outside the derivatives market;
    /// [`AlgopackError::Lookup`] when the contract has no `sectype`.
    pub async fn futoi(&self, query: &StatQuery) -> Result<RecordStream, AlgopackError> {
        if self.identity.market != "forts" {
            return Err(AlgopackError::unsupported(format!(
                "open interest metrics for market `{}`",
                self.identity.market
            )));
        }
        let (from, till) = resolve_dates(query.start.clone(), query.end.clone())?;
        let (offset, limit) = clamp_offset_limit(query.offset, None, 10_000);

        let sectype = self.lookup_sectype().await?;
        let mut section = SectionQuery::new(
            format!(
                "analyticalproducts/futoi/securities/{}",
                sectype.to_ascii_lowercase()
            ),
            "futoi",
            limit,
        )
        .offset(offset)
        .option("from", from)
        .option("till", till);
        if query.latest {
            section = section.option("latest", 1);
        }
        Ok(fetch_section(self.iss.clone(), section))
    }

    /// Re-bucket records of this instrument into coarser windows, rounding
    /// recomputed prices to the instrument's declared precision.
    ///
    /// # Errors
    /// See [`resample`].
    pub fn resample_records(
        &self,
        records: Vec<Record>,
        family: Option<MetricFamily>,
        target_minutes: u32,
    ) -> Result<Vec<Record>, AlgopackError> {
        resample(records, family, target_minutes, self.identity.decimals)
    }

    fn metric_stream(
        &self,
        metric: &str,
        query: &StatQuery,
    ) -> Result<RecordStream, AlgopackError> {
        let base = self.algopack_path()?;
        let (from, till) = resolve_dates(query.start.clone(), query.end.clone())?;
        let (offset, limit) = clamp_offset_limit(query.offset, None, 10_000);

        let mut section = SectionQuery::new(
            format!("{base}/{metric}/{}", self.identity.ticker.to_lowercase()),
            "data",
            limit,
        )
        .offset(offset)
        .option("from", from)
        .option("till", till);
        if query.latest {
            section = section.option("latest", 1);
        }
        Ok(fetch_section(self.iss.clone(), section))
    }

    fn algopack_path(&self) -> Result<&'static str, AlgopackError> {
        crate::market::algopack_base(&self.identity.market)
    }

    async fn lookup_sectype(&self) -> Result<String, AlgopackError> {
        let response = self.iss.get_objects(&self.market.securities_path(), &[]).await?;
        let rows = response.records("securities", &["sectype"])?;
        rows.iter()
            .find(|row| row.str("ticker") == Some(self.identity.ticker.as_str()))
            .and_then(|row| row.str("sectype").map(str::to_owned))
            .ok_or_else(|| {
                AlgopackError::lookup(format!("sectype for {}", self.identity.ticker))
            })
    }

    /// Collect, resample, and re-emit as a stream so the call shape matches
    /// the native-period path.
    fn resampled(
        &self,
        upstream: RecordStream,
        family: MetricFamily,
        target_minutes: u32,
    ) -> RecordStream {
        let decimals = self.identity.decimals;
        Box::pin(
            stream::once(async move {
                let records = collect(upstream).await?;
                let resampled = resample(records, Some(family), target_minutes, decimals)?;
                Ok::<_, AlgopackError>(stream::iter(resampled.into_iter().map(Ok)))
            })
            .try_flatten(),
        )
    }
}
