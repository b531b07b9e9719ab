use algopack_core::params::DateLike;
use algopack_types::PeriodSpec;

/// Parameters for a candle series query.
#[derive(Debug, Clone)]
pub struct CandleQuery {
    /// Range start; equal to `end` for a single day.
    pub start: DateLike,
    /// Range end.
    pub end: DateLike,
    /// Candle granularity; defaults to one hour. Compound tokens
    /// (`"5min"`, `"2h"`, ...) fetch the base granularity and resample
    /// locally.
    pub period: Option<PeriodSpec>,
    /// Starting position in the record sequence.
    pub offset: Option<u64>,
    /// Yield the most recent record only.
    pub latest: bool,
}

impl CandleQuery {
    /// A query over an inclusive date range.
    pub fn range(start: impl Into<DateLike>, end: impl Into<DateLike>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            period: None,
            offset: None,
            latest: false,
        }
    }

    /// Set the candle granularity.
    #[must_use]
    pub fn period(mut self, period: impl Into<PeriodSpec>) -> Self {
        self.period = Some(period.into());
        self
    }

    /// Set the starting position.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Yield the most recent record only.
    #[must_use]
    pub const fn latest(mut self) -> Self {
        self.latest = true;
        self
    }
}

/// Parameters for a per-instrument metric query (tradestats, orderstats,
/// obstats, hi2, alerts, futoi).
#[derive(Debug, Clone, Default)]
pub struct StatQuery {
    /// Range start; required unless `end` is set.
    pub start: Option<DateLike>,
    /// Range end; defaults to `start`.
    pub end: Option<DateLike>,
    /// Starting position in the record sequence.
    pub offset: Option<u64>,
    /// Ask the service for the latest records in the set.
    pub latest: bool,
}

impl StatQuery {
    /// A query over an inclusive date range.
    pub fn range(start: impl Into<DateLike>, end: impl Into<DateLike>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
            ..Self::default()
        }
    }

    /// A single-day query.
    pub fn on(date: impl Into<DateLike>) -> Self {
        Self {
            start: Some(date.into()),
            ..Self::default()
        }
    }

    /// Set the starting position.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Ask the service for the latest records in the set.
    #[must_use]
    pub const fn latest(mut self) -> Self {
        self.latest = true;
        self
    }
}

/// Parameters for a whole-market metric query: one trading date.
#[derive(Debug, Clone, Default)]
pub struct MarketStatQuery {
    /// Trading date; defaults to today.
    pub date: Option<DateLike>,
    /// Starting position in the record sequence.
    pub offset: Option<u64>,
    /// Ask the service for the latest records in the set.
    pub latest: bool,
}

impl MarketStatQuery {
    /// A query for one trading date.
    pub fn on(date: impl Into<DateLike>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }

    /// Today's data.
    #[must_use]
    pub fn today() -> Self {
        Self::default()
    }

    /// Set the starting position.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Ask the service for the latest records in the set.
    #[must_use]
    pub const fn latest(mut self) -> Self {
        self.latest = true;
        self
    }
}

/// Parameters for a per-instrument trades query.
#[derive(Debug, Clone, Default)]
pub struct TradesQuery {
    /// Trade number to resume from; from the start of the day when unset.
    pub cursor: Option<i64>,
    /// Starting position in the record sequence.
    pub offset: Option<u64>,
    /// Yield the most recent record only.
    pub latest: bool,
}

impl TradesQuery {
    /// Trades from the start of the day.
    #[must_use]
    pub fn from_day_start() -> Self {
        Self::default()
    }

    /// Trades resuming from a trade number.
    #[must_use]
    pub const fn from_cursor(cursor: i64) -> Self {
        Self {
            cursor: Some(cursor),
            offset: None,
            latest: false,
        }
    }

    /// Yield the most recent record only.
    #[must_use]
    pub const fn latest(mut self) -> Self {
        self.latest = true;
        self
    }
}
