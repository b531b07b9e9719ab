use algopack_types::AlgopackError;
use chrono::{Local, NaiveDate};

/// Lowest accepted page limit.
pub const MIN_LIMIT: i64 = 1;
/// Highest accepted page limit.
pub const MAX_LIMIT: i64 = 50_000;
/// Default page limit when the caller does not supply one.
pub const DEFAULT_LIMIT: i64 = 10_000;
/// The distinguished "no cap, drain until an empty page" limit.
pub const UNBOUNDED: i64 = -1;

/// A date argument in any accepted shape: a native date, an ISO string, or
/// the literal `"today"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateLike {
    /// Already-resolved date.
    Date(NaiveDate),
    /// ISO `YYYY-MM-DD` string or `"today"`.
    Text(String),
}

impl DateLike {
    /// Resolve to a concrete date; `"today"` resolves against the local clock.
    ///
    /// # Errors
    /// Returns [`AlgopackError::InvalidRange`] for non-ISO text.
    pub fn resolve(&self) -> Result<NaiveDate, AlgopackError> {
        match self {
            Self::Date(d) => Ok(*d),
            Self::Text(s) if s == "today" => Ok(Local::now().date_naive()),
            Self::Text(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| AlgopackError::InvalidRange(format!("`{s}` is not an ISO date"))),
        }
    }
}

impl From<NaiveDate> for DateLike {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<&str> for DateLike {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for DateLike {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// A normalized query window: resolved date range, clamped offset/limit, and
/// the most-recent-first flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    /// Range start, inclusive.
    pub from: NaiveDate,
    /// Range end, inclusive; defaults to `from`.
    pub till: NaiveDate,
    /// Starting cursor position.
    pub offset: u64,
    /// Record cap, or [`UNBOUNDED`].
    pub limit: i64,
    /// Most-recent-first mode; collapses the effective limit to 1.
    pub latest: bool,
}

impl QueryWindow {
    /// Validate and canonicalize a caller-supplied window.
    ///
    /// Either date may be omitted (the present one covers both ends), but at
    /// least one is required. `default_limit` is the call site's page limit
    /// when the caller passes none.
    ///
    /// # Errors
    /// Returns [`AlgopackError::InvalidRange`] when both dates are missing,
    /// a date does not parse, or the range is inverted.
    pub fn normalize(
        from: Option<DateLike>,
        till: Option<DateLike>,
        offset: Option<u64>,
        limit: Option<i64>,
        default_limit: i64,
    ) -> Result<Self, AlgopackError> {
        let (from, till) = resolve_dates(from, till)?;
        let (offset, limit) = clamp_offset_limit(offset, limit, default_limit);
        Ok(Self {
            from,
            till,
            offset,
            limit,
            latest: false,
        })
    }

    /// Enable most-recent-first mode.
    #[must_use]
    pub const fn latest(mut self) -> Self {
        self.latest = true;
        self
    }
}

/// Resolve a `(from, till)` pair; a missing side defaults to the other.
///
/// # Errors
/// Returns [`AlgopackError::InvalidRange`] when both are missing, either
/// fails to parse, or `from > till`.
pub fn resolve_dates(
    from: Option<DateLike>,
    till: Option<DateLike>,
) -> Result<(NaiveDate, NaiveDate), AlgopackError> {
    let (from, till) = match (from, till) {
        (None, None) => {
            return Err(AlgopackError::InvalidRange(
                "a date or a from/till range is required".to_owned(),
            ));
        }
        (Some(f), None) => {
            let f = f.resolve()?;
            (f, f)
        }
        (None, Some(t)) => {
            let t = t.resolve()?;
            (t, t)
        }
        (Some(f), Some(t)) => (f.resolve()?, t.resolve()?),
    };
    if from > till {
        return Err(AlgopackError::InvalidRange(format!(
            "from {from} is after till {till}"
        )));
    }
    Ok((from, till))
}

/// Clamp an offset/limit pair into the service's accepted ranges.
///
/// The offset defaults to 0 and resets to 0 outside `[0, MAX_LIMIT)`. The
/// limit defaults to `default_limit`, passes [`UNBOUNDED`] through unchanged,
/// and clamps into `[MIN_LIMIT, MAX_LIMIT]` otherwise.
#[must_use]
pub fn clamp_offset_limit(offset: Option<u64>, limit: Option<i64>, default_limit: i64) -> (u64, i64) {
    let offset = offset.unwrap_or(0);
    let offset = if offset < MAX_LIMIT as u64 { offset } else { 0 };
    let limit = match limit {
        Some(UNBOUNDED) => UNBOUNDED,
        Some(l) => l.clamp(MIN_LIMIT, MAX_LIMIT),
        None => default_limit,
    };
    (offset, limit)
}
