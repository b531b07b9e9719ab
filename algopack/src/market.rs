use algopack_core::fetch::{SectionQuery, fetch_section};
use algopack_core::identity::MarketId;
use algopack_core::params::{DateLike, clamp_offset_limit, resolve_dates};
use algopack_core::{IssClient, RecordStream};
use algopack_types::{AlgopackError, Record, Value};
use chrono::{Duration, NaiveDateTime, Timelike};

use crate::query::MarketStatQuery;

/// Default reference-data fields for the equities market.
const SHARES_TICKERS_FIELDS: &[&str] = &[
    "shortname", "lotsize", "decimals", "minstep", "issuesize", "isin", "regnumber", "listlevel",
];

/// Default reference-data fields for the derivatives market.
const FORTS_TICKERS_FIELDS: &[&str] = &[
    "sectype",
    "assetcode",
    "shortname",
    "lotvolume",
    "decimals",
    "minstep",
    "initialmargin",
    "lasttradedate",
];

/// Default reference-data fields for the currency market.
const SELT_TICKERS_FIELDS: &[&str] = &["shortname", "lotsize", "decimals", "minstep", "secname"];

/// Default intraday statistics fields, shared across markets.
const MARKETDATA_FIELDS: &[&str] = &[
    "bid",
    "offer",
    "biddeptht",
    "offerdeptht",
    "open",
    "high",
    "low",
    "last",
    "waprice",
    "lasttoprevprice",
    "numtrades",
    "voltoday",
    "valtoday",
    "valtoday_usd",
    "openperiodprice",
    "closingauctionprice",
    "closingauctionvolume",
    "issuecapitalization",
    "updatetime",
    "systime",
];

/// A section of the exchange: one `(engine, market, board)` triple.
///
/// Exposes market-wide reference data, the AlgoPack metric families, the
/// trades feed, and (for derivatives) open-interest metrics.
#[derive(Debug, Clone)]
pub struct Market {
    iss: IssClient,
    id: MarketId,
}

impl Market {
    pub(crate) const fn new(iss: IssClient, id: MarketId) -> Self {
        Self { iss, id }
    }

    /// The resolved `(engine, market, board)` triple.
    #[must_use]
    pub const fn id(&self) -> &MarketId {
        &self.id
    }

    /// Reference data for every instrument on the board.
    ///
    /// `fields` limits the output; empty selects the market's default field
    /// set, `["*"]` selects everything.
    ///
    /// # Errors
    /// Propagates transport and wire-format failures.
    pub async fn tickers(&self, fields: &[&str]) -> Result<Vec<Record>, AlgopackError> {
        let defaults = match self.id.market.as_str() {
            "shares" => SHARES_TICKERS_FIELDS,
            "forts" => FORTS_TICKERS_FIELDS,
            "selt" => SELT_TICKERS_FIELDS,
            _ => &[],
        };
        let select = effective_fields(fields, defaults);
        let response = self.iss.get_objects(&self.id.securities_path(), &[]).await?;
        response.records("securities", &select)
    }

    /// Intraday statistics for every instrument on the board.
    ///
    /// # Errors
    /// Propagates transport and wire-format failures.
    pub async fn marketdata(&self, fields: &[&str]) -> Result<Vec<Record>, AlgopackError> {
        let defaults = match self.id.market.as_str() {
            "shares" | "forts" | "selt" => MARKETDATA_FIELDS,
            _ => &[],
        };
        let select = effective_fields(fields, defaults);
        let response = self.iss.get_objects(&self.id.securities_path(), &[]).await?;
        response.records("marketdata", &select)
    }

    /// Market-wide `TradeStat` metrics for one trading date.
    ///
    /// # Errors
    /// Returns [`AlgopackError::Unsupported`] for markets without AlgoPack
    /// coverage; date errors per [`resolve_dates`].
    pub fn tradestats(&self, query: &MarketStatQuery) -> Result<RecordStream, AlgopackError> {
        self.metric_stream("tradestats", query)
    }

    /// Market-wide `OrderStat` metrics for one trading date.
    ///
    /// # Errors
    /// See [`Market::tradestats`].
    pub fn orderstats(&self, query: &MarketStatQuery) -> Result<RecordStream, AlgopackError> {
        self.metric_stream("orderstats", query)
    }

    /// Market-wide `ObStat` metrics for one trading date.
    ///
    /// # Errors
    /// See [`Market::tradestats`].
    pub fn obstats(&self, query: &MarketStatQuery) -> Result<RecordStream, AlgopackError> {
        self.metric_stream("obstats", query)
    }

    /// Market concentration (`hi2`) metrics for one trading date.
    ///
    /// # Errors
    /// See [`Market::tradestats`].
    pub fn hi2(&self, query: &MarketStatQuery) -> Result<RecordStream, AlgopackError> {
        self.metric_stream("hi2", query)
    }

    /// Abnormal-activity alerts for one trading date.
    ///
    /// # Errors
    /// See [`Market::tradestats`].
    pub fn alerts(&self, query: &MarketStatQuery) -> Result<RecordStream, AlgopackError> {
        self.metric_stream("alerts", query)
    }

    /// Open-interest metrics by holder category for one trading date.
    /// Derivatives market only.
    ///
    /// # Errors
    /// Returns [`AlgopackError::Unsupported`] outside the derivatives market.
    pub fn futoi(&self, query: &MarketStatQuery) -> Result<RecordStream, AlgopackError> {
        let path = self.futoi_path()?;
        let date = query.date.clone().unwrap_or_else(|| DateLike::from("today"));
        let (date, _) = resolve_dates(Some(date), None)?;
        let (offset, limit) = clamp_offset_limit(query.offset, None, 10_000);

        let mut section = SectionQuery::new(path, "futoi", limit)
            .offset(offset)
            .option("date", date);
        if query.latest {
            section = section.option("latest", 1);
        }
        Ok(fetch_section(self.iss.clone(), section))
    }

    /// Recent trades across the whole market: in reverse order when `cursor`
    /// is unset, ascending from the given trade number otherwise.
    ///
    /// # Errors
    /// Propagates transport and wire-format failures.
    pub async fn trades(&self, cursor: Option<i64>) -> Result<Vec<Record>, AlgopackError> {
        let mut params: Vec<(String, String)> = Vec::new();
        match cursor {
            Some(no) => params.push((self.trade_cursor_key().to_owned(), no.to_string())),
            None => params.push(("reversed".to_owned(), "1".to_owned())),
        }
        let path = format!(
            "engines/{}/markets/{}/boards/{}/trades",
            self.id.engine, self.id.market, self.id.board
        );
        let response = self.iss.get_objects(&path, &params).await?;
        response.records("trades", &[])
    }

    /// The two most recent minute candles per instrument, assembled locally
    /// from the trades feed (the service has no market-wide candles
    /// endpoint).
    ///
    /// # Errors
    /// Propagates transport failures;
    /// [`AlgopackError::MalformedResponse`] when the trades feed lacks the
    /// time fields the assembly needs.
    pub async fn candles(&self) -> Result<Vec<Record>, AlgopackError> {
        let mut trades = self.trades(None).await?;
        trades.reverse();
        if trades.is_empty() {
            return Ok(Vec::new());
        }

        let last = &trades[trades.len() - 1];
        let today = last
            .datetime("systime")
            .map(|dt| dt.date())
            .ok_or_else(|| AlgopackError::malformed("trades feed has no `systime`"))?;
        let trade_ts = |record: &Record| -> Result<NaiveDateTime, AlgopackError> {
            record
                .time("tradetime")
                .map(|t| today.and_time(t))
                .ok_or_else(|| AlgopackError::malformed("trade record has no `tradetime`"))
        };

        let finish = trade_ts(last)?;
        let minute_start = finish
            .with_second(0)
            .and_then(|dt| dt.with_nanosecond(0))
            .unwrap_or(finish);
        let begin = minute_start - Duration::minutes(1);
        let end = minute_start + Duration::minutes(1);

        // Walk the feed backwards until the two-minute window is covered.
        let cursor_key = self.trade_cursor_key();
        let mut first_ts = trade_ts(&trades[0])?;
        let mut rounds = 0;
        while begin < first_ts && rounds < 8 {
            let Some(first_no) = trades[0].int(cursor_key) else {
                break;
            };
            let from = (first_no - 3000).max(0);
            let mut earlier: Vec<Record> = self
                .trades(Some(from))
                .await?
                .into_iter()
                .filter(|t| t.int(cursor_key).is_some_and(|no| no < first_no))
                .collect();
            if earlier.is_empty() {
                break;
            }
            earlier.extend(trades);
            trades = earlier;
            first_ts = trade_ts(&trades[0])?;
            rounds += 1;
        }

        let mut window: Vec<(String, NaiveDateTime, f64, f64, f64)> = Vec::new();
        for trade in &trades {
            let ts = trade_ts(trade)?;
            if ts < begin || ts >= end {
                continue;
            }
            window.push((
                trade.str("ticker").unwrap_or_default().to_owned(),
                ts,
                trade.float("price").unwrap_or(0.0),
                trade.float("quantity").unwrap_or(0.0),
                trade.float("value").unwrap_or(0.0),
            ));
        }
        Ok(minute_candles(window, begin))
    }

    fn metric_stream(
        &self,
        metric: &str,
        query: &MarketStatQuery,
    ) -> Result<RecordStream, AlgopackError> {
        let base = self.algopack_path()?;
        let date = query.date.clone().unwrap_or_else(|| DateLike::from("today"));
        let (date, _) = resolve_dates(Some(date), None)?;
        let (offset, limit) = clamp_offset_limit(query.offset, None, 50_000);

        let mut section = SectionQuery::new(format!("{base}/{metric}"), "data", limit)
            .offset(offset)
            .option("date", date);
        if query.latest {
            section = section.option("latest", 1);
        }
        Ok(fetch_section(self.iss.clone(), section))
    }

    fn algopack_path(&self) -> Result<&'static str, AlgopackError> {
        algopack_base(&self.id.market)
    }

    fn futoi_path(&self) -> Result<&'static str, AlgopackError> {
        if self.id.market == "forts" {
            Ok("analyticalproducts/futoi/securities")
        } else {
            Err(AlgopackError::unsupported(format!(
                "open interest metrics for market `{}`",
                self.id.market
            )))
        }
    }

    fn trade_cursor_key(&self) -> &'static str {
        if matches!(self.id.market.as_str(), "forts" | "options") {
            "recno"
        } else {
            "tradeno"
        }
    }
}

/// The AlgoPack category path for a market, shared by the market- and
/// instrument-level endpoints.
pub(crate) fn algopack_base(market: &str) -> Result<&'static str, AlgopackError> {
    match market {
        "shares" => Ok("datashop/algopack/eq"),
        "forts" => Ok("datashop/algopack/fo"),
        "selt" => Ok("datashop/algopack/fx"),
        other => Err(AlgopackError::unsupported(format!(
            "AlgoPack metrics for market `{other}`"
        ))),
    }
}

fn effective_fields<'a>(fields: &[&'a str], defaults: &[&'a str]) -> Vec<&'a str> {
    if fields.contains(&"*") {
        Vec::new()
    } else if fields.is_empty() {
        defaults.to_vec()
    } else {
        fields.to_vec()
    }
}

/// Group trades into successive one-minute candles per ticker.
fn minute_candles(
    mut trades: Vec<(String, NaiveDateTime, f64, f64, f64)>,
    begin: NaiveDateTime,
) -> Vec<Record> {
    trades.sort_by(|a, b| (a.0.as_str(), a.1).cmp(&(b.0.as_str(), b.1)));

    let mut out = Vec::new();
    let mut bucket: Vec<&(String, NaiveDateTime, f64, f64, f64)> = Vec::new();
    let mut current: Option<&str> = None;
    let mut window_end = begin + Duration::minutes(1);

    let flush = |bucket: &mut Vec<&(String, NaiveDateTime, f64, f64, f64)>,
                     window_end: NaiveDateTime,
                     out: &mut Vec<Record>| {
        if bucket.is_empty() {
            return;
        }
        let prices: Vec<f64> = bucket.iter().map(|t| t.2).collect();
        let mut rec = Record::new();
        rec.push("ticker", Value::Str(bucket[0].0.clone()));
        rec.push("open", Value::Float(prices[0]));
        rec.push(
            "high",
            Value::Float(prices.iter().copied().fold(f64::MIN, f64::max)),
        );
        rec.push(
            "low",
            Value::Float(prices.iter().copied().fold(f64::MAX, f64::min)),
        );
        rec.push("close", Value::Float(prices[prices.len() - 1]));
        rec.push(
            "volume",
            Value::Int(bucket.iter().map(|t| t.3).sum::<f64>() as i64),
        );
        let value = bucket.iter().map(|t| t.4).sum::<f64>();
        rec.push("value", Value::Float((value * 10.0).round() / 10.0));
        rec.push(
            "begin",
            Value::DateTime(window_end - Duration::minutes(1)),
        );
        rec.push("end", Value::DateTime(window_end - Duration::seconds(1)));
        bucket.clear();
        out.push(rec);
    };

    for trade in &trades {
        if current != Some(trade.0.as_str()) {
            flush(&mut bucket, window_end, &mut out);
            current = Some(trade.0.as_str());
            window_end = begin + Duration::minutes(1);
        }
        while trade.1 >= window_end {
            flush(&mut bucket, window_end, &mut out);
            window_end += Duration::minutes(1);
        }
        bucket.push(trade);
    }
    flush(&mut bucket, window_end, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::minute_candles;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(10, m, s)
            .unwrap()
    }

    #[test]
    fn trades_collapse_into_per_ticker_minutes() {
        let begin = ts(0, 0);
        let trades = vec![
            ("SBER".to_owned(), ts(0, 5), 280.0, 10.0, 2800.0),
            ("SBER".to_owned(), ts(0, 40), 281.0, 5.0, 1405.0),
            ("SBER".to_owned(), ts(1, 10), 282.0, 1.0, 282.0),
            ("GAZP".to_owned(), ts(0, 20), 160.0, 2.0, 320.0),
        ];

        let candles = minute_candles(trades, begin);
        assert_eq!(candles.len(), 3);

        let sber_first = &candles[1];
        assert_eq!(sber_first.str("ticker"), Some("SBER"));
        assert_eq!(sber_first.float("open"), Some(280.0));
        assert_eq!(sber_first.float("close"), Some(281.0));
        assert_eq!(sber_first.int("volume"), Some(15));
        assert_eq!(sber_first.datetime("begin"), Some(ts(0, 0)));
        assert_eq!(sber_first.datetime("end"), Some(ts(0, 59)));

        let gazp = &candles[0];
        assert_eq!(gazp.str("ticker"), Some("GAZP"));
        assert_eq!(gazp.float("open"), Some(160.0));
    }
}
