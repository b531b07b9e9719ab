//! Typed views of the fixed-schema record families.
//!
//! Wire records stay dynamically shaped ([`Record`]); the families with a
//! stable schema additionally decode into these structs. Monetary and price
//! fields use [`Decimal`]; a field the service declares nullable is an
//! `Option` here, and an unknown field name fails the decode rather than
//! reading as null.

use algopack_types::{AlgopackError, Record, Value};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

/// Decode a typed view from a [`Record`].
pub trait FromRecord: Sized {
    /// Decode, failing on missing required fields or type mismatches.
    ///
    /// # Errors
    /// Returns [`AlgopackError::MalformedResponse`] naming the offending
    /// field.
    fn from_record(record: &Record) -> Result<Self, AlgopackError>;
}

/// An open/high/low/close/volume summary over one time bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    /// First trade price in the bucket.
    pub open: Decimal,
    /// Last trade price in the bucket.
    pub close: Decimal,
    /// Highest trade price.
    pub high: Decimal,
    /// Lowest trade price.
    pub low: Decimal,
    /// Turnover in money.
    pub value: Decimal,
    /// Turnover in lots.
    pub volume: Decimal,
    /// Bucket start.
    pub begin: NaiveDateTime,
    /// Bucket end.
    pub end: NaiveDateTime,
}

impl FromRecord for Candle {
    fn from_record(record: &Record) -> Result<Self, AlgopackError> {
        Ok(Self {
            open: req_dec(record, "open")?,
            close: req_dec(record, "close")?,
            high: req_dec(record, "high")?,
            low: req_dec(record, "low")?,
            value: req_dec(record, "value")?,
            volume: req_dec(record, "volume")?,
            begin: req_datetime(record, "begin")?,
            end: req_datetime(record, "end")?,
        })
    }
}

/// One `tradestats` row: executed-trade statistics for a five-minute bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeStat {
    /// Instrument ticker.
    pub ticker: String,
    /// Bucket timestamp.
    pub ts: NaiveDateTime,
    /// Open price of the bucket.
    pub pr_open: Decimal,
    /// High price of the bucket.
    pub pr_high: Decimal,
    /// Low price of the bucket.
    pub pr_low: Decimal,
    /// Close price of the bucket.
    pub pr_close: Decimal,
    /// Price change over the bucket, percent.
    pub pr_change: Option<Decimal>,
    /// Number of trades.
    pub trades: i64,
    /// Traded volume, lots.
    pub vol: i64,
    /// Traded value, money.
    pub val: Decimal,
    /// Price standard deviation.
    pub pr_std: Option<Decimal>,
    /// Buy/sell volume imbalance ratio.
    pub disb: Option<Decimal>,
    /// Volume-weighted average price.
    pub pr_vwap: Option<Decimal>,
    /// Buy-side trade count.
    pub trades_b: i64,
    /// Buy-side volume, lots.
    pub vol_b: i64,
    /// Buy-side value, money.
    pub val_b: Decimal,
    /// Buy-side VWAP.
    pub pr_vwap_b: Option<Decimal>,
    /// Sell-side trade count.
    pub trades_s: i64,
    /// Sell-side volume, lots.
    pub vol_s: i64,
    /// Sell-side value, money.
    pub val_s: Decimal,
    /// Sell-side VWAP.
    pub pr_vwap_s: Option<Decimal>,
}

impl FromRecord for TradeStat {
    fn from_record(record: &Record) -> Result<Self, AlgopackError> {
        Ok(Self {
            ticker: req_str(record, "ticker")?,
            ts: metric_ts(record)?,
            pr_open: req_dec(record, "pr_open")?,
            pr_high: req_dec(record, "pr_high")?,
            pr_low: req_dec(record, "pr_low")?,
            pr_close: req_dec(record, "pr_close")?,
            pr_change: opt_dec(record, "pr_change")?,
            trades: req_int(record, "trades")?,
            vol: req_int(record, "vol")?,
            val: req_dec(record, "val")?,
            pr_std: opt_dec(record, "pr_std")?,
            disb: opt_dec(record, "disb")?,
            pr_vwap: opt_dec(record, "pr_vwap")?,
            trades_b: req_int(record, "trades_b")?,
            vol_b: req_int(record, "vol_b")?,
            val_b: req_dec(record, "val_b")?,
            pr_vwap_b: opt_dec(record, "pr_vwap_b")?,
            trades_s: req_int(record, "trades_s")?,
            vol_s: req_int(record, "vol_s")?,
            val_s: req_dec(record, "val_s")?,
            pr_vwap_s: opt_dec(record, "pr_vwap_s")?,
        })
    }
}

/// One `orderstats` row: submitted/cancelled order statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStat {
    /// Instrument ticker.
    pub ticker: String,
    /// Bucket timestamp.
    pub ts: NaiveDateTime,
    /// Orders put into the book.
    pub put_orders: i64,
    /// Buy orders put into the book.
    pub put_orders_b: i64,
    /// Sell orders put into the book.
    pub put_orders_s: i64,
    /// Put volume, lots.
    pub put_vol: i64,
    /// Buy-side put volume, lots.
    pub put_vol_b: i64,
    /// Sell-side put volume, lots.
    pub put_vol_s: i64,
    /// Put value, money.
    pub put_val: Decimal,
    /// Buy-side put value, money.
    pub put_val_b: Decimal,
    /// Sell-side put value, money.
    pub put_val_s: Decimal,
    /// Cancelled orders.
    pub cancel_orders: i64,
    /// Cancelled buy orders.
    pub cancel_orders_b: i64,
    /// Cancelled sell orders.
    pub cancel_orders_s: i64,
    /// Cancelled volume, lots.
    pub cancel_vol: i64,
    /// Cancelled buy volume, lots.
    pub cancel_vol_b: i64,
    /// Cancelled sell volume, lots.
    pub cancel_vol_s: i64,
    /// Cancelled value, money.
    pub cancel_val: Decimal,
    /// Cancelled buy value, money.
    pub cancel_val_b: Decimal,
    /// Cancelled sell value, money.
    pub cancel_val_s: Decimal,
    /// VWAP of buy orders put into the book.
    pub put_vwap_b: Option<Decimal>,
    /// VWAP of sell orders put into the book.
    pub put_vwap_s: Option<Decimal>,
    /// VWAP of cancelled buy orders.
    pub cancel_vwap_b: Option<Decimal>,
    /// VWAP of cancelled sell orders.
    pub cancel_vwap_s: Option<Decimal>,
}

impl FromRecord for OrderStat {
    fn from_record(record: &Record) -> Result<Self, AlgopackError> {
        Ok(Self {
            ticker: req_str(record, "ticker")?,
            ts: metric_ts(record)?,
            put_orders: req_int(record, "put_orders")?,
            put_orders_b: req_int(record, "put_orders_b")?,
            put_orders_s: req_int(record, "put_orders_s")?,
            put_vol: req_int(record, "put_vol")?,
            put_vol_b: req_int(record, "put_vol_b")?,
            put_vol_s: req_int(record, "put_vol_s")?,
            put_val: req_dec(record, "put_val")?,
            put_val_b: req_dec(record, "put_val_b")?,
            put_val_s: req_dec(record, "put_val_s")?,
            cancel_orders: req_int(record, "cancel_orders")?,
            cancel_orders_b: req_int(record, "cancel_orders_b")?,
            cancel_orders_s: req_int(record, "cancel_orders_s")?,
            cancel_vol: req_int(record, "cancel_vol")?,
            cancel_vol_b: req_int(record, "cancel_vol_b")?,
            cancel_vol_s: req_int(record, "cancel_vol_s")?,
            cancel_val: req_dec(record, "cancel_val")?,
            cancel_val_b: req_dec(record, "cancel_val_b")?,
            cancel_val_s: req_dec(record, "cancel_val_s")?,
            put_vwap_b: opt_dec(record, "put_vwap_b")?,
            put_vwap_s: opt_dec(record, "put_vwap_s")?,
            cancel_vwap_b: opt_dec(record, "cancel_vwap_b")?,
            cancel_vwap_s: opt_dec(record, "cancel_vwap_s")?,
        })
    }
}

/// One `obstats` row: an order-book snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ObStat {
    /// Instrument ticker.
    pub ticker: String,
    /// Snapshot timestamp.
    pub ts: NaiveDateTime,
    /// Best bid/offer spread.
    pub spread_bbo: Option<Decimal>,
    /// Spread at the tenth price level.
    pub spread_lv10: Option<Decimal>,
    /// Spread for a 1M-unit notional.
    pub spread_1mio: Option<Decimal>,
    /// Bid-side price levels.
    pub levels_b: i64,
    /// Ask-side price levels.
    pub levels_s: i64,
    /// Bid-side depth, lots.
    pub vol_b: i64,
    /// Ask-side depth, lots.
    pub vol_s: i64,
    /// Bid-side depth, money.
    pub val_b: Decimal,
    /// Ask-side depth, money.
    pub val_s: Decimal,
    /// Volume imbalance at the best prices.
    pub imbalance_vol_bbo: Option<Decimal>,
    /// Value imbalance at the best prices.
    pub imbalance_val_bbo: Option<Decimal>,
    /// Volume imbalance across the whole book.
    pub imbalance_vol: Option<Decimal>,
    /// Value imbalance across the whole book.
    pub imbalance_val: Option<Decimal>,
    /// Bid-side VWAP.
    pub vwap_b: Option<Decimal>,
    /// Ask-side VWAP.
    pub vwap_s: Option<Decimal>,
    /// Buy price for a 1M-unit notional.
    pub vwap_b_1mio: Option<Decimal>,
    /// Sell price for a 1M-unit notional.
    pub vwap_s_1mio: Option<Decimal>,
}

impl FromRecord for ObStat {
    fn from_record(record: &Record) -> Result<Self, AlgopackError> {
        Ok(Self {
            ticker: req_str(record, "ticker")?,
            ts: metric_ts(record)?,
            spread_bbo: opt_dec(record, "spread_bbo")?,
            spread_lv10: opt_dec(record, "spread_lv10")?,
            spread_1mio: opt_dec(record, "spread_1mio")?,
            levels_b: req_int(record, "levels_b")?,
            levels_s: req_int(record, "levels_s")?,
            vol_b: req_int(record, "vol_b")?,
            vol_s: req_int(record, "vol_s")?,
            val_b: req_dec(record, "val_b")?,
            val_s: req_dec(record, "val_s")?,
            imbalance_vol_bbo: opt_dec(record, "imbalance_vol_bbo")?,
            imbalance_val_bbo: opt_dec(record, "imbalance_val_bbo")?,
            imbalance_vol: opt_dec(record, "imbalance_vol")?,
            imbalance_val: opt_dec(record, "imbalance_val")?,
            vwap_b: opt_dec(record, "vwap_b")?,
            vwap_s: opt_dec(record, "vwap_s")?,
            vwap_b_1mio: opt_dec(record, "vwap_b_1mio")?,
            vwap_s_1mio: opt_dec(record, "vwap_s_1mio")?,
        })
    }
}

/// One open-interest row: outstanding positions by holder category.
#[derive(Debug, Clone, PartialEq)]
pub struct FutOi {
    /// Contract asset code.
    pub ticker: String,
    /// Row timestamp.
    pub ts: NaiveDateTime,
    /// Holder category (`YUR` legal entities, `FIZ` individuals).
    pub clgroup: String,
    /// Net position, contracts.
    pub pos: i64,
    /// Long positions, contracts.
    pub pos_long: i64,
    /// Short positions, contracts.
    pub pos_short: i64,
    /// Holders with long positions.
    pub pos_long_num: i64,
    /// Holders with short positions.
    pub pos_short_num: i64,
}

impl FromRecord for FutOi {
    fn from_record(record: &Record) -> Result<Self, AlgopackError> {
        Ok(Self {
            ticker: req_str(record, "ticker")?,
            ts: metric_ts(record)?,
            clgroup: req_str(record, "clgroup")?,
            pos: req_int(record, "pos")?,
            pos_long: req_int(record, "pos_long")?,
            pos_short: req_int(record, "pos_short")?,
            pos_long_num: req_int(record, "pos_long_num")?,
            pos_short_num: req_int(record, "pos_short_num")?,
        })
    }
}

fn missing(name: &str) -> AlgopackError {
    AlgopackError::malformed(format!("record has no usable `{name}` field"))
}

fn req_str(record: &Record, name: &str) -> Result<String, AlgopackError> {
    record
        .str(name)
        .map(str::to_owned)
        .ok_or_else(|| missing(name))
}

fn req_int(record: &Record, name: &str) -> Result<i64, AlgopackError> {
    match record.get(name) {
        Some(Value::Int(v)) => Ok(*v),
        Some(Value::Float(v)) if v.fract() == 0.0 => Ok(*v as i64),
        _ => Err(missing(name)),
    }
}

fn req_dec(record: &Record, name: &str) -> Result<Decimal, AlgopackError> {
    opt_dec(record, name)?.ok_or_else(|| missing(name))
}

fn opt_dec(record: &Record, name: &str) -> Result<Option<Decimal>, AlgopackError> {
    match record.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Int(v)) => Ok(Some(Decimal::from(*v))),
        Some(Value::Float(v)) => Decimal::from_f64(*v)
            .map(Some)
            .ok_or_else(|| missing(name)),
        Some(_) => Err(missing(name)),
    }
}

fn req_datetime(record: &Record, name: &str) -> Result<NaiveDateTime, AlgopackError> {
    record.datetime(name).ok_or_else(|| missing(name))
}

/// Metric rows either carry a combined `ts` or a `tradedate`/`tradetime`
/// pair.
fn metric_ts(record: &Record) -> Result<NaiveDateTime, AlgopackError> {
    if let Some(ts) = record.datetime("ts") {
        return Ok(ts);
    }
    match (record.date("tradedate"), record.time("tradetime")) {
        (Some(d), Some(t)) => Ok(d.and_time(t)),
        _ => Err(missing("ts")),
    }
}

#[cfg(test)]
mod tests {
    use super::{Candle, FromRecord, TradeStat};
    use algopack_types::{Record, Value};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn candle_decodes_from_a_wire_record() {
        let begin = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let mut rec = Record::new();
        rec.push("open", Value::Float(280.5));
        rec.push("close", Value::Float(281.0));
        rec.push("high", Value::Float(281.2));
        rec.push("low", Value::Float(280.1));
        rec.push("value", Value::Float(1_000_000.0));
        rec.push("volume", Value::Int(3_500));
        rec.push("begin", Value::DateTime(begin));
        rec.push("end", Value::DateTime(begin + chrono::Duration::minutes(59)));

        let candle = Candle::from_record(&rec).unwrap();
        assert_eq!(candle.open, Decimal::try_from(280.5).unwrap());
        assert_eq!(candle.volume, Decimal::from(3_500));
        assert_eq!(candle.begin, begin);
    }

    #[test]
    fn tradestat_combines_the_date_and_time_fields() {
        let mut rec = Record::new();
        rec.push("ticker", Value::Str("SBER".into()));
        rec.push("tradedate", Value::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()));
        rec.push(
            "tradetime",
            Value::Time(chrono::NaiveTime::from_hms_opt(10, 5, 0).unwrap()),
        );
        for name in ["pr_open", "pr_high", "pr_low", "pr_close", "val", "val_b", "val_s"] {
            rec.push(name, Value::Float(100.0));
        }
        for name in ["trades", "vol", "trades_b", "vol_b", "trades_s", "vol_s"] {
            rec.push(name, Value::Int(5));
        }
        rec.push("pr_std", Value::Null);

        let stat = TradeStat::from_record(&rec).unwrap();
        assert_eq!(stat.ticker, "SBER");
        assert_eq!(stat.ts.time(), chrono::NaiveTime::from_hms_opt(10, 5, 0).unwrap());
        assert_eq!(stat.pr_std, None);
        assert_eq!(stat.pr_vwap, None);
        assert_eq!(stat.trades, 5);
    }

    #[test]
    fn a_missing_required_field_names_itself() {
        let rec = Record::new();
        let err = Candle::from_record(&rec).unwrap_err();
        assert!(err.to_string().contains("`open`"));
    }
}
