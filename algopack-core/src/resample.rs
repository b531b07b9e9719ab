use algopack_types::{AlgopackError, MetricFamily, Record, Value};
use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

/// Re-bucket a fixed-granularity series into coarser time windows.
///
/// Input records are partitioned by ticker, then grouped into sequential
/// non-overlapping windows of `target_minutes` anchored at midnight of each
/// partition's first record. Windows with no contributing records are
/// skipped, never emitted empty. Aggregation rules are per metric family;
/// when `family` is `None` it is sniffed from the first record's field set
/// (see [`MetricFamily::sniff`]).
///
/// `decimals` is the instrument's declared price precision, applied when
/// rounding recomputed price fields.
///
/// Output records carry the partition's `ticker` (when the input had one)
/// and the window bounds as `begin`/`end`, with `end` on the window's last
/// whole second.
///
/// # Errors
/// - [`AlgopackError::Validation`] when the family cannot be inferred.
/// - [`AlgopackError::MalformedResponse`] when a record lacks the fields
///   that locate it in time (`begin` for candles, `ts` or
///   `tradedate`/`tradetime` for metrics).
pub fn resample(
    records: Vec<Record>,
    family: Option<MetricFamily>,
    target_minutes: u32,
    decimals: u32,
) -> Result<Vec<Record>, AlgopackError> {
    if records.is_empty() || target_minutes == 0 {
        return Ok(records);
    }
    let family = match family {
        Some(f) => f,
        None => MetricFamily::sniff(&records[0])?,
    };

    let mut partitions: Vec<(String, Vec<(NaiveDateTime, Record)>)> = Vec::new();
    for record in records {
        let ts = record_ts(family, &record)?;
        let ticker = record.str("ticker").unwrap_or_default().to_owned();
        match partitions.iter_mut().find(|(t, _)| *t == ticker) {
            Some((_, part)) => part.push((ts, record)),
            None => partitions.push((ticker, vec![(ts, record)])),
        }
    }

    let step = Duration::minutes(i64::from(target_minutes));
    let mut out = Vec::new();
    for (_, mut part) in partitions {
        part.sort_by_key(|(ts, _)| *ts);

        let midnight = part[0].0.date().and_hms_opt(0, 0, 0).ok_or_else(|| {
            AlgopackError::malformed("record date has no midnight")
        })?;
        let mut begin = midnight;
        let mut end = begin + step;
        while part[0].0 >= end {
            begin = end;
            end = begin + step;
        }

        let mut window: Vec<(NaiveDateTime, Record)> = Vec::new();
        for (ts, record) in part {
            while ts >= end {
                if !window.is_empty() {
                    out.push(aggregate(family, &window, begin, end, decimals));
                    window.clear();
                }
                begin = end;
                end = begin + step;
            }
            window.push((ts, record));
        }
        if !window.is_empty() {
            out.push(aggregate(family, &window, begin, end, decimals));
        }
    }
    Ok(out)
}

/// Where a record sits in time: candle records carry `begin`, metric records
/// carry `ts` or a `tradedate`/`tradetime` pair.
fn record_ts(family: MetricFamily, record: &Record) -> Result<NaiveDateTime, AlgopackError> {
    if family == MetricFamily::Candles {
        return record
            .datetime("begin")
            .ok_or_else(|| AlgopackError::malformed("candle record has no `begin`"));
    }
    if let Some(ts) = record.datetime("ts") {
        return Ok(ts);
    }
    match (record.date("tradedate"), record.time("tradetime")) {
        (Some(d), Some(t)) => Ok(d.and_time(t)),
        _ => Err(AlgopackError::malformed(
            "metric record has neither `ts` nor `tradedate`/`tradetime`",
        )),
    }
}

fn aggregate(
    family: MetricFamily,
    window: &[(NaiveDateTime, Record)],
    begin: NaiveDateTime,
    end: NaiveDateTime,
    decimals: u32,
) -> Record {
    let acc = Window { records: window };
    let mut out = Record::new();
    if let Some(ticker) = window[0].1.str("ticker") {
        if !ticker.is_empty() {
            out.push("ticker", Value::Str(ticker.to_owned()));
        }
    }
    out.push("begin", Value::DateTime(begin));
    out.push("end", Value::DateTime(end - Duration::seconds(1)));

    match family {
        MetricFamily::Candles => candles(&acc, &mut out),
        MetricFamily::TradeStats => tradestats(&acc, &mut out, decimals),
        MetricFamily::OrderStats => orderstats(&acc, &mut out, decimals),
        MetricFamily::ObStats => obstats(&acc, &mut out, decimals),
    }
    out
}

fn candles(acc: &Window<'_>, out: &mut Record) {
    out.push("open", float_or_null(acc.first("open")));
    out.push("close", float_or_null(acc.last("close")));
    out.push("high", float_or_null(acc.max("high")));
    out.push("low", float_or_null(acc.min("low")));
    out.push("volume", count(acc.sum("volume")));
    out.push("value", money(acc.sum("value")));
}

fn tradestats(acc: &Window<'_>, out: &mut Record, decimals: u32) {
    let open = acc.first("pr_open");
    let close = acc.last("pr_close");
    out.push("pr_open", float_or_null(open));
    out.push("pr_high", float_or_null(acc.max("pr_high")));
    out.push("pr_low", float_or_null(acc.min("pr_low")));
    out.push("pr_close", float_or_null(close));

    // Derived fields recomputed from the aggregates, not averaged.
    let change = match (open, close) {
        (Some(o), Some(c)) if o != 0.0 => Some((c - o) / o * 100.0),
        _ => None,
    };
    out.push("pr_change", rounded(change, 2));

    out.push("trades", count(acc.sum("trades")));
    out.push("vol", count(acc.sum("vol")));
    out.push("val", money(acc.sum("val")));
    out.push("pr_std", rounded(acc.mean("pr_std"), decimals));

    let vol_b = acc.sum("vol_b");
    let vol_s = acc.sum("vol_s");
    let disb = if vol_b + vol_s != 0.0 {
        Some((vol_b - vol_s) / (vol_b + vol_s))
    } else {
        None
    };
    out.push("disb", rounded(disb, 2));
    out.push("pr_vwap", rounded(acc.wavg("pr_vwap", "vol"), decimals));

    out.push("trades_b", count(acc.sum("trades_b")));
    out.push("vol_b", count(vol_b));
    out.push("val_b", money(acc.sum("val_b")));
    out.push("pr_vwap_b", rounded(acc.wavg("pr_vwap_b", "vol_b"), decimals));

    out.push("trades_s", count(acc.sum("trades_s")));
    out.push("vol_s", count(vol_s));
    out.push("val_s", money(acc.sum("val_s")));
    out.push("pr_vwap_s", rounded(acc.wavg("pr_vwap_s", "vol_s"), decimals));
}

fn orderstats(acc: &Window<'_>, out: &mut Record, decimals: u32) {
    for side in ["put", "cancel"] {
        out.push(format!("{side}_orders"), count(acc.sum(&format!("{side}_orders"))));
        out.push(
            format!("{side}_orders_b"),
            count(acc.sum(&format!("{side}_orders_b"))),
        );
        out.push(
            format!("{side}_orders_s"),
            count(acc.sum(&format!("{side}_orders_s"))),
        );
        out.push(format!("{side}_vol"), count(acc.sum(&format!("{side}_vol"))));
        out.push(
            format!("{side}_vol_b"),
            count(acc.sum(&format!("{side}_vol_b"))),
        );
        out.push(
            format!("{side}_vol_s"),
            count(acc.sum(&format!("{side}_vol_s"))),
        );
        out.push(format!("{side}_val"), money(acc.sum(&format!("{side}_val"))));
        out.push(
            format!("{side}_val_b"),
            money(acc.sum(&format!("{side}_val_b"))),
        );
        out.push(
            format!("{side}_val_s"),
            money(acc.sum(&format!("{side}_val_s"))),
        );
    }
    out.push(
        "put_vwap_b",
        rounded(acc.wavg("put_vwap_b", "put_vol_b"), decimals),
    );
    out.push(
        "put_vwap_s",
        rounded(acc.wavg("put_vwap_s", "put_vol_s"), decimals),
    );
    out.push(
        "cancel_vwap_b",
        rounded(acc.wavg("cancel_vwap_b", "cancel_vol_b"), decimals),
    );
    out.push(
        "cancel_vwap_s",
        rounded(acc.wavg("cancel_vwap_s", "cancel_vol_s"), decimals),
    );
}

fn obstats(acc: &Window<'_>, out: &mut Record, decimals: u32) {
    // Order-book fields are point-in-time snapshots: means, not sums.
    out.push("spread_bbo", rounded(acc.mean("spread_bbo"), 1));
    out.push("spread_lv10", rounded(acc.mean("spread_lv10"), 1));
    out.push("spread_1mio", rounded(acc.mean("spread_1mio"), 1));
    out.push("levels_b", rounded(acc.mean("levels_b"), 2));
    out.push("levels_s", rounded(acc.mean("levels_s"), 2));
    out.push("vol_b", rounded(acc.mean("vol_b"), 2));
    out.push("vol_s", rounded(acc.mean("vol_s"), 2));
    out.push("val_b", money_opt(acc.mean("val_b")));
    out.push("val_s", money_opt(acc.mean("val_s")));
    out.push("imbalance_vol_bbo", rounded(acc.mean("imbalance_vol_bbo"), 2));
    out.push("imbalance_val_bbo", rounded(acc.mean("imbalance_val_bbo"), 2));
    out.push("imbalance_vol", rounded(acc.mean("imbalance_vol"), 2));
    out.push("imbalance_val", rounded(acc.mean("imbalance_val"), 2));
    out.push("vwap_b", rounded(acc.wavg("vwap_b", "vol_b"), decimals));
    out.push("vwap_s", rounded(acc.wavg("vwap_s", "vol_s"), decimals));
    out.push(
        "vwap_b_1mio",
        rounded(acc.wavg("vwap_b_1mio", "val_b"), decimals),
    );
    out.push(
        "vwap_s_1mio",
        rounded(acc.wavg("vwap_s_1mio", "val_s"), decimals),
    );
}

struct Window<'a> {
    records: &'a [(NaiveDateTime, Record)],
}

impl Window<'_> {
    fn values(&self, name: &str) -> impl Iterator<Item = f64> + '_ {
        let name = name.to_owned();
        self.records
            .iter()
            .filter_map(move |(_, r)| r.float(&name))
    }

    fn sum(&self, name: &str) -> f64 {
        self.values(name).sum()
    }

    fn mean(&self, name: &str) -> Option<f64> {
        let (mut total, mut n) = (0.0, 0u32);
        for v in self.values(name) {
            total += v;
            n += 1;
        }
        (n > 0).then(|| total / f64::from(n))
    }

    fn first(&self, name: &str) -> Option<f64> {
        self.values(name).next()
    }

    fn last(&self, name: &str) -> Option<f64> {
        self.values(name).last()
    }

    fn max(&self, name: &str) -> Option<f64> {
        self.values(name).reduce(f64::max)
    }

    fn min(&self, name: &str) -> Option<f64> {
        self.values(name).reduce(f64::min)
    }

    /// Volume-weighted average of `name`, weighted by the record's own
    /// `weight` field; `None` when no weight contributes.
    fn wavg(&self, name: &str, weight: &str) -> Option<f64> {
        let (mut num, mut den) = (0.0, 0.0);
        for (_, record) in self.records {
            if let (Some(v), Some(w)) = (record.float(name), record.float(weight)) {
                num += v * w;
                den += w;
            }
        }
        (den != 0.0).then(|| num / den)
    }
}

fn round_dp(v: f64, dp: u32) -> f64 {
    Decimal::from_f64(v)
        .map(|d| d.round_dp(dp).to_f64().unwrap_or(v))
        .unwrap_or(v)
}

fn rounded(v: Option<f64>, dp: u32) -> Value {
    v.map_or(Value::Null, |v| Value::Float(round_dp(v, dp)))
}

fn float_or_null(v: Option<f64>) -> Value {
    v.map_or(Value::Null, Value::Float)
}

/// Sums of count/volume fields come back integral when their inputs were.
fn count(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        Value::Int(v as i64)
    } else {
        Value::Float(v)
    }
}

/// Monetary values round to whole units.
fn money(v: f64) -> Value {
    count(round_dp(v, 0))
}

fn money_opt(v: Option<f64>) -> Value {
    v.map_or(Value::Null, money)
}

#[cfg(test)]
mod tests {
    use super::resample;
    use algopack_types::{MetricFamily, Record, Value};
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn candle(h: u32, m: u32, open: f64, close: f64, volume: i64) -> Record {
        let mut rec = Record::new();
        rec.push("open", Value::Float(open));
        rec.push("close", Value::Float(close));
        rec.push("high", Value::Float(open.max(close)));
        rec.push("low", Value::Float(open.min(close)));
        rec.push("value", Value::Float((open + close) * 10.0));
        rec.push("volume", Value::Int(volume));
        rec.push("begin", Value::DateTime(ts(h, m)));
        rec.push("end", Value::DateTime(ts(h, m) + chrono::Duration::seconds(59)));
        rec
    }

    fn tradestat(h: u32, m: u32, vol_b: i64, vol_s: i64, vwap: f64) -> Record {
        let mut rec = Record::new();
        rec.push("ticker", Value::Str("SBER".into()));
        rec.push("tradedate", Value::Date(ts(h, m).date()));
        rec.push("tradetime", Value::Time(ts(h, m).time()));
        rec.push("pr_open", Value::Float(100.0 + f64::from(m)));
        rec.push("pr_high", Value::Float(110.0 + f64::from(m)));
        rec.push("pr_low", Value::Float(90.0));
        rec.push("pr_close", Value::Float(105.0 + f64::from(m)));
        rec.push("pr_std", Value::Float(0.5));
        rec.push("pr_vwap", Value::Float(vwap));
        rec.push("trades", Value::Int(10));
        rec.push("vol", Value::Int(vol_b + vol_s));
        rec.push("val", Value::Float(1000.5));
        rec.push("vol_b", Value::Int(vol_b));
        rec.push("vol_s", Value::Int(vol_s));
        rec
    }

    #[test]
    fn empty_input_stays_empty() {
        let out = resample(Vec::new(), Some(MetricFamily::Candles), 10, 2).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn gaps_between_windows_are_skipped_not_emitted() {
        // Two populated 5-minute windows separated by two empty ones.
        let input = vec![
            candle(10, 0, 100.0, 101.0, 5),
            candle(10, 1, 101.0, 102.0, 5),
            candle(10, 16, 103.0, 104.0, 7),
        ];
        let out = resample(input, Some(MetricFamily::Candles), 5, 2).unwrap();
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].datetime("begin"), Some(ts(10, 0)));
        assert_eq!(
            out[0].datetime("end"),
            Some(ts(10, 5) - chrono::Duration::seconds(1))
        );
        assert_eq!(out[1].datetime("begin"), Some(ts(10, 15)));
    }

    #[test]
    fn candle_aggregation_carries_open_and_close() {
        let input = vec![
            candle(10, 0, 100.0, 101.0, 5),
            candle(10, 1, 101.0, 99.0, 3),
            candle(10, 2, 99.0, 104.0, 2),
        ];
        let out = resample(input, Some(MetricFamily::Candles), 10, 2).unwrap();
        assert_eq!(out.len(), 1);

        let window = &out[0];
        assert_eq!(window.float("open"), Some(100.0));
        assert_eq!(window.float("close"), Some(104.0));
        assert_eq!(window.float("high"), Some(104.0));
        assert_eq!(window.float("low"), Some(99.0));
        assert_eq!(window.int("volume"), Some(10));
    }

    #[test]
    fn singleton_windows_reproduce_their_input_aggregates() {
        let input = vec![tradestat(10, 0, 60, 40, 101.5)];
        let out = resample(input, Some(MetricFamily::TradeStats), 5, 2).unwrap();
        assert_eq!(out.len(), 1);

        let window = &out[0];
        assert_eq!(window.str("ticker"), Some("SBER"));
        assert_eq!(window.float("pr_open"), Some(100.0));
        assert_eq!(window.float("pr_close"), Some(105.0));
        assert_eq!(window.int("trades"), Some(10));
        assert_eq!(window.int("vol"), Some(100));
        // Monetary values round to whole units.
        assert_eq!(window.int("val"), Some(1001));
        // Singleton VWAP equals the record's own VWAP.
        assert_eq!(window.float("pr_vwap"), Some(101.5));
        // disb recomputed from the volume sums: (60 - 40) / 100.
        assert_eq!(window.float("disb"), Some(0.2));
    }

    #[test]
    fn vwap_is_recomputed_from_sums_not_averaged() {
        let input = vec![
            tradestat(10, 0, 90, 0, 100.0),
            tradestat(10, 1, 10, 0, 200.0),
        ];
        let out = resample(input, Some(MetricFamily::TradeStats), 5, 2).unwrap();
        let vwap = out[0].float("pr_vwap").unwrap();
        // (100 * 90 + 200 * 10) / 100, not the naive mean 150.
        assert!((vwap - 110.0).abs() < 1e-9);
    }

    #[test]
    fn partitions_are_per_ticker() {
        let mut other = tradestat(10, 0, 10, 10, 100.0);
        other.set("ticker", Value::Str("GAZP".into()));
        let input = vec![tradestat(10, 0, 10, 10, 100.0), other];

        let out = resample(input, Some(MetricFamily::TradeStats), 5, 2).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].str("ticker"), Some("SBER"));
        assert_eq!(out[1].str("ticker"), Some("GAZP"));
    }

    #[test]
    fn family_sniffing_is_a_fallback() {
        let input = vec![candle(10, 0, 100.0, 101.0, 5)];
        let out = resample(input, None, 5, 2).unwrap();
        assert_eq!(out.len(), 1);

        let mut unknown = Record::new();
        unknown.push("bid", Value::Float(1.0));
        unknown.push("ts", Value::DateTime(ts(10, 0)));
        assert!(resample(vec![unknown], None, 5, 2).is_err());
    }

    #[test]
    fn obstats_means_point_in_time_fields() {
        let mut a = Record::new();
        a.push("ticker", Value::Str("SBER".into()));
        a.push("ts", Value::DateTime(ts(10, 0)));
        a.push("spread_bbo", Value::Float(0.10));
        a.push("levels_b", Value::Int(10));
        a.push("vol_b", Value::Int(100));
        a.push("vwap_b", Value::Float(100.0));
        let mut b = Record::new();
        b.push("ticker", Value::Str("SBER".into()));
        b.push("ts", Value::DateTime(ts(10, 1)));
        b.push("spread_bbo", Value::Float(0.30));
        b.push("levels_b", Value::Int(20));
        b.push("vol_b", Value::Int(300));
        b.push("vwap_b", Value::Float(104.0));

        let out = resample(vec![a, b], Some(MetricFamily::ObStats), 5, 2).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].float("spread_bbo"), Some(0.2));
        assert_eq!(out[0].float("levels_b"), Some(15.0));
        assert_eq!(out[0].float("vol_b"), Some(200.0));
        // (100*100 + 104*300) / 400
        assert_eq!(out[0].float("vwap_b"), Some(103.0));
    }
}
