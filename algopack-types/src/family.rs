use std::fmt;

use crate::error::AlgopackError;
use crate::record::Record;

/// The metric families the resampler knows how to aggregate.
///
/// Each family carries its own aggregation rules: candles and trade
/// statistics describe flows (sums, open/close carry), order-book statistics
/// are point-in-time snapshots (means).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricFamily {
    /// Open/high/low/close/volume summaries.
    Candles,
    /// Executed-trade statistics (`tradestats`).
    TradeStats,
    /// Submitted/cancelled order statistics (`orderstats`).
    OrderStats,
    /// Order-book snapshot statistics (`obstats`).
    ObStats,
}

impl MetricFamily {
    /// Best-effort structural detection from a record's field set.
    ///
    /// Prefer passing the family explicitly; this fallback exists for
    /// convenience and refuses to guess when the field set matches no family
    /// or more than one.
    ///
    /// # Errors
    /// Returns [`AlgopackError::Validation`] when the record's fields are
    /// ambiguous or match no known family.
    pub fn sniff(record: &Record) -> Result<Self, AlgopackError> {
        let mut matches = Vec::new();
        if record.get("pr_open").is_some() && record.get("pr_vwap").is_some() {
            matches.push(Self::TradeStats);
        }
        if record.get("put_orders").is_some() && record.get("cancel_orders").is_some() {
            matches.push(Self::OrderStats);
        }
        if record.get("spread_bbo").is_some() && record.get("levels_b").is_some() {
            matches.push(Self::ObStats);
        }
        if record.get("open").is_some()
            && record.get("close").is_some()
            && record.get("begin").is_some()
        {
            matches.push(Self::Candles);
        }
        match matches.as_slice() {
            [family] => Ok(*family),
            [] => Err(AlgopackError::Validation(
                "cannot infer metric family from record fields; pass it explicitly".to_owned(),
            )),
            _ => Err(AlgopackError::Validation(format!(
                "ambiguous metric family {matches:?}; pass it explicitly"
            ))),
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Candles => "candles",
            Self::TradeStats => "tradestats",
            Self::OrderStats => "orderstats",
            Self::ObStats => "obstats",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::MetricFamily;
    use crate::record::{Record, Value};

    fn record_with(names: &[&str]) -> Record {
        let mut rec = Record::new();
        for name in names {
            rec.push(*name, Value::Int(1));
        }
        rec
    }

    #[test]
    fn sniffs_each_family_from_its_signature_fields() {
        let ts = record_with(&["ticker", "pr_open", "pr_vwap", "vol"]);
        assert_eq!(MetricFamily::sniff(&ts).unwrap(), MetricFamily::TradeStats);

        let os = record_with(&["ticker", "put_orders", "cancel_orders"]);
        assert_eq!(MetricFamily::sniff(&os).unwrap(), MetricFamily::OrderStats);

        let ob = record_with(&["ticker", "spread_bbo", "levels_b"]);
        assert_eq!(MetricFamily::sniff(&ob).unwrap(), MetricFamily::ObStats);

        let candle = record_with(&["open", "close", "high", "low", "begin", "end"]);
        assert_eq!(
            MetricFamily::sniff(&candle).unwrap(),
            MetricFamily::Candles
        );
    }

    #[test]
    fn refuses_to_guess_on_unknown_fields() {
        let rec = record_with(&["ticker", "bid", "offer"]);
        assert!(MetricFamily::sniff(&rec).is_err());
    }
}
