use std::collections::BTreeMap;

use algopack_types::{AlgopackError, Record, Value};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;

/// Date cells carry this literal when the service has no date to report.
const NULL_DATE_SENTINEL: &str = "0000-00-00";

/// Per-column metadata entry: the declared scalar type tag.
///
/// The service also reports byte widths and precision here; only the type
/// tag drives decoding.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldMeta {
    /// Declared type tag: `int32`, `int64`, `double`, `date`, `time`,
    /// `datetime`, or `string`.
    #[serde(rename = "type")]
    pub type_tag: String,
}

/// One response section: declared column types, column order, and positional
/// row tuples.
#[derive(Debug, Clone, Deserialize)]
pub struct WireBlock {
    /// Field name to declared type.
    pub metadata: BTreeMap<String, FieldMeta>,
    /// Ordered field names; pairs positionally with every row in `data`.
    pub columns: Vec<String>,
    /// Row tuples in service order.
    pub data: Vec<Vec<serde_json::Value>>,
}

impl WireBlock {
    /// Decode every row into a [`Record`], converting cells per the declared
    /// column types and canonicalizing field names (lower-case, `secid` →
    /// `ticker`, `boardid` → `board`).
    ///
    /// `select` limits the output to the named (canonical) fields; the
    /// identity fields `ticker` and `board` are always kept. An empty
    /// `select` keeps everything.
    ///
    /// # Errors
    /// Returns [`AlgopackError::MalformedResponse`] when a row is shorter
    /// than `columns` or a cell does not decode as its declared type.
    pub fn records(&self, select: &[&str]) -> Result<Vec<Record>, AlgopackError> {
        let names: Vec<String> = self.columns.iter().map(|c| canonical_name(c)).collect();
        let tags: Vec<Option<&str>> = self
            .columns
            .iter()
            .map(|c| self.metadata.get(c).map(|m| m.type_tag.as_str()))
            .collect();

        let mut out = Vec::with_capacity(self.data.len());
        for row in &self.data {
            if row.len() < self.columns.len() {
                return Err(AlgopackError::malformed(format!(
                    "row has {} cells but {} columns are declared",
                    row.len(),
                    self.columns.len()
                )));
            }
            let mut record = Record::new();
            for (idx, cell) in row.iter().take(self.columns.len()).enumerate() {
                let name = &names[idx];
                if !selected(name, select) {
                    continue;
                }
                let value = decode_cell(tags[idx], cell).map_err(|detail| {
                    AlgopackError::malformed(format!("column `{name}`: {detail}"))
                })?;
                record.push(name.clone(), value);
            }
            out.push(record);
        }
        Ok(out)
    }
}

/// A parsed wire response: a map from section name to its block.
#[derive(Debug, Clone)]
pub struct WireResponse {
    sections: BTreeMap<String, serde_json::Value>,
}

impl WireResponse {
    /// Parse a response body.
    ///
    /// # Errors
    /// Returns [`AlgopackError::MalformedResponse`] when the body is not a
    /// non-empty JSON object.
    pub fn parse(body: &str) -> Result<Self, AlgopackError> {
        let parsed: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| AlgopackError::malformed(format!("not valid JSON: {e}")))?;
        let serde_json::Value::Object(map) = parsed else {
            return Err(AlgopackError::malformed("expected a JSON object"));
        };
        if map.is_empty() {
            return Err(AlgopackError::malformed("received wrong data"));
        }
        Ok(Self {
            sections: map.into_iter().collect(),
        })
    }

    /// Decode the named section's block, or `None` when the response does not
    /// carry that section at all.
    ///
    /// # Errors
    /// Returns [`AlgopackError::MalformedResponse`] when the section exists
    /// but is not block-shaped.
    pub fn block(&self, section: &str) -> Result<Option<WireBlock>, AlgopackError> {
        let Some(raw) = self.sections.get(section) else {
            return Ok(None);
        };
        let block = WireBlock::deserialize(raw)
            .map_err(|e| AlgopackError::malformed(format!("section `{section}`: {e}")))?;
        Ok(Some(block))
    }

    /// Decode the named section into records, treating a missing section as
    /// empty.
    ///
    /// # Errors
    /// Propagates block- and cell-level [`AlgopackError::MalformedResponse`].
    pub fn records(&self, section: &str, select: &[&str]) -> Result<Vec<Record>, AlgopackError> {
        match self.block(section)? {
            Some(block) => block.records(select),
            None => Ok(Vec::new()),
        }
    }
}

fn canonical_name(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    match lower.as_str() {
        "secid" => "ticker".to_owned(),
        "boardid" => "board".to_owned(),
        _ => lower,
    }
}

fn selected(name: &str, select: &[&str]) -> bool {
    select.is_empty() || name == "ticker" || name == "board" || select.contains(&name)
}

fn decode_cell(tag: Option<&str>, cell: &serde_json::Value) -> Result<Value, String> {
    if cell.is_null() {
        return Ok(Value::Null);
    }
    match tag {
        Some("int32" | "int64") => int_cell(cell),
        Some("double") => float_cell(cell),
        Some("date") => date_cell(cell),
        Some("datetime") => datetime_cell(cell),
        Some("time") => time_cell(cell),
        _ => Ok(raw_cell(cell)),
    }
}

fn int_cell(cell: &serde_json::Value) -> Result<Value, String> {
    if let Some(v) = cell.as_i64() {
        return Ok(Value::Int(v));
    }
    if let Some(s) = cell.as_str() {
        return s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("`{s}` is not an integer"));
    }
    Err(format!("`{cell}` is not an integer"))
}

fn float_cell(cell: &serde_json::Value) -> Result<Value, String> {
    if let Some(v) = cell.as_f64() {
        return Ok(Value::Float(v));
    }
    if let Some(s) = cell.as_str() {
        return s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("`{s}` is not a number"));
    }
    Err(format!("`{cell}` is not a number"))
}

fn date_cell(cell: &serde_json::Value) -> Result<Value, String> {
    let s = cell.as_str().ok_or_else(|| format!("`{cell}` is not a date"))?;
    let s = s.trim();
    if s == NULL_DATE_SENTINEL {
        return Ok(Value::Null);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(Value::Date)
        .map_err(|_| format!("`{s}` is not an ISO date"))
}

fn datetime_cell(cell: &serde_json::Value) -> Result<Value, String> {
    let s = cell
        .as_str()
        .ok_or_else(|| format!("`{cell}` is not a datetime"))?;
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map(Value::DateTime)
        .map_err(|_| format!("`{s}` is not an ISO datetime"))
}

fn time_cell(cell: &serde_json::Value) -> Result<Value, String> {
    let s = cell.as_str().ok_or_else(|| format!("`{cell}` is not a time"))?;
    NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
        .map(Value::Time)
        .map_err(|_| format!("`{s}` is not an ISO time"))
}

fn raw_cell(cell: &serde_json::Value) -> Value {
    match cell {
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or_else(|| Value::Str(n.to_string())),
        other => Value::Str(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::WireResponse;
    use algopack_types::Value;
    use chrono::{NaiveDate, NaiveTime};

    fn typed_body() -> String {
        r#"{
            "data": {
                "metadata": {
                    "SECID": {"type": "string"},
                    "tradedate": {"type": "date"},
                    "tradetime": {"type": "time"},
                    "systime": {"type": "datetime"},
                    "trades": {"type": "int32"},
                    "vol": {"type": "int64"},
                    "pr_vwap": {"type": "double"}
                },
                "columns": ["SECID", "tradedate", "tradetime", "systime", "trades", "vol", "pr_vwap"],
                "data": [
                    ["SBER", "2024-01-05", "10:05:00", "2024-01-05 10:05:01", 17, 123456789012, 275.43],
                    ["SBER", "0000-00-00", null, null, null, null, null]
                ]
            }
        }"#
        .to_owned()
    }

    #[test]
    fn decodes_every_declared_type() {
        let resp = WireResponse::parse(&typed_body()).unwrap();
        let records = resp.records("data", &[]).unwrap();
        assert_eq!(records.len(), 2);

        let rec = &records[0];
        assert_eq!(rec.str("ticker"), Some("SBER"));
        assert_eq!(
            rec.date("tradedate"),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
        assert_eq!(
            rec.time("tradetime"),
            NaiveTime::from_hms_opt(10, 5, 0)
        );
        assert_eq!(
            rec.datetime("systime"),
            NaiveDate::from_ymd_opt(2024, 1, 5).and_then(|d| d.and_hms_opt(10, 5, 1))
        );
        assert_eq!(rec.int("trades"), Some(17));
        assert_eq!(rec.int("vol"), Some(123_456_789_012));
        assert_eq!(rec.float("pr_vwap"), Some(275.43));
    }

    #[test]
    fn null_cells_and_the_date_sentinel_decode_to_null() {
        let resp = WireResponse::parse(&typed_body()).unwrap();
        let records = resp.records("data", &[]).unwrap();
        let rec = &records[1];

        assert_eq!(rec.get("tradedate"), Some(&Value::Null));
        assert_eq!(rec.get("tradetime"), Some(&Value::Null));
        assert_eq!(rec.get("trades"), Some(&Value::Null));
        assert_eq!(rec.get("pr_vwap"), Some(&Value::Null));
    }

    #[test]
    fn identity_fields_are_renamed_and_survive_selection() {
        let body = r#"{
            "securities": {
                "metadata": {
                    "SECID": {"type": "string"},
                    "BOARDID": {"type": "string"},
                    "SHORTNAME": {"type": "string"},
                    "LOTSIZE": {"type": "int32"}
                },
                "columns": ["SECID", "BOARDID", "SHORTNAME", "LOTSIZE"],
                "data": [["SBER", "TQBR", "Sberbank", 10]]
            }
        }"#;
        let resp = WireResponse::parse(body).unwrap();
        let records = resp.records("securities", &["lotsize"]).unwrap();
        let rec = &records[0];

        assert_eq!(rec.str("ticker"), Some("SBER"));
        assert_eq!(rec.str("board"), Some("TQBR"));
        assert_eq!(rec.int("lotsize"), Some(10));
        assert_eq!(rec.get("shortname"), None);
    }

    #[test]
    fn a_field_without_metadata_falls_back_to_string() {
        let body = r#"{
            "data": {
                "metadata": {},
                "columns": ["NOTE"],
                "data": [["free text"]]
            }
        }"#;
        let resp = WireResponse::parse(body).unwrap();
        let records = resp.records("data", &[]).unwrap();
        assert_eq!(records[0].str("note"), Some("free text"));
    }

    #[test]
    fn short_rows_are_rejected_not_padded() {
        let body = r#"{
            "data": {
                "metadata": {"A": {"type": "int32"}, "B": {"type": "int32"}},
                "columns": ["A", "B"],
                "data": [[1]]
            }
        }"#;
        let resp = WireResponse::parse(body).unwrap();
        let err = resp.records("data", &[]).unwrap_err();
        assert!(err.to_string().contains("malformed response"));
    }

    #[test]
    fn empty_or_non_object_bodies_are_malformed() {
        assert!(WireResponse::parse("{}").is_err());
        assert!(WireResponse::parse("[]").is_err());
        assert!(WireResponse::parse("nonsense").is_err());
    }

    #[test]
    fn missing_section_reads_as_empty() {
        let resp = WireResponse::parse(&typed_body()).unwrap();
        assert!(resp.records("candles", &[]).unwrap().is_empty());
    }
}
