use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A typed scalar decoded from one wire cell.
///
/// The service declares a type tag per column; cells decode to the matching
/// variant, with `Null` standing in for JSON nulls and the `"0000-00-00"`
/// date sentinel.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Declared as nullable and absent in this row.
    Null,
    /// `int32` / `int64` columns.
    Int(i64),
    /// `double` columns.
    Float(f64),
    /// `date` columns.
    Date(NaiveDate),
    /// `time` columns.
    Time(NaiveTime),
    /// `datetime` columns.
    DateTime(NaiveDateTime),
    /// Any column without a recognized type tag.
    Str(String),
}

impl Value {
    /// `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view; `None` for any other variant.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view: integers widen to `f64`, floats pass through.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Date view.
    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(v) => Some(*v),
            _ => None,
        }
    }

    /// Time view.
    #[must_use]
    pub const fn as_time(&self) -> Option<NaiveTime> {
        match self {
            Self::Time(v) => Some(*v),
            _ => None,
        }
    }

    /// Datetime view.
    #[must_use]
    pub const fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    /// String view.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Date(v) => serializer.serialize_str(&v.to_string()),
            Self::Time(v) => serializer.serialize_str(&v.to_string()),
            Self::DateTime(v) => serializer.serialize_str(&v.to_string()),
            Self::Str(v) => serializer.serialize_str(v),
        }
    }
}

/// An ordered mapping from canonicalized field name to a typed scalar.
///
/// Produced by the wire deserializer from one row of a response section.
/// Field order follows the wire `columns` order. Records are plain values
/// with no identity beyond their fields.
///
/// An absent field (`get` returns `None`) is distinguishable from a field
/// present with a null value (`get` returns `Some(&Value::Null)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// An empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Append a field, keeping insertion order.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    /// Replace a field in place, or append it if absent.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name.to_owned(), value));
        }
    }

    /// Look a field up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Remove a field, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let idx = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(idx).1)
    }

    /// Iterate fields in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` when the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Integer field shortcut.
    #[must_use]
    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    /// Numeric field shortcut (integers widen).
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Date field shortcut.
    #[must_use]
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.get(name).and_then(Value::as_date)
    }

    /// Time field shortcut.
    #[must_use]
    pub fn time(&self, name: &str) -> Option<NaiveTime> {
        self.get(name).and_then(Value::as_time)
    }

    /// Datetime field shortcut.
    #[must_use]
    pub fn datetime(&self, name: &str) -> Option<NaiveDateTime> {
        self.get(name).and_then(Value::as_datetime)
    }

    /// String field shortcut.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
