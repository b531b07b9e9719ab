//! Wire-payload builders: assemble `{metadata, columns, data}` bodies from
//! typed column declarations and row tuples.

use serde_json::{Value as Json, json};

/// A buildable response section.
///
/// ```
/// use algopack_mock::SectionFixture;
/// use serde_json::json;
///
/// let body = SectionFixture::new("candles")
///     .column("open", "double")
///     .column("begin", "datetime")
///     .row(vec![json!(280.0), json!("2024-01-05 10:00:00")])
///     .body();
/// assert!(body.contains("\"candles\""));
/// ```
#[derive(Debug, Clone)]
pub struct SectionFixture {
    name: String,
    columns: Vec<(String, String)>,
    rows: Vec<Vec<Json>>,
}

impl SectionFixture {
    /// An empty section with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Declare a column with its wire type tag.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        self.columns.push((name.into(), type_tag.into()));
        self
    }

    /// Append one row of positional cells.
    #[must_use]
    pub fn row(mut self, cells: Vec<Json>) -> Self {
        self.rows.push(cells);
        self
    }

    /// Append many rows.
    #[must_use]
    pub fn rows(mut self, rows: impl IntoIterator<Item = Vec<Json>>) -> Self {
        self.rows.extend(rows);
        self
    }

    /// Number of rows currently in the fixture.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when the fixture has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The full single-section wire body.
    #[must_use]
    pub fn body(&self) -> String {
        self.slice_body(&self.rows)
    }

    /// A wire body carrying only `rows[start..start + size]`; past-the-end
    /// slices produce an empty page, the way the service answers an
    /// exhausted cursor.
    #[must_use]
    pub fn page(&self, start: usize, size: usize) -> String {
        let end = start.saturating_add(size).min(self.rows.len());
        let slice = if start >= self.rows.len() {
            &[]
        } else {
            &self.rows[start..end]
        };
        self.slice_body(slice)
    }

    fn slice_body(&self, rows: &[Vec<Json>]) -> String {
        let metadata: serde_json::Map<String, Json> = self
            .columns
            .iter()
            .map(|(name, tag)| (name.clone(), json!({ "type": tag })))
            .collect();
        let columns: Vec<&str> = self.columns.iter().map(|(name, _)| name.as_str()).collect();
        json!({
            &self.name: {
                "metadata": metadata,
                "columns": columns,
                "data": rows,
            }
        })
        .to_string()
    }
}

/// A `securities/{ticker}` boards listing, the reference data the identity
/// resolver consumes. Rows: `(board, engine, market, is_primary, decimals,
/// listed_till)`.
#[must_use]
pub fn boards_listing(rows: &[(&str, &str, &str, i64, i64, &str)]) -> SectionFixture {
    SectionFixture::new("boards")
        .column("secid", "string")
        .column("boardid", "string")
        .column("engine", "string")
        .column("market", "string")
        .column("is_primary", "int32")
        .column("decimals", "int32")
        .column("listed_till", "date")
        .rows(rows.iter().map(|(board, engine, market, primary, decimals, till)| {
            vec![
                json!("TICK"),
                json!(board),
                json!(engine),
                json!(market),
                json!(primary),
                json!(decimals),
                json!(till),
            ]
        }))
}
