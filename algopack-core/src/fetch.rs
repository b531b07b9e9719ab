use std::pin::Pin;

use algopack_types::{AlgopackError, Record};
use futures::Stream;
use futures::stream;

use crate::client::IssClient;

/// A lazy, fallible sequence of records.
pub type RecordStream = Pin<Box<dyn Stream<Item = Result<Record, AlgopackError>> + Send>>;

/// One paginated query: the resource path, the response section to read, the
/// base query options, and the window.
#[derive(Debug, Clone)]
pub struct SectionQuery {
    /// Logical resource path (joined and suffixed by the client).
    pub path: String,
    /// Response section to deserialize, e.g. `"data"`, `"candles"`,
    /// `"trades"`, `"futoi"`, `"orderbook"`.
    pub section: String,
    /// Base query options; the advancing `start` cursor is appended per page.
    pub options: Vec<(String, String)>,
    /// Starting cursor position.
    pub offset: u64,
    /// Record cap, or [`crate::params::UNBOUNDED`] to drain until the first
    /// empty page.
    pub limit: i64,
}

impl SectionQuery {
    /// A query with no extra options, starting at offset 0 with the given
    /// limit.
    #[must_use]
    pub fn new(path: impl Into<String>, section: impl Into<String>, limit: i64) -> Self {
        Self {
            path: path.into(),
            section: section.into(),
            options: Vec::new(),
            offset: 0,
            limit,
        }
    }

    /// Append a base query option.
    #[must_use]
    pub fn option(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.options.push((key.into(), value.to_string()));
        self
    }

    /// Set the starting cursor position.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}

struct PageCursor {
    client: IssClient,
    query: SectionQuery,
    cursor: u64,
    served: u64,
    buffer: std::vec::IntoIter<Record>,
    done: bool,
}

/// Drive a cursor-paginated fetch of one response section, yielding records
/// lazily.
///
/// Pages are strictly sequential: the next fetch is not issued until the
/// prior page's records have been consumed. The cursor advances by one per
/// record (service pages are cursor-per-record, not per-page-count). An
/// empty page terminates the stream regardless of the limit; a positive
/// limit stops after exactly that many records; [`crate::params::UNBOUNDED`]
/// drains until the first empty page.
///
/// Transport and parse failures surface as stream errors; abandoning the
/// stream mid-iteration simply stops fetching.
pub fn fetch_section(client: IssClient, query: SectionQuery) -> RecordStream {
    let state = PageCursor {
        cursor: query.offset,
        served: 0,
        buffer: Vec::new().into_iter(),
        done: query.limit == 0,
        client,
        query,
    };

    Box::pin(stream::try_unfold(state, |mut st| async move {
        loop {
            if let Some(record) = st.buffer.next() {
                st.cursor += 1;
                st.served += 1;
                if st.query.limit > 0 && st.served >= st.query.limit as u64 {
                    st.done = true;
                }
                return Ok(Some((record, st)));
            }
            if st.done {
                return Ok(None);
            }

            let mut params = st.query.options.clone();
            params.push(("start".to_owned(), st.cursor.to_string()));
            let response = st.client.get_objects(&st.query.path, &params).await?;
            let records = response.records(&st.query.section, &[])?;
            tracing::trace!(
                path = st.query.path.as_str(),
                section = st.query.section.as_str(),
                start = st.cursor,
                page = records.len(),
                "fetched page"
            );
            if records.is_empty() {
                return Ok(None);
            }
            st.buffer = records.into_iter();
        }
    }))
}

/// Collect a record stream into memory.
///
/// # Errors
/// Propagates the first stream error.
pub async fn collect(stream: RecordStream) -> Result<Vec<Record>, AlgopackError> {
    use futures::TryStreamExt;
    stream.try_collect().await
}
