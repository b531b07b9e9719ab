use algopack_types::AlgopackError;
use chrono::Local;

use crate::client::IssClient;

/// A fully-qualified market location: the exchange's two-level venue
/// classification plus the trading board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketId {
    /// Trading engine, e.g. `stock`.
    pub engine: String,
    /// Market under the engine, e.g. `shares`.
    pub market: String,
    /// Trading board, e.g. `TQBR`.
    pub board: String,
}

impl MarketId {
    fn new(engine: &str, market: &str, board: &str) -> Self {
        Self {
            engine: engine.to_owned(),
            market: market.to_owned(),
            board: board.to_owned(),
        }
    }

    /// The reference-data path for this market's securities listing.
    #[must_use]
    pub fn securities_path(&self) -> String {
        format!(
            "engines/{}/markets/{}/boards/{}/securities",
            self.engine, self.market, self.board
        )
    }

    /// The path prefix for one instrument under this market.
    #[must_use]
    pub fn security_path(&self, ticker: &str) -> String {
        format!("{}/{}", self.securities_path(), ticker)
    }
}

/// A resolved instrument identity: where it trades plus the attributes the
/// rest of the pipeline needs (price precision, delisting state).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityIdentity {
    /// Trading engine.
    pub engine: String,
    /// Market under the engine.
    pub market: String,
    /// Board the instrument was resolved on.
    pub board: String,
    /// Canonical ticker.
    pub ticker: String,
    /// Declared price precision in decimal places.
    pub decimals: u32,
    /// Whether the listing's validity window has already ended.
    pub delisted: bool,
}

/// Map a market name or one of its aliases to its venue and default board.
///
/// A `"name.BOARD"` form carries the board inline; an explicit `board`
/// argument wins over both the inline form and the default.
///
/// # Errors
/// Returns [`AlgopackError::Unsupported`] for unknown market names.
pub fn resolve_market(name: &str, board: Option<&str>) -> Result<MarketId, AlgopackError> {
    let (name, embedded) = split_identifier(name);
    let id = match name.to_ascii_lowercase().as_str() {
        "eq" | "shares" | "stocks" => MarketId::new("stock", "shares", "TQBR"),
        "index" => MarketId::new("stock", "index", "SNDX"),
        "fo" | "futures" | "forts" => MarketId::new("futures", "forts", "RFUD"),
        "fx" | "currency" | "selt" => MarketId::new("currency", "selt", "CETS"),
        _ => {
            return Err(AlgopackError::unsupported(format!(
                "market `{name}` is not supported"
            )));
        }
    };
    match board.or(embedded) {
        Some(b) => Ok(MarketId {
            board: b.to_owned(),
            ..id
        }),
        None => Ok(id),
    }
}

/// Resolve a loosely-specified symbol into a fully-qualified identity by
/// consulting the reference-data endpoint.
///
/// An embedded board suffix (`"SBER.TQBR"`) is split off first; with no
/// board at all, the listing flagged primary wins.
///
/// # Errors
/// - [`AlgopackError::Lookup`] when the symbol has no board listing, or no
///   listing is flagged primary.
/// - [`AlgopackError::Validation`] when a caller-supplied board does not
///   appear in the symbol's listing.
pub async fn resolve_security(
    client: &IssClient,
    symbol: &str,
    board: Option<&str>,
) -> Result<SecurityIdentity, AlgopackError> {
    let (ticker, embedded) = split_identifier(symbol);
    let board = board.or(embedded);

    let response = client
        .get_objects(&format!("securities/{ticker}"), &[])
        .await?;
    let listings = response.records("boards", &[])?;
    if listings.is_empty() {
        return Err(AlgopackError::lookup(format!("ticker {ticker}")));
    }

    let listing = match board {
        Some(b) => listings
            .iter()
            .find(|row| row.str("board") == Some(b))
            .ok_or_else(|| {
                AlgopackError::Validation(format!("board {b} is not listed for {ticker}"))
            })?,
        None => listings
            .iter()
            .find(|row| row.int("is_primary") == Some(1))
            .ok_or_else(|| {
                AlgopackError::lookup(format!("primary board listing for {ticker}"))
            })?,
    };

    let delisted = listing
        .date("listed_till")
        .is_some_and(|till| till < Local::now().date_naive());

    Ok(SecurityIdentity {
        engine: listing.str("engine").unwrap_or_default().to_owned(),
        market: listing.str("market").unwrap_or_default().to_owned(),
        board: listing.str("board").unwrap_or_default().to_owned(),
        ticker: ticker.to_owned(),
        decimals: listing.int("decimals").map_or(2, |d| d.max(0) as u32),
        delisted,
    })
}

/// Split an identifier on the first non-alphanumeric separator, recovering an
/// embedded board suffix. Hyphens are part of tickers (`VEON-RX`), not
/// separators.
fn split_identifier(raw: &str) -> (&str, Option<&str>) {
    match raw.find(|c: char| !c.is_ascii_alphanumeric() && c != '-') {
        Some(pos) => {
            let suffix = &raw[pos + 1..];
            (&raw[..pos], (!suffix.is_empty()).then_some(suffix))
        }
        None => (raw, None),
    }
}
