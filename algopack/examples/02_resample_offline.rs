//! Resample a candle series against a canned transport; runs without a
//! network connection.

use std::sync::Arc;
use std::time::Duration;

use algopack::{Algopack, CandleQuery, RateLimiter, collect};
use algopack_mock::fixtures::boards_listing;
use algopack_mock::{MockTransport, SectionFixture};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let candles = SectionFixture::new("candles")
        .column("open", "double")
        .column("close", "double")
        .column("high", "double")
        .column("low", "double")
        .column("value", "double")
        .column("volume", "double")
        .column("begin", "datetime")
        .column("end", "datetime")
        .rows((0..30).map(|i| {
            let price = 280.0 + f64::from(i) * 0.1;
            vec![
                json!(price),
                json!(price + 0.05),
                json!(price + 0.2),
                json!(price - 0.2),
                json!(50_000.0),
                json!(180.0),
                json!(format!("2024-01-05 10:{i:02}:00")),
                json!(format!("2024-01-05 10:{i:02}:59")),
            ]
        }));
    let listing = boards_listing(&[("TQBR", "stock", "shares", 1, 2, "2100-01-01")]).body();

    let transport = Arc::new(MockTransport::with_handler(move |url, params| {
        use algopack_core::transport::RawResponse;
        if url.ends_with("/securities/SBER.json") {
            Ok(RawResponse::ok_json(listing.clone()))
        } else {
            let start = params
                .iter()
                .find(|(k, _)| k == "start")
                .and_then(|(_, v)| v.parse().ok())
                .unwrap_or(0);
            Ok(RawResponse::ok_json(candles.page(start, 50)))
        }
    }));

    let api = Algopack::builder()
        .transport(transport)
        .rate_limiter(Arc::new(RateLimiter::new(Duration::ZERO)))
        .build()?;

    let sber = api.ticker("SBER").await?;
    let buckets = collect(
        sber.candles(CandleQuery::range("2024-01-05", "2024-01-05").period("15min"))?,
    )
    .await?;

    for bucket in &buckets {
        println!(
            "{} .. {}  open={:?} close={:?} volume={:?}",
            bucket.datetime("begin").unwrap(),
            bucket.datetime("end").unwrap(),
            bucket.float("open").unwrap(),
            bucket.float("close").unwrap(),
            bucket.int("volume").unwrap(),
        );
    }
    Ok(())
}
