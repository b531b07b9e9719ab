#![allow(dead_code)] // each test binary uses its own subset of these helpers

use std::sync::Arc;
use std::time::Duration;

use algopack::{Algopack, RateLimiter};
use algopack_mock::fixtures::boards_listing;
use algopack_mock::{MockTransport, SectionFixture};
use serde_json::json;

/// An async client over the given mock transport, with pacing disabled.
pub fn client(transport: Arc<MockTransport>) -> Algopack {
    Algopack::builder()
        .transport(transport)
        .rate_limiter(Arc::new(RateLimiter::new(Duration::ZERO)))
        .build()
        .expect("mock-backed client")
}

/// An equities boards listing: primary TQBR plus a secondary board.
pub fn sber_listing() -> String {
    boards_listing(&[
        ("TQBR", "stock", "shares", 1, 2, "2100-01-01"),
        ("SMAL", "stock", "shares", 0, 2, "2100-01-01"),
    ])
    .body()
}

/// A `tradestats` page source with `total` sequential rows.
pub fn tradestats_fixture(total: i64) -> SectionFixture {
    SectionFixture::new("data")
        .column("SECID", "string")
        .column("tradedate", "date")
        .column("tradetime", "time")
        .column("pr_vwap", "double")
        .column("vol", "int64")
        .rows((0..total).map(|i| {
            vec![
                json!("SBER"),
                json!("2024-01-05"),
                json!(format!("10:{:02}:00", i % 60)),
                json!(275.0 + i as f64),
                json!(100 + i),
            ]
        }))
}

/// One-minute candle rows starting at 10:00, one per minute.
pub fn minute_candles_fixture(total: i64) -> SectionFixture {
    SectionFixture::new("candles")
        .column("open", "double")
        .column("close", "double")
        .column("high", "double")
        .column("low", "double")
        .column("value", "double")
        .column("volume", "double")
        .column("begin", "datetime")
        .column("end", "datetime")
        .rows((0..total).map(|i| {
            let price = 280.0 + i as f64;
            vec![
                json!(price),
                json!(price + 0.5),
                json!(price + 1.0),
                json!(price - 1.0),
                json!(10_000.0),
                json!(100.0),
                json!(format!("2024-01-05 10:{i:02}:00")),
                json!(format!("2024-01-05 10:{i:02}:59")),
            ]
        }))
}
