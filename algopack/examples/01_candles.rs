//! Fetch a week of hourly candles for one instrument.
//!
//! Run with `cargo run --example 01_candles` (hits the public endpoint).

use algopack::{Algopack, Candle, CandleQuery, FromRecord};
use futures::TryStreamExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let api = Algopack::builder().token_from_env().build()?;
    let sber = api.ticker("SBER").await?;
    println!(
        "{} on {} ({} decimals)",
        sber.ticker(),
        sber.board(),
        sber.decimals()
    );

    let records: Vec<_> = sber
        .candles(CandleQuery::range("2024-01-03", "2024-01-10").period("1h"))?
        .try_collect()
        .await?;

    for record in &records {
        let candle = Candle::from_record(record)?;
        println!(
            "{}  o={} h={} l={} c={} vol={}",
            candle.begin, candle.open, candle.high, candle.low, candle.close, candle.volume
        );
    }
    println!("{} candles", records.len());
    Ok(())
}
