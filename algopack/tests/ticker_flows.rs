mod common;

use std::sync::Arc;

use algopack::{AlgopackError, CandleQuery, StatQuery, TradesQuery, collect};
use algopack_core::transport::RawResponse;
use algopack_mock::fixtures::boards_listing;
use algopack_mock::{MockTransport, SectionFixture};
use common::{client, minute_candles_fixture, sber_listing, tradestats_fixture};
use serde_json::json;

fn start_of(params: &[(String, String)]) -> usize {
    params
        .iter()
        .find(|(k, _)| k == "start")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0)
}

/// Routes resolution to the SBER boards listing and everything else to the
/// given per-section fixture.
fn sber_transport(fixture: SectionFixture, page_size: usize) -> Arc<MockTransport> {
    let listing = sber_listing();
    Arc::new(MockTransport::with_handler(move |url, params| {
        if url.ends_with("/securities/SBER.json") {
            Ok(RawResponse::ok_json(listing.clone()))
        } else {
            Ok(RawResponse::ok_json(fixture.page(start_of(params), page_size)))
        }
    }))
}

#[tokio::test]
async fn resolution_selects_the_primary_board_and_splits_suffixes() {
    let transport = sber_transport(minute_candles_fixture(0), 10);
    let api = client(Arc::clone(&transport));

    let sber = api.ticker("SBER").await.unwrap();
    assert_eq!(sber.ticker(), "SBER");
    assert_eq!(sber.board(), "TQBR");
    assert_eq!(sber.decimals(), 2);
    assert!(!sber.delisted());

    let on_small = api.ticker("SBER.SMAL").await.unwrap();
    assert_eq!(on_small.board(), "SMAL");

    let conflict = api.ticker_on("SBER", Some("TQTF")).await;
    assert!(matches!(conflict, Err(AlgopackError::Validation(_))));
}

#[tokio::test]
async fn candle_requests_carry_the_window_and_interval() {
    let transport = sber_transport(minute_candles_fixture(3), 10);
    let sber = client(Arc::clone(&transport)).ticker("SBER").await.unwrap();

    let records = collect(
        sber.candles(CandleQuery::range("2024-01-05", "2024-01-10").period(10u32))
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(records.len(), 3);

    let candles_request = &transport.requests()[1];
    assert!(candles_request.url.ends_with(
        "engines/stock/markets/shares/boards/TQBR/securities/SBER/candles.json"
    ));
    assert_eq!(candles_request.param("from"), Some("2024-01-05"));
    assert_eq!(candles_request.param("till"), Some("2024-01-10"));
    assert_eq!(candles_request.param("interval"), Some("10"));
}

#[tokio::test]
async fn compound_periods_fetch_the_base_and_resample_locally() {
    let transport = sber_transport(minute_candles_fixture(10), 50);
    let sber = client(Arc::clone(&transport)).ticker("SBER").await.unwrap();

    let records = collect(
        sber.candles(CandleQuery::range("2024-01-05", "2024-01-05").period("5min"))
            .unwrap(),
    )
    .await
    .unwrap();

    // The wire was asked for the 1-minute base granularity.
    assert_eq!(transport.requests()[1].param("interval"), Some("1"));

    // Ten minute-candles collapse into two 5-minute windows.
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].float("open"), Some(280.0));
    assert_eq!(records[0].float("close"), Some(284.5));
    assert_eq!(records[0].int("volume"), Some(500));
    assert_eq!(records[1].float("open"), Some(285.0));
}

#[tokio::test]
async fn latest_mode_reverses_and_collapses_to_one_record() {
    let transport = sber_transport(minute_candles_fixture(5), 50);
    let sber = client(Arc::clone(&transport)).ticker("SBER").await.unwrap();

    let records = collect(
        sber.candles(
            CandleQuery::range("2024-01-05", "2024-01-05")
                .period("1min")
                .latest(),
        )
        .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(transport.requests()[1].param("iss.reverse"), Some("true"));
}

#[tokio::test]
async fn instrument_stats_hit_the_lowercased_algopack_path() {
    let transport = sber_transport(tradestats_fixture(4), 50);
    let sber = client(Arc::clone(&transport)).ticker("SBER").await.unwrap();

    let records = collect(
        sber.tradestats(&StatQuery::range("2024-04-22", "2024-04-22"))
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(records.len(), 4);

    let request = &transport.requests()[1];
    assert!(request.url.ends_with("datashop/algopack/eq/tradestats/sber.json"));
    assert_eq!(request.param("from"), Some("2024-04-22"));
    assert_eq!(request.param("till"), Some("2024-04-22"));

    let inverted = sber.tradestats(&StatQuery::range("2024-04-23", "2024-04-22"));
    assert!(matches!(inverted, Err(AlgopackError::InvalidRange(_))));

    let dateless = sber.tradestats(&StatQuery::default());
    assert!(matches!(dateless, Err(AlgopackError::InvalidRange(_))));
}

#[tokio::test]
async fn trades_resume_from_a_trade_number() {
    let trades = SectionFixture::new("trades")
        .column("SECID", "string")
        .column("tradeno", "int64")
        .rows((0..3).map(|i| vec![json!("SBER"), json!(1000 + i)]));
    let transport = sber_transport(trades, 50);
    let sber = client(Arc::clone(&transport)).ticker("SBER").await.unwrap();

    collect(sber.trades(TradesQuery::from_cursor(1000)).unwrap())
        .await
        .unwrap();
    let request = &transport.requests()[1];
    assert!(request.url.ends_with("securities/SBER/trades.json"));
    assert_eq!(request.param("tradeno"), Some("1000"));
}

#[tokio::test]
async fn the_order_book_drains_unbounded() {
    let book = SectionFixture::new("orderbook")
        .column("SECID", "string")
        .column("price", "double")
        .rows((0..5).map(|i| vec![json!("SBER"), json!(280.0 + f64::from(i))]));
    let transport = sber_transport(book, 2);
    let sber = client(Arc::clone(&transport)).ticker("SBER").await.unwrap();

    let rows = collect(sber.orderbook().unwrap()).await.unwrap();
    assert_eq!(rows.len(), 5);
}

#[tokio::test]
async fn currency_instruments_have_no_order_book() {
    let listing = boards_listing(&[("CETS", "currency", "selt", 1, 4, "2100-01-01")]);
    let transport = Arc::new(MockTransport::always(listing.body()));
    let cny = client(transport).ticker("CNY000000TOD").await.unwrap();

    assert!(matches!(
        cny.orderbook(),
        Err(AlgopackError::Unsupported { .. })
    ));
}

#[tokio::test]
async fn futoi_resolves_the_contract_asset_code() {
    let listing = boards_listing(&[("RFUD", "futures", "forts", 1, 0, "2100-01-01")]).body();
    let sectypes = SectionFixture::new("securities")
        .column("SECID", "string")
        .column("SECTYPE", "string")
        .row(vec![json!("SiU4"), json!("Si")])
        .body();
    let futoi = SectionFixture::new("futoi")
        .column("SECID", "string")
        .column("clgroup", "string")
        .column("pos", "int64")
        .row(vec![json!("Si"), json!("YUR"), json!(1_500)]);

    let transport = Arc::new(MockTransport::with_handler(move |url, params| {
        if url.ends_with("/securities/SiU4.json") {
            Ok(RawResponse::ok_json(listing.clone()))
        } else if url.ends_with("/boards/RFUD/securities.json") {
            Ok(RawResponse::ok_json(sectypes.clone()))
        } else {
            Ok(RawResponse::ok_json(futoi.page(start_of(params), 50)))
        }
    }));

    let si = client(Arc::clone(&transport)).ticker("SiU4").await.unwrap();
    let rows = collect(
        si.futoi(&StatQuery::range("2024-04-22", "2024-04-22"))
            .await
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].str("clgroup"), Some("YUR"));
    let futoi_request = transport
        .requests()
        .into_iter()
        .find(|r| r.url.contains("futoi"))
        .unwrap();
    assert!(
        futoi_request
            .url
            .ends_with("analyticalproducts/futoi/securities/si.json")
    );
}

#[tokio::test]
async fn futoi_outside_derivatives_is_unsupported() {
    let transport = sber_transport(minute_candles_fixture(0), 10);
    let sber = client(transport).ticker("SBER").await.unwrap();

    let err = sber
        .futoi(&StatQuery::range("2024-04-22", "2024-04-22"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, AlgopackError::Unsupported { .. }));
}
