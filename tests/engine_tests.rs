//! End-to-end scenarios through the price engine.

mod support;

use std::time::Duration;

use rust_decimal_macros::dec;
use tokio::sync::{mpsc, watch};
use twinleg::app::Engine;
use twinleg::config::ArbitrageConfig;
use twinleg::domain::{PlacementOutcome, TokenId};
use twinleg::exchange::FeedConnection;
use twinleg::testkit::domain::{disconnect_event, mapping, market_id, price, price_event, token};
use twinleg::testkit::executor::RecordingExecutor;
use twinleg::testkit::stream::channel_stream;

use support::config::test_reconnection_config;
use support::execution::{harness, Harness};

fn arbitrage(threshold: rust_decimal::Decimal) -> ArbitrageConfig {
    ArbitrageConfig {
        threshold,
        order_size: dec!(100),
        verbose: true,
    }
}

fn engine(h: &Harness, markets: &[&str]) -> Engine {
    Engine::new(mapping(markets), &arbitrage(dec!(0.01)), h.coordinator.clone())
}

#[tokio::test]
async fn complementary_asks_below_threshold_trigger_execution() {
    let h = harness(RecordingExecutor::new());
    let mut engine = engine(&h, &["m"]);

    assert!(engine.on_price(price("m-yes", dec!(0.46))).is_none());
    let opp = engine.on_price(price("m-no", dec!(0.50))).unwrap();

    assert_eq!(opp.market_id, market_id("m"));
    assert_eq!((opp.yes_price, opp.no_price), (dec!(0.46), dec!(0.50)));
    assert_eq!(opp.combined(), dec!(0.96));

    let reports = engine.drain().await;
    assert_eq!(reports.len(), 1);
    assert!(reports[0].is_success());

    let mut prices: Vec<_> = h
        .executor
        .buys()
        .into_iter()
        .map(|o| (o.token_id, o.price))
        .collect();
    prices.sort();
    assert_eq!(
        prices,
        vec![(token("m-no"), dec!(0.50)), (token("m-yes"), dec!(0.46))]
    );

    let stats = engine.stats();
    assert_eq!(stats.price_events, 2);
    assert_eq!(stats.triggers, 1);
    assert_eq!(stats.executions, 1);
}

#[tokio::test]
async fn unmapped_token_is_a_no_op() {
    let h = harness(RecordingExecutor::new());
    let mut engine = engine(&h, &["m"]);

    assert!(engine.on_price(price("stranger", dec!(0.01))).is_none());

    assert!(engine.ledger().is_empty());
    assert_eq!(engine.stats().unmapped_events, 1);
    assert_eq!(engine.stats().triggers, 0);
    assert!(h.executor.orders().is_empty());
}

#[tokio::test]
async fn open_window_is_suppressed_while_execution_is_in_flight() {
    let delay = Duration::from_millis(100);
    let h = harness(
        RecordingExecutor::new()
            .with_delay(&token("m-yes"), delay)
            .with_delay(&token("m-no"), delay),
    );
    let mut engine = engine(&h, &["m"]);

    engine.on_price(price("m-yes", dec!(0.40)));
    assert!(engine.on_price(price("m-no", dec!(0.40))).is_some());
    for ask in [dec!(0.41), dec!(0.42), dec!(0.43)] {
        assert!(engine.on_price(price("m-no", ask)).is_none());
    }

    let stats = engine.stats();
    assert_eq!(stats.triggers, 4);
    assert_eq!(stats.suppressed, 3);
    assert_eq!(stats.executions, 1);

    engine.drain().await;
    assert_eq!(h.executor.buys().len(), 2);

    // Released: the still-open window fires again.
    assert!(engine.on_price(price("m-no", dec!(0.44))).is_some());
    engine.drain().await;
    assert_eq!(engine.stats().executions, 2);
}

#[tokio::test]
async fn exposure_halts_only_the_affected_market() {
    let h = harness(
        RecordingExecutor::new()
            .with_buy_outcome(
                &token("a-no"),
                PlacementOutcome::Errored {
                    reason: "timeout".into(),
                },
            )
            .with_cancel_error("venue unreachable")
            .with_sell_outcome(PlacementOutcome::Rejected {
                reason: "no bids".into(),
            }),
    );
    let mut engine = engine(&h, &["a", "b"]);

    engine.on_price(price("a-yes", dec!(0.40)));
    engine.on_price(price("a-no", dec!(0.40)));
    let reports = engine.drain().await;
    assert!(reports[0].is_exposed());
    assert_eq!(engine.stats().exposures, 1);

    assert!(engine.on_price(price("a-no", dec!(0.39))).is_none());
    assert!(h.guard.is_halted(&market_id("a")));
    assert_eq!(engine.halted_markets(), vec![market_id("a")]);

    engine.on_price(price("b-yes", dec!(0.40)));
    assert!(engine.on_price(price("b-no", dec!(0.40))).is_some());
    engine.drain().await;
}

#[tokio::test]
async fn reconnect_resubscribes_identical_tokens_and_resumes_updates() {
    let h = harness(RecordingExecutor::new());
    let mut engine = engine(&h, &["m", "n"]);
    let tokens: Vec<TokenId> = mapping(&["m", "n"]).token_ids();

    let (stream, handle) = channel_stream(16);
    let mut feed = FeedConnection::connect(stream, &tokens, test_reconnection_config())
        .await
        .unwrap();

    handle.send(price_event("m-yes", dec!(0.60))).await;
    let event = feed.next_price().await.unwrap();
    engine.on_price(event);

    handle.send(disconnect_event("link dropped")).await;
    handle.send(price_event("m-no", dec!(0.45))).await;
    let event = feed.next_price().await.unwrap();
    engine.on_price(event);

    assert_eq!(handle.connect_count(), 2);
    let subscriptions = handle.subscriptions();
    assert_eq!(subscriptions.len(), 2);
    assert_eq!(subscriptions[0], tokens);
    assert_eq!(subscriptions[1], subscriptions[0]);

    let entry = engine.ledger().read(&market_id("m"));
    assert_eq!(entry.yes_price, Some(dec!(0.60)));
    assert_eq!(entry.no_price, Some(dec!(0.45)));
}

#[tokio::test]
async fn run_consumes_channel_until_closed() {
    let h = harness(RecordingExecutor::new());
    let engine = engine(&h, &["m"]);
    let (tx, rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let run = tokio::spawn(engine.run(rx, shutdown_rx));
    tx.send(price("m-yes", dec!(0.46))).await.unwrap();
    tx.send(price("m-no", dec!(0.50))).await.unwrap();
    drop(tx);

    let stats = run.await.unwrap();
    assert_eq!(stats.price_events, 2);
    assert_eq!(stats.executions, 1);
    assert_eq!(h.executor.buys().len(), 2);
}

#[tokio::test]
async fn run_stops_on_shutdown_signal() {
    let h = harness(RecordingExecutor::new());
    let engine = engine(&h, &["m"]);
    let (_tx, rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let run = tokio::spawn(engine.run(rx, shutdown_rx));
    shutdown_tx.send(true).unwrap();

    let stats = tokio::time::timeout(Duration::from_secs(1), run)
        .await
        .expect("engine stopped")
        .unwrap();
    assert_eq!(stats.price_events, 0);
}

#[tokio::test]
async fn run_leaves_exposed_market_halted_at_shutdown() {
    let h = harness(
        RecordingExecutor::new()
            .with_buy_outcome(
                &token("m-no"),
                PlacementOutcome::Errored {
                    reason: "timeout".into(),
                },
            )
            .with_cancel_error("venue unreachable")
            .with_sell_outcome(PlacementOutcome::Rejected {
                reason: "no bids".into(),
            }),
    );
    let engine = engine(&h, &["m"]);
    let (tx, rx) = mpsc::channel(8);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    let run = tokio::spawn(engine.run(rx, shutdown_rx));
    tx.send(price("m-yes", dec!(0.46))).await.unwrap();
    tx.send(price("m-no", dec!(0.50))).await.unwrap();
    drop(tx);

    let stats = run.await.unwrap();
    assert_eq!(stats.exposures, 1);
    assert_eq!(h.guard.halted_markets(), vec![market_id("m")]);
    assert!(!h.guard.is_pending(&market_id("m")));
}
