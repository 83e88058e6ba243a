//! Automatic reconnection for any [`MarketDataStream`].
//!
//! On link loss the wrapper backs off exponentially (bounded by
//! `max_delay_ms`, with up to 20% random jitter), reconnects, and re-issues
//! the last subscription with the identical token set. Downstream consumers
//! never see the `Disconnected` event; they simply see events resume.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::traits::{MarketDataStream, MarketEvent};
use crate::config::ReconnectionConfig;
use crate::domain::TokenId;
use crate::error::Result;

/// Circuit breaker guarding reconnection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CircuitState {
    Closed,
    /// Too many consecutive failures; attempts wait until `until`.
    Open { until: Instant },
}

/// Wraps a stream with backoff, resubscription and a circuit breaker.
pub struct ReconnectingDataStream<S: MarketDataStream> {
    inner: S,
    config: ReconnectionConfig,
    /// Last subscription, replayed verbatim after every reconnect.
    subscribed_tokens: Vec<TokenId>,
    consecutive_failures: u32,
    current_delay_ms: u64,
    circuit_state: CircuitState,
    connected: bool,
    reconnects: u64,
}

impl<S: MarketDataStream> ReconnectingDataStream<S> {
    /// The wrapper starts disconnected; call `connect` before reading events.
    pub fn new(inner: S, config: ReconnectionConfig) -> Self {
        let current_delay_ms = config.initial_delay_ms;
        Self {
            inner,
            config,
            subscribed_tokens: Vec::new(),
            consecutive_failures: 0,
            current_delay_ms,
            circuit_state: CircuitState::Closed,
            connected: false,
            reconnects: 0,
        }
    }

    /// Tokens that will be resubscribed after a reconnect.
    #[must_use]
    pub fn subscribed_tokens(&self) -> &[TokenId] {
        &self.subscribed_tokens
    }

    /// Successful reconnects since construction.
    #[must_use]
    pub const fn reconnect_count(&self) -> u64 {
        self.reconnects
    }

    fn reset_backoff(&mut self) {
        self.consecutive_failures = 0;
        self.current_delay_ms = self.config.initial_delay_ms;
        self.circuit_state = CircuitState::Closed;
    }

    /// Current delay plus jitter; advances the delay for the next attempt.
    fn next_delay(&mut self) -> Duration {
        let base_ms = self.current_delay_ms;
        let delay = Duration::from_millis(base_ms + jitter_ms(base_ms));

        let grown = (base_ms as f64 * self.config.backoff_multiplier) as u64;
        self.current_delay_ms = grown.min(self.config.max_delay_ms);

        delay
    }

    fn record_failure(&mut self) {
        self.consecutive_failures += 1;
        self.connected = false;

        if self.consecutive_failures >= self.config.max_consecutive_failures {
            let cooldown = Duration::from_millis(self.config.circuit_breaker_cooldown_ms);
            self.circuit_state = CircuitState::Open {
                until: Instant::now() + cooldown,
            };
            error!(
                failures = self.consecutive_failures,
                cooldown_ms = self.config.circuit_breaker_cooldown_ms,
                "Circuit breaker tripped, pausing reconnection attempts"
            );
        }
    }

    /// True if a connection attempt may proceed now. Closes an expired circuit.
    fn circuit_allows_connection(&mut self) -> bool {
        match self.circuit_state {
            CircuitState::Closed => true,
            CircuitState::Open { until } if Instant::now() >= until => {
                info!("Circuit breaker cooldown expired");
                self.reset_backoff();
                true
            }
            CircuitState::Open { .. } => false,
        }
    }

    async fn wait_for_circuit(&mut self) {
        if self.circuit_allows_connection() {
            return;
        }
        if let CircuitState::Open { until } = self.circuit_state {
            let remaining = until.saturating_duration_since(Instant::now());
            warn!(
                remaining_ms = remaining.as_millis() as u64,
                "Circuit breaker open, waiting for cooldown"
            );
            sleep(remaining).await;
        }
        self.reset_backoff();
    }

    async fn reconnect(&mut self) -> Result<()> {
        self.wait_for_circuit().await;

        let delay = self.next_delay();
        info!(
            exchange = self.inner.exchange_name(),
            delay_ms = delay.as_millis() as u64,
            attempt = self.consecutive_failures + 1,
            "Reconnecting after delay"
        );
        sleep(delay).await;

        if let Err(e) = self.inner.connect().await {
            error!(error = %e, "Reconnection failed");
            self.record_failure();
            return Err(e);
        }

        if !self.subscribed_tokens.is_empty() {
            debug!(tokens = self.subscribed_tokens.len(), "Resubscribing");
            if let Err(e) = self.inner.subscribe(&self.subscribed_tokens).await {
                error!(error = %e, "Resubscribe failed after reconnect");
                self.record_failure();
                return Err(e);
            }
        }

        self.connected = true;
        self.reconnects += 1;
        info!(
            tokens = self.subscribed_tokens.len(),
            reconnects = self.reconnects,
            "Reconnected and resubscribed"
        );
        Ok(())
    }
}

/// Up to 20% of the base delay, uniformly random.
fn jitter_ms(base_ms: u64) -> u64 {
    let range = base_ms / 5;
    if range == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=range)
}

#[async_trait]
impl<S: MarketDataStream> MarketDataStream for ReconnectingDataStream<S> {
    async fn connect(&mut self) -> Result<()> {
        self.inner.connect().await?;
        self.connected = true;
        self.reset_backoff();
        Ok(())
    }

    async fn subscribe(&mut self, token_ids: &[TokenId]) -> Result<()> {
        self.subscribed_tokens = token_ids.to_vec();
        self.inner.subscribe(token_ids).await
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        loop {
            if !self.connected {
                if let Err(e) = self.reconnect().await {
                    warn!(error = %e, "Reconnection attempt failed, will retry");
                    continue;
                }
            }

            match self.inner.next_event().await {
                Some(MarketEvent::Disconnected { reason }) => {
                    warn!(reason = %reason, "Connection lost, will reconnect");
                    self.record_failure();
                }
                Some(event) => {
                    if self.consecutive_failures > 0 {
                        self.reset_backoff();
                    }
                    return Some(event);
                }
                None => {
                    warn!("Data stream ended, will reconnect");
                    self.record_failure();
                }
            }
        }
    }

    fn exchange_name(&self) -> &'static str {
        self.inner.exchange_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::error::Error;
    use crate::testkit::domain::{disconnect_event, price_event, token};
    use crate::testkit::stream::{channel_stream, ScriptedStream};
    use rust_decimal_macros::dec;

    fn backoff_config() -> ReconnectionConfig {
        ReconnectionConfig {
            initial_delay_ms: 10,
            max_delay_ms: 100,
            backoff_multiplier: 2.0,
            max_consecutive_failures: 3,
            circuit_breaker_cooldown_ms: 50,
        }
    }

    fn fast_config() -> ReconnectionConfig {
        ReconnectionConfig {
            initial_delay_ms: 1,
            max_delay_ms: 10,
            backoff_multiplier: 2.0,
            max_consecutive_failures: 3,
            circuit_breaker_cooldown_ms: 10,
        }
    }

    #[tokio::test]
    async fn passes_price_events_through() {
        let mock = ScriptedStream::new().with_events(vec![Some(price_event("t1", dec!(0.4)))]);

        let mut stream = ReconnectingDataStream::new(mock, backoff_config());
        stream.connect().await.unwrap();

        assert_eq!(stream.next_event().await, Some(price_event("t1", dec!(0.4))));
    }

    #[tokio::test]
    async fn disconnect_is_hidden_and_stream_resumes() {
        let mock = ScriptedStream::new().with_events(vec![
            Some(disconnect_event("reset by peer")),
            Some(price_event("t1", dec!(0.4))),
        ]);
        let (connect_count, subscribe_count) = mock.counts();

        let mut stream = ReconnectingDataStream::new(mock, fast_config());
        stream.connect().await.unwrap();
        stream.subscribe(&[token("t1")]).await.unwrap();

        assert_eq!(stream.next_event().await, Some(price_event("t1", dec!(0.4))));
        assert_eq!(connect_count.load(Ordering::SeqCst), 2);
        assert_eq!(subscribe_count.load(Ordering::SeqCst), 2);
        assert_eq!(stream.reconnect_count(), 1);
    }

    #[tokio::test]
    async fn resubscribes_identical_token_set() {
        let (mock, handle) = channel_stream(8);
        let tokens = vec![token("a"), token("b"), token("c")];

        let mut stream = ReconnectingDataStream::new(mock, fast_config());
        stream.connect().await.unwrap();
        stream.subscribe(&tokens).await.unwrap();

        handle.send(disconnect_event("drop")).await;
        handle.send(price_event("b", dec!(0.3))).await;

        assert_eq!(stream.next_event().await, Some(price_event("b", dec!(0.3))));
        assert_eq!(handle.subscribe_count(), 2);
        assert_eq!(handle.subscribed_tokens(), tokens);
    }

    #[tokio::test]
    async fn failed_reconnect_is_retried() {
        let mock = ScriptedStream::new()
            .with_connect_results(vec![
                Ok(()),
                Err(Error::Connection("refused".into())),
            ])
            .with_events(vec![
                Some(disconnect_event("drop")),
                Some(price_event("t1", dec!(0.5))),
            ]);
        let (connect_count, _) = mock.counts();

        let mut stream = ReconnectingDataStream::new(mock, fast_config());
        stream.connect().await.unwrap();

        assert_eq!(stream.next_event().await, Some(price_event("t1", dec!(0.5))));
        assert_eq!(connect_count.load(Ordering::SeqCst), 3);
        assert_eq!(stream.consecutive_failures, 0);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let mut stream = ReconnectingDataStream::new(ScriptedStream::new(), backoff_config());

        for base in [10u64, 20, 40, 80, 100, 100] {
            let ms = stream.next_delay().as_millis() as u64;
            assert!(
                (base..=base + base / 5).contains(&ms),
                "delay {ms}ms outside {base}..={}",
                base + base / 5
            );
        }
    }

    #[test]
    fn zero_delay_has_no_jitter() {
        assert_eq!(jitter_ms(0), 0);
        assert_eq!(jitter_ms(4), 0);
    }

    #[test]
    fn circuit_trips_at_threshold() {
        let mut stream = ReconnectingDataStream::new(ScriptedStream::new(), backoff_config());

        stream.record_failure();
        stream.record_failure();
        assert!(stream.circuit_allows_connection());

        stream.record_failure();
        assert!(matches!(stream.circuit_state, CircuitState::Open { .. }));
        assert!(!stream.circuit_allows_connection());
    }

    #[tokio::test]
    async fn circuit_closes_after_cooldown() {
        let mut stream = ReconnectingDataStream::new(ScriptedStream::new(), fast_config());
        for _ in 0..3 {
            stream.record_failure();
        }
        assert!(!stream.circuit_allows_connection());

        tokio::time::sleep(Duration::from_millis(15)).await;

        assert!(stream.circuit_allows_connection());
        assert_eq!(stream.consecutive_failures, 0);
        assert_eq!(stream.current_delay_ms, 1);
    }

    #[tokio::test]
    async fn subscribe_replaces_stored_tokens() {
        let mut stream = ReconnectingDataStream::new(ScriptedStream::new(), backoff_config());

        stream.subscribe(&[token("old")]).await.unwrap();
        stream.subscribe(&[token("new1"), token("new2")]).await.unwrap();

        assert_eq!(stream.subscribed_tokens(), &[token("new1"), token("new2")]);
    }

    #[tokio::test]
    async fn initial_connect_failure_leaves_disconnected() {
        let mock = ScriptedStream::new()
            .with_connect_results(vec![Err(Error::Connection("handshake timeout".into()))]);
        let mut stream = ReconnectingDataStream::new(mock, backoff_config());

        assert!(stream.connect().await.is_err());
        assert!(!stream.connected);
        assert_eq!(stream.exchange_name(), "scripted");
    }
}
