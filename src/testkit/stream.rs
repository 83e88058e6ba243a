//! Mock [`MarketDataStream`] implementations for testing.
//!
//! - [`ScriptedStream`]: pre-loaded connect/subscribe results and events.
//!   Suited to error handling and reconnection logic.
//! - [`ChannelStream`]: channel-backed stream driven through a
//!   [`ChannelStreamHandle`]. Suited to integration tests that need
//!   on-demand event delivery.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::domain::TokenId;
use crate::error::Result;
use crate::exchange::{MarketDataStream, MarketEvent};

/// A mock stream with scripted connect/subscribe results and a fixed event queue.
///
/// Each `connect()` or `subscribe()` pops the next scripted result, falling
/// back to `Ok(())` once the queue is empty. An exhausted event queue ends
/// the stream.
pub struct ScriptedStream {
    connect_results: VecDeque<Result<()>>,
    subscribe_results: VecDeque<Result<()>>,
    events: VecDeque<Option<MarketEvent>>,
    connect_count: Arc<AtomicU32>,
    subscribe_count: Arc<AtomicU32>,
}

impl ScriptedStream {
    pub fn new() -> Self {
        Self {
            connect_results: VecDeque::new(),
            subscribe_results: VecDeque::new(),
            events: VecDeque::new(),
            connect_count: Arc::new(AtomicU32::new(0)),
            subscribe_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_connect_results(mut self, results: Vec<Result<()>>) -> Self {
        self.connect_results = results.into();
        self
    }

    pub fn with_subscribe_results(mut self, results: Vec<Result<()>>) -> Self {
        self.subscribe_results = results.into();
        self
    }

    pub fn with_events(mut self, events: Vec<Option<MarketEvent>>) -> Self {
        self.events = events.into();
        self
    }

    /// Shared `(connect, subscribe)` counters that survive moving the stream.
    pub fn counts(&self) -> (Arc<AtomicU32>, Arc<AtomicU32>) {
        (self.connect_count.clone(), self.subscribe_count.clone())
    }
}

impl Default for ScriptedStream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataStream for ScriptedStream {
    async fn connect(&mut self) -> Result<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        self.connect_results.pop_front().unwrap_or(Ok(()))
    }

    async fn subscribe(&mut self, _token_ids: &[TokenId]) -> Result<()> {
        self.subscribe_count.fetch_add(1, Ordering::SeqCst);
        self.subscribe_results.pop_front().unwrap_or(Ok(()))
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        self.events.pop_front().flatten()
    }

    fn exchange_name(&self) -> &'static str {
        "scripted"
    }
}

/// A mock stream controlled externally via a [`ChannelStreamHandle`].
pub struct ChannelStream {
    event_rx: mpsc::Receiver<Option<MarketEvent>>,
    shared: Arc<ChannelShared>,
}

#[derive(Default)]
struct ChannelShared {
    connect_count: AtomicU32,
    subscribe_count: AtomicU32,
    subscriptions: Mutex<Vec<Vec<TokenId>>>,
}

/// Control handle for a [`ChannelStream`].
#[derive(Clone)]
pub struct ChannelStreamHandle {
    event_tx: mpsc::Sender<Option<MarketEvent>>,
    shared: Arc<ChannelShared>,
}

impl ChannelStreamHandle {
    /// Deliver an event to the stream.
    pub async fn send(&self, event: MarketEvent) {
        let _ = self.event_tx.send(Some(event)).await;
    }

    /// Signal end-of-stream (`next_event` returns `None` once).
    pub async fn close(&self) {
        let _ = self.event_tx.send(None).await;
    }

    pub fn connect_count(&self) -> u32 {
        self.shared.connect_count.load(Ordering::SeqCst)
    }

    pub fn subscribe_count(&self) -> u32 {
        self.shared.subscribe_count.load(Ordering::SeqCst)
    }

    /// Tokens from the most recent `subscribe` call.
    pub fn subscribed_tokens(&self) -> Vec<TokenId> {
        self.shared
            .subscriptions
            .lock()
            .last()
            .cloned()
            .unwrap_or_default()
    }

    /// Every `subscribe` call, in order.
    pub fn subscriptions(&self) -> Vec<Vec<TokenId>> {
        self.shared.subscriptions.lock().clone()
    }
}

/// Create a [`ChannelStream`] and its control [`ChannelStreamHandle`].
pub fn channel_stream(buffer: usize) -> (ChannelStream, ChannelStreamHandle) {
    let (event_tx, event_rx) = mpsc::channel(buffer);
    let shared = Arc::new(ChannelShared::default());
    (
        ChannelStream {
            event_rx,
            shared: shared.clone(),
        },
        ChannelStreamHandle { event_tx, shared },
    )
}

#[async_trait]
impl MarketDataStream for ChannelStream {
    async fn connect(&mut self) -> Result<()> {
        self.shared.connect_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(&mut self, token_ids: &[TokenId]) -> Result<()> {
        self.shared.subscribe_count.fetch_add(1, Ordering::SeqCst);
        self.shared.subscriptions.lock().push(token_ids.to_vec());
        Ok(())
    }

    async fn next_event(&mut self) -> Option<MarketEvent> {
        self.event_rx.recv().await.flatten()
    }

    fn exchange_name(&self) -> &'static str {
        "channel"
    }
}
