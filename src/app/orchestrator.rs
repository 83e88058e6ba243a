//! Application wiring.
//!
//! Discovery builds the token mapping once, the feed runs on its own task
//! and pushes prices into a channel, and the [`Engine`] consumes them.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use super::coordinator::ExecutionCoordinator;
use super::engine::{Engine, StatsSnapshot};
use super::guard::ExecutionGuard;
use crate::adapter::polymarket::{GammaClient, PolymarketDataStream};
use crate::adapter::DryRunExecutor;
use crate::config::Config;
use crate::domain::{MarketPair, TokenMapping};
use crate::error::Result;
use crate::exchange::{ExecutionClient, FeedConnection};

/// Capacity of the feed-to-engine price channel.
const PRICE_CHANNEL_CAPACITY: usize = 4096;

/// Main application entry point.
pub struct App;

impl App {
    /// Run until Ctrl-C or until the feed ends.
    ///
    /// # Errors
    ///
    /// Returns an error if discovery, the initial feed connection, or
    /// execution client setup fails.
    pub async fn run(config: Config) -> Result<StatsSnapshot> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Ctrl-C received, shutting down"),
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
            }
            let _ = shutdown_tx.send(true);
        });
        Self::run_with_shutdown(config, shutdown_rx).await
    }

    /// Run until `shutdown` flips to `true` or the feed ends.
    ///
    /// # Errors
    ///
    /// See [`App::run`].
    pub async fn run_with_shutdown(
        config: Config,
        shutdown: watch::Receiver<bool>,
    ) -> Result<StatsSnapshot> {
        info!(
            dry_run = config.execution.dry_run,
            threshold = %config.arbitrage.threshold,
            order_size = %config.arbitrage.order_size,
            "Starting twinleg"
        );

        let mapping = Arc::new(TokenMapping::from_pairs(Self::discover(&config).await?));
        if mapping.is_empty() {
            warn!("No binary markets discovered, nothing to monitor");
            return Ok(StatsSnapshot::default());
        }
        info!(markets = mapping.market_count(), "Token mapping built");

        let client = init_executor(&config).await?;
        let guard = Arc::new(ExecutionGuard::new());
        let coordinator = Arc::new(ExecutionCoordinator::new(
            client,
            guard,
            &config.execution,
        ));

        let stream = PolymarketDataStream::new(
            config.network.ws_url.clone(),
            config.network.connect_timeout(),
        );
        let feed = FeedConnection::connect(
            stream,
            &mapping.token_ids(),
            config.reconnection.clone(),
        )
        .await?;

        let (tx, rx) = mpsc::channel(PRICE_CHANNEL_CAPACITY);
        let feed_task = feed.spawn(tx);

        let engine = Engine::new(mapping, &config.arbitrage, coordinator);
        let stats = engine.run(rx, shutdown).await;

        feed_task.abort();
        Ok(stats)
    }

    /// Fetch binary markets from the discovery API.
    ///
    /// # Errors
    ///
    /// Returns an error if a discovery request fails.
    pub async fn discover(config: &Config) -> Result<Vec<MarketPair>> {
        let gamma = GammaClient::new(config.network.gamma_url.clone(), config.discovery.clone())?;
        gamma.discover().await
    }
}

/// Build the execution client: simulated in dry-run mode, the venue otherwise.
async fn init_executor(config: &Config) -> Result<Arc<dyn ExecutionClient>> {
    if config.execution.dry_run {
        info!("Dry-run mode, orders will be simulated");
        return Ok(Arc::new(DryRunExecutor::new()));
    }
    live_executor(config).await
}

#[cfg(feature = "polymarket")]
async fn live_executor(config: &Config) -> Result<Arc<dyn ExecutionClient>> {
    let executor = crate::adapter::polymarket::PolymarketExecutor::connect(config).await?;
    Ok(Arc::new(executor))
}

#[cfg(not(feature = "polymarket"))]
async fn live_executor(_config: &Config) -> Result<Arc<dyn ExecutionClient>> {
    Err(crate::error::ConfigError::InvalidValue {
        field: "dry_run",
        reason: "live execution requires the `polymarket` feature".into(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dry_run_selects_simulated_executor() {
        let mut config = Config::default();
        config.execution.dry_run = true;

        let client = init_executor(&config).await.unwrap();
        assert_eq!(client.exchange_name(), "dry-run");
    }

    #[cfg(feature = "polymarket")]
    #[tokio::test]
    async fn live_mode_without_key_fails() {
        let config = Config::default();
        assert!(init_executor(&config).await.is_err());
    }
}
