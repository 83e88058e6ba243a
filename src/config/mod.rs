//! Application configuration loading and validation.
//!
//! Configuration is read from a TOML file, then selected values are
//! overridden from the environment (`.env` files are loaded by the binary
//! through `dotenvy`). The wallet key is only ever taken from the
//! environment.
//!
//! ```no_run
//! use twinleg::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

mod logging;
mod reconnection;

pub use logging::LoggingConfig;
pub use reconnection::ReconnectionConfig;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{DetectorConfig, Price, Volume};
use crate::error::{ConfigError, Result};

/// Endpoints and chain settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Streaming order-book channel.
    pub ws_url: String,
    /// CLOB REST API used for order placement.
    pub api_url: String,
    /// Gamma REST API used for market discovery.
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Bound on the streaming handshake (milliseconds).
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".into()
}

fn default_chain_id() -> u64 {
    137
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

impl NetworkConfig {
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ws_url: "wss://ws-subscriptions-clob.polymarket.com/ws/market".into(),
            api_url: "https://clob.polymarket.com".into(),
            gamma_url: default_gamma_url(),
            chain_id: default_chain_id(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// Detection and sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct ArbitrageConfig {
    /// Minimum discount below 1.0, as a fraction in (0, 1).
    #[serde(default = "default_threshold")]
    pub threshold: Decimal,
    /// Shares bought on each leg.
    #[serde(default = "default_order_size")]
    pub order_size: Volume,
    /// Log combined prices that do not trigger.
    #[serde(default)]
    pub verbose: bool,
}

fn default_threshold() -> Decimal {
    DetectorConfig::default().threshold
}

fn default_order_size() -> Volume {
    Decimal::ONE_HUNDRED
}

impl ArbitrageConfig {
    #[must_use]
    pub fn detector(&self) -> DetectorConfig {
        DetectorConfig {
            threshold: self.threshold,
        }
    }
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            order_size: default_order_size(),
            verbose: false,
        }
    }
}

/// Order placement settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Bound on each leg's placement call (milliseconds).
    #[serde(default = "default_leg_timeout_ms")]
    pub leg_timeout_ms: u64,
    /// Bound on the emergency hedge (milliseconds).
    #[serde(default = "default_hedge_timeout_ms")]
    pub hedge_timeout_ms: u64,
    /// Limit price for the offsetting sell; low enough to cross the book.
    #[serde(default = "default_hedge_min_price")]
    pub hedge_min_price: Price,
    /// Simulate fills instead of sending orders.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_leg_timeout_ms() -> u64 {
    10_000
}

fn default_hedge_timeout_ms() -> u64 {
    10_000
}

fn default_hedge_min_price() -> Price {
    Decimal::new(1, 2)
}

impl ExecutionConfig {
    #[must_use]
    pub const fn leg_timeout(&self) -> Duration {
        Duration::from_millis(self.leg_timeout_ms)
    }

    #[must_use]
    pub const fn hedge_timeout(&self) -> Duration {
        Duration::from_millis(self.hedge_timeout_ms)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            leg_timeout_ms: default_leg_timeout_ms(),
            hedge_timeout_ms: default_hedge_timeout_ms(),
            hedge_min_price: default_hedge_min_price(),
            dry_run: false,
        }
    }
}

/// Market discovery paging.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Stop after this many markets; unlimited when absent.
    #[serde(default)]
    pub max_markets: Option<usize>,
    /// Pause between page requests (milliseconds).
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
}

fn default_page_limit() -> u32 {
    100
}

fn default_page_delay_ms() -> u64 {
    100
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
            max_markets: None,
            page_delay_ms: default_page_delay_ms(),
        }
    }
}

/// Signing credentials. Populated from the environment only.
#[derive(Clone, Default)]
pub struct WalletConfig {
    pub private_key: Option<String>,
}

impl std::fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Main application configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub arbitrage: ArbitrageConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub reconnection: ReconnectionConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(skip)]
    pub wallet: WalletConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed,
    /// an environment override does not parse, or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Parse TOML content, apply process environment overrides, validate.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with_env(content, |key| std::env::var(key).ok())
    }

    /// Like [`Config::parse_toml`] with an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn parse_toml_with_env(
        content: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        self.wallet.private_key = env("WALLET_PRIVATE_KEY")
            .or_else(|| env("PRIVATE_KEY"))
            .filter(|key| !key.trim().is_empty());

        if let Some(raw) = env("ARBITRAGE_THRESHOLD") {
            self.arbitrage.threshold = parse_decimal("ARBITRAGE_THRESHOLD", &raw)?;
        }
        if let Some(raw) = env("DEFAULT_ORDER_SIZE") {
            self.arbitrage.order_size = parse_decimal("DEFAULT_ORDER_SIZE", &raw)?;
        }
        if let Some(raw) = env("VERBOSE") {
            self.arbitrage.verbose = parse_flag("VERBOSE", &raw)?;
        }
        if let Some(raw) = env("DRY_RUN") {
            self.execution.dry_run = parse_flag("DRY_RUN", &raw)?;
        }
        Ok(())
    }

    /// Check that values are present and within range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] or [`ConfigError::InvalidValue`].
    pub fn validate(&self) -> Result<()> {
        if self.network.ws_url.is_empty() {
            return Err(ConfigError::MissingField { field: "ws_url" }.into());
        }
        if self.network.api_url.is_empty() {
            return Err(ConfigError::MissingField { field: "api_url" }.into());
        }
        if self.network.connect_timeout_ms == 0 {
            return Err(invalid("connect_timeout_ms", "must be greater than 0"));
        }

        let threshold = self.arbitrage.threshold;
        if threshold <= Decimal::ZERO || threshold >= Decimal::ONE {
            return Err(invalid("threshold", "must be between 0 and 1 (exclusive)"));
        }
        if self.arbitrage.order_size <= Decimal::ZERO {
            return Err(invalid("order_size", "must be greater than 0"));
        }

        if self.execution.leg_timeout_ms == 0 {
            return Err(invalid("leg_timeout_ms", "must be greater than 0"));
        }
        if self.execution.hedge_timeout_ms == 0 {
            return Err(invalid("hedge_timeout_ms", "must be greater than 0"));
        }
        let hedge_price = self.execution.hedge_min_price;
        if hedge_price <= Decimal::ZERO || hedge_price >= Decimal::ONE {
            return Err(invalid("hedge_min_price", "must be between 0 and 1 (exclusive)"));
        }

        let reconnection = &self.reconnection;
        if reconnection.initial_delay_ms == 0 {
            return Err(invalid("initial_delay_ms", "must be greater than 0"));
        }
        if reconnection.max_delay_ms < reconnection.initial_delay_ms {
            return Err(invalid("max_delay_ms", "must be >= initial_delay_ms"));
        }
        if reconnection.backoff_multiplier < 1.0 {
            return Err(invalid("backoff_multiplier", "must be >= 1.0"));
        }
        if reconnection.max_consecutive_failures == 0 {
            return Err(invalid("max_consecutive_failures", "must be greater than 0"));
        }
        if reconnection.circuit_breaker_cooldown_ms == 0 {
            return Err(invalid("circuit_breaker_cooldown_ms", "must be greater than 0"));
        }

        if self.discovery.page_limit == 0 {
            return Err(invalid("page_limit", "must be greater than 0"));
        }
        if self.discovery.max_markets == Some(0) {
            return Err(invalid("max_markets", "must be greater than 0 when set"));
        }

        Ok(())
    }

    /// True when orders go to the venue for real.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.execution.dry_run
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

fn invalid(field: &'static str, reason: &str) -> crate::error::Error {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
    .into()
}

fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| invalid(field, &e.to_string()))
}

fn parse_flag(field: &'static str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(invalid(field, &format!("expected a boolean, got '{other}'"))),
    }
}
