//! Configuration loading from disk.

mod support;

use rust_decimal_macros::dec;
use twinleg::config::Config;
use twinleg::error::{ConfigError, Error};

use support::config::{write_temp_config, MINIMAL_TOML};

#[test]
fn loads_full_config() {
    let toml = r#"
[network]
ws_url = "wss://ws.example.test/ws/market"
api_url = "https://clob.example.test"
gamma_url = "https://gamma.example.test"
chain_id = 80002
connect_timeout_ms = 5000

[logging]
level = "debug"
format = "json"

[arbitrage]
threshold = 0.01
order_size = 25
verbose = true

[execution]
leg_timeout_ms = 3000
hedge_timeout_ms = 4000
hedge_min_price = 0.02
dry_run = true

[reconnection]
initial_delay_ms = 500
max_delay_ms = 30000
backoff_multiplier = 1.5
max_consecutive_failures = 5
circuit_breaker_cooldown_ms = 60000

[discovery]
page_limit = 50
max_markets = 200
page_delay_ms = 250
"#;
    let file = write_temp_config(toml);
    let config = Config::load(file.path()).unwrap();

    assert_eq!(config.network.chain_id, 80002);
    assert_eq!(config.network.gamma_url, "https://gamma.example.test");
    assert!(config.logging.is_json());
    assert_eq!(config.arbitrage.threshold, dec!(0.01));
    assert_eq!(config.arbitrage.order_size, dec!(25));
    assert!(config.arbitrage.verbose);
    assert_eq!(config.execution.leg_timeout().as_millis(), 3000);
    assert_eq!(config.execution.hedge_min_price, dec!(0.02));
    assert!(!config.is_live());
    assert_eq!(config.reconnection.max_consecutive_failures, 5);
    assert_eq!(config.discovery.max_markets, Some(200));
}

#[test]
fn minimal_config_loads_with_defaults() {
    let file = write_temp_config(MINIMAL_TOML);
    let config = Config::load(file.path()).unwrap();

    assert_eq!(config.network.gamma_url, "https://gamma-api.polymarket.com");
    assert_eq!(config.arbitrage.detector().trigger_below(), dec!(0.995));
    assert_eq!(config.discovery.page_limit, 100);
}

#[test]
fn rejects_threshold_out_of_range() {
    let toml = format!("{MINIMAL_TOML}\n[arbitrage]\nthreshold = 1.5\n");
    let file = write_temp_config(&toml);

    match Config::load(file.path()) {
        Err(Error::Config(ConfigError::InvalidValue {
            field: "threshold",
            ..
        })) => {}
        Err(err) => panic!("expected invalid threshold error, got {err}"),
        Ok(config) => panic!(
            "expected threshold to be rejected, got {}",
            config.arbitrage.threshold
        ),
    }
}

#[test]
fn rejects_non_positive_order_size() {
    let toml = format!("{MINIMAL_TOML}\n[arbitrage]\norder_size = 0\n");
    let file = write_temp_config(&toml);

    assert!(matches!(
        Config::load(file.path()),
        Err(Error::Config(ConfigError::InvalidValue {
            field: "order_size",
            ..
        }))
    ));
}

#[test]
fn rejects_empty_stream_url() {
    let toml = r#"
[network]
ws_url = ""
api_url = "https://clob.example.test"
"#;
    let file = write_temp_config(toml);

    assert!(matches!(
        Config::load(file.path()),
        Err(Error::Config(ConfigError::MissingField { field: "ws_url" }))
    ));
}

#[test]
fn missing_network_section_is_a_parse_error() {
    let file = write_temp_config("[arbitrage]\nthreshold = 0.01\n");

    assert!(matches!(
        Config::load(file.path()),
        Err(Error::Config(ConfigError::Parse(_)))
    ));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    assert!(matches!(
        Config::load(&path),
        Err(Error::Config(ConfigError::ReadFile(_)))
    ));
}

#[test]
fn environment_overrides_file_values() {
    let toml = format!("{MINIMAL_TOML}\n[arbitrage]\nthreshold = 0.02\n");
    let config = Config::parse_toml_with_env(&toml, |key| match key {
        "ARBITRAGE_THRESHOLD" => Some("0.03".into()),
        "DEFAULT_ORDER_SIZE" => Some("7.5".into()),
        "DRY_RUN" => Some("true".into()),
        "WALLET_PRIVATE_KEY" => Some("0xabc".into()),
        _ => None,
    })
    .unwrap();

    assert_eq!(config.arbitrage.threshold, dec!(0.03));
    assert_eq!(config.arbitrage.order_size, dec!(7.5));
    assert!(config.execution.dry_run);
    assert_eq!(config.wallet.private_key.as_deref(), Some("0xabc"));
}

#[test]
fn invalid_environment_override_is_rejected() {
    let result = Config::parse_toml_with_env(MINIMAL_TOML, |key| {
        (key == "ARBITRAGE_THRESHOLD").then(|| "lots".to_string())
    });

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidValue {
            field: "ARBITRAGE_THRESHOLD",
            ..
        }))
    ));
}
