use std::io::Write;

use tempfile::NamedTempFile;
use twinleg::config::{ExecutionConfig, ReconnectionConfig};

pub const MINIMAL_TOML: &str = r#"
[network]
ws_url = "wss://ws.example.test/ws/market"
api_url = "https://clob.example.test"
"#;

/// Write `contents` to a temp file that lives as long as the returned handle.
pub fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("twinleg-config-")
        .suffix(".toml")
        .tempfile()
        .expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

pub fn test_reconnection_config() -> ReconnectionConfig {
    ReconnectionConfig {
        initial_delay_ms: 1,
        max_delay_ms: 5,
        backoff_multiplier: 1.0,
        max_consecutive_failures: 3,
        circuit_breaker_cooldown_ms: 5,
    }
}

/// Execution settings with short bounds so timeout paths run quickly.
pub fn fast_execution_config() -> ExecutionConfig {
    ExecutionConfig {
        leg_timeout_ms: 200,
        hedge_timeout_ms: 200,
        ..ExecutionConfig::default()
    }
}
