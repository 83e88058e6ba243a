//! Handler for the `check` command.

use std::path::Path;

use crate::config::Config;
use crate::error::Result;

/// Validate a configuration file without connecting to anything.
pub fn execute<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    println!("Checking configuration: {}", path.display());
    println!();

    let config = Config::load(path)?;

    println!("✓ Configuration file is valid");
    println!();
    println!("Summary:");
    println!("  Stream:     {}", config.network.ws_url);
    println!("  CLOB API:   {}", config.network.api_url);
    println!("  Discovery:  {}", config.network.gamma_url);
    println!("  Chain ID:   {}", config.network.chain_id);
    println!(
        "  Threshold:  {} (trigger below {})",
        config.arbitrage.threshold,
        config.arbitrage.detector().trigger_below()
    );
    println!("  Order size: {}", config.arbitrage.order_size);
    println!("  Dry-run:    {}", config.execution.dry_run);
    println!();

    if config.wallet.private_key.is_some() {
        println!("✓ Wallet private key found (from WALLET_PRIVATE_KEY env var)");
    } else if config.is_live() {
        println!("⚠ No wallet private key configured");
        println!("  Set WALLET_PRIVATE_KEY or run with --dry-run");
    }

    println!();
    println!("Configuration is ready to use.");
    Ok(())
}
