//! Handler for the `run` command.

use tracing::info;

use crate::app::App;
use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::Result;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;

    if args.dry_run {
        config.execution.dry_run = true;
    }
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }

    config.init_logging();
    info!(
        chain_id = config.network.chain_id,
        dry_run = config.execution.dry_run,
        "twinleg starting"
    );

    App::run(config).await?;

    info!("twinleg stopped");
    Ok(())
}
