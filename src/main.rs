use anyhow::Context;
use clap::Parser;
use twinleg::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Both ring and aws-lc can end up linked; pick one explicitly.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Run(args) => cli::run::execute(args)
            .await
            .with_context(|| format!("run failed (config: {})", args.config.display())),
        Commands::Markets(args) => cli::markets::execute(args)
            .await
            .context("market discovery failed"),
        Commands::Check(args) => cli::check::execute(&args.config)
            .with_context(|| format!("invalid configuration: {}", args.config.display())),
    }
}
