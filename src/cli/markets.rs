//! Handler for the `markets` command.

use tabled::{Table, Tabled};

use crate::app::App;
use crate::cli::MarketsArgs;
use crate::config::Config;
use crate::domain::MarketPair;
use crate::error::Result;

const QUESTION_WIDTH: usize = 60;

#[derive(Tabled)]
struct MarketRow {
    #[tabled(rename = "Market")]
    market_id: String,
    #[tabled(rename = "Question")]
    question: String,
    #[tabled(rename = "Yes token")]
    yes_token: String,
    #[tabled(rename = "No token")]
    no_token: String,
}

impl From<&MarketPair> for MarketRow {
    fn from(pair: &MarketPair) -> Self {
        Self {
            market_id: shorten(pair.market_id().as_str(), 14),
            question: shorten(pair.question(), QUESTION_WIDTH),
            yes_token: shorten(pair.yes_token().as_str(), 14),
            no_token: shorten(pair.no_token().as_str(), 14),
        }
    }
}

fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{head}…")
}

/// Discover markets and print them as a table.
pub async fn execute(args: &MarketsArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    if let Some(limit) = args.limit {
        config.discovery.max_markets = Some(limit);
    }

    let pairs = App::discover(&config).await?;
    if pairs.is_empty() {
        println!("No binary markets found.");
        return Ok(());
    }

    let rows: Vec<MarketRow> = pairs.iter().map(MarketRow::from).collect();
    println!("{}", Table::new(rows));
    println!();
    println!("{} markets", pairs.len());
    Ok(())
}
