//! One-shot corridor analysis from the command line; prints the run report
//! as JSON on stdout.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use corridor_risk::bootstrap;
use corridor_risk::config::run::RunConfig;
use corridor_risk::export::{articles_csv, daily_csv};
use corridor_risk::table::Scope;

/// Corridor news risk analysis
#[derive(Parser, Debug)]
#[command(name = "corridor-cli")]
#[command(about = "Fetch corridor news, score sentiment and keyword risk, print the daily report")]
#[command(version)]
struct Cli {
    /// Origin location (e.g. a port city)
    #[arg(long, default_value = "Shanghai")]
    origin: String,

    /// Destination location
    #[arg(long, default_value = "Los Angeles")]
    destination: String,

    /// Lookback window in days (1-30)
    #[arg(long, default_value_t = 30)]
    days: u32,

    /// Page size per query (20-100)
    #[arg(long, default_value_t = 100)]
    max_articles: u32,

    /// Flagged articles sent to enrichment (0-50)
    #[arg(long, default_value_t = 8)]
    top_k: usize,

    /// Flag articles at or below this polarity (-1.0 to 0.0)
    #[arg(long, default_value_t = -0.1, allow_negative_numbers = true)]
    polarity_threshold: f64,

    /// Also write the article table as CSV
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Also write a daily series as CSV
    #[arg(long, value_name = "PATH")]
    daily_csv: Option<PathBuf>,

    /// Scope used for --daily-csv
    #[arg(long, default_value = "corridor")]
    scope: Scope,

    /// Compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

impl Cli {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            days: self.days,
            max_articles: self.max_articles,
            top_k: self.top_k,
            polarity_threshold: self.polarity_threshold,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    bootstrap::init_tracing();

    let pipeline = bootstrap::pipeline_from_env();
    let report = pipeline.run(cli.run_config()).await?;

    if let Some(path) = &cli.csv {
        std::fs::write(path, articles_csv(&report.articles)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    if let Some(path) = &cli.daily_csv {
        std::fs::write(path, daily_csv(report.daily.get(cli.scope), &report.categories)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let out = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{out}");
    Ok(())
}
