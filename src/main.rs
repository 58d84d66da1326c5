use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use goodreads_cleaner::config::{Config, DEFAULT_CONFIG_FILE};
use goodreads_cleaner::feed::{self, WriteOutcome};
use goodreads_cleaner::pipeline;

#[derive(Parser, Debug)]
#[command(
    name = "goodreads-cleaner",
    version,
    about = "Rebuild the cleaned Goodreads feeds for Twitter and Threads"
)]
struct Args {
    /// Configuration file (built-in defaults when the file does not exist)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let client = feed::build_client(Duration::from_secs(config.timeout_secs))
        .context("Failed to create HTTP client")?;

    let report = pipeline::run(&config, &client)
        .await
        .context("Feed cleaning run failed")?;

    println!("Fetched {} entries.", report.fetched);
    for variant in &report.variants {
        let status = match variant.outcome {
            WriteOutcome::Written => "wrote",
            WriteOutcome::Unchanged => "unchanged",
        };
        println!(
            "{}: {} entries, {} {}",
            variant.name,
            variant.entries,
            status,
            variant.path.display()
        );
    }

    Ok(())
}
