// Command-line entry point: runs batches of AI Studio items

mod config;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aistudio_client::{AiStudioClient, InvocationDriver};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "aistudio", about = "Run AI Studio scrape, crawl, browse and search jobs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a batch of items (JSON array or single object) and print the results
    Run {
        /// Input file, `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Record per-item errors instead of aborting the batch
        #[arg(long)]
        continue_on_fail: bool,

        /// Seconds between status polls
        #[arg(long)]
        poll_interval_secs: Option<u64>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
    /// Verify the API key and URL
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,aistudio_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(api_url = %config.credentials.api_url(), "Configuration loaded");

    let client = AiStudioClient::new(config.credentials.clone())
        .context("Failed to create AI Studio client")?;

    match cli.command {
        Command::Run {
            input,
            continue_on_fail,
            poll_interval_secs,
            pretty,
        } => {
            let mut driver_config = config.driver_config();
            if continue_on_fail {
                driver_config = driver_config.with_continue_on_fail(true);
            }
            if let Some(secs) = poll_interval_secs {
                driver_config = driver_config.with_poll_interval(Duration::from_secs(secs));
            }

            let items = read_items(&input)?;
            tracing::info!(items = items.len(), "Running batch");

            let driver = InvocationDriver::new(client, driver_config);
            let outputs = driver.run_batch(&items).await?;

            let rendered = if pretty {
                serde_json::to_string_pretty(&outputs)?
            } else {
                serde_json::to_string(&outputs)?
            };
            println!("{}", rendered);
        }
        Command::Check => {
            let status = client
                .check_credentials()
                .await
                .context("Credential check failed")?;
            println!("{}", status);
        }
    }

    Ok(())
}

fn read_items(input: &Path) -> Result<Vec<Value>> {
    let raw = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?
    };

    let value: Value = serde_json::from_str(&raw).context("Input is not valid JSON")?;
    match value {
        Value::Array(items) => Ok(items),
        item @ Value::Object(_) => Ok(vec![item]),
        _ => bail!("Input must be a JSON object or an array of objects"),
    }
}
