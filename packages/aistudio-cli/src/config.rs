use std::env;
use std::time::Duration;

use aistudio_client::{Credentials, DriverConfig};
use anyhow::{Context, Result};
use dotenvy::dotenv;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub poll_interval: Duration,
    pub continue_on_fail: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let credentials = Credentials::from_env().context("Failed to load AI Studio credentials")?;

        Ok(Self {
            credentials,
            poll_interval: Duration::from_secs(
                env::var("AISTUDIO_POLL_INTERVAL_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("AISTUDIO_POLL_INTERVAL_SECS must be a valid number")?,
            ),
            continue_on_fail: env::var("AISTUDIO_CONTINUE_ON_FAIL")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        })
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig::default()
            .with_continue_on_fail(self.continue_on_fail)
            .with_poll_interval(self.poll_interval)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
