use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AiStudioError;
use crate::family::Family;

/// Identifier of one remote run, bound to the family that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    family: Family,
    run_id: String,
}

impl RunHandle {
    pub fn new(family: Family, run_id: impl Into<String>) -> Self {
        Self {
            family,
            run_id: run_id.into(),
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn is_empty(&self) -> bool {
        self.run_id.is_empty()
    }
}

impl fmt::Display for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family, self.run_id)
    }
}

/// Raw terminal payload from the remote service.
///
/// Families do not share a result schema, so this is kept as JSON until the
/// final normalization into [`RunOutput`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    pub family: Family,
    pub payload: Value,
}

impl RunResult {
    /// Normalize into `{status, data, message}`.
    pub fn into_output(self) -> RunOutput {
        RunOutput::from_payload(self.payload)
    }
}

/// The per-item record handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RunOutput {
    pub fn from_payload(mut payload: Value) -> Self {
        let status = non_empty_str(&payload, "status");
        let message = non_empty_str(&payload, "message");
        let data = payload
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null);

        Self {
            status,
            data,
            message,
        }
    }

    /// Decode search `data` into typed hits.
    pub fn search_hits(&self) -> serde_json::Result<Vec<SearchHit>> {
        if self.data.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(self.data.clone())
    }
}

fn non_empty_str(payload: &Value, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Requested output format for extracted content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Html,
    Json,
    Screenshot,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
            OutputFormat::Screenshot => "screenshot",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = AiStudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" => Ok(OutputFormat::Markdown),
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            "screenshot" => Ok(OutputFormat::Screenshot),
            other => Err(AiStudioError::InvalidRequest(format!(
                "unsupported output format: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-interval polling budget for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wall-clock budget measured from submission
    pub timeout: Duration,
    /// Wait between consecutive status checks
    pub interval: Duration,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: Self::DEFAULT_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}
