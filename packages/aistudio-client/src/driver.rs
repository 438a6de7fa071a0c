//! Batch invocation.
//!
//! Items are processed strictly one after another: each runs its full
//! submit/poll/fetch cycle before the next starts. The driver is the only
//! place that decides whether a failing item aborts the batch.

use std::time::Duration;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use tracing::{info, warn};

use crate::error::{AiStudioError, BatchError, Result};
use crate::family::Family;
use crate::operations::{BrowseOptions, CrawlOptions, ScrapeOptions, SearchOptions};
use crate::schema::{Schema, SchemaResolution};
use crate::types::{OutputFormat, PollPolicy, RunOutput};
use crate::AiStudioClient;

/// Per-family wall-clock budgets used by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyTimeouts {
    pub scrape: Duration,
    pub crawl: Duration,
    pub browse: Duration,
    pub search: Duration,
}

impl Default for FamilyTimeouts {
    fn default() -> Self {
        Self {
            scrape: Duration::from_secs(120),
            crawl: Duration::from_secs(600),
            browse: Duration::from_secs(600),
            search: Duration::from_secs(180),
        }
    }
}

impl FamilyTimeouts {
    pub fn for_family(&self, family: Family) -> Duration {
        match family {
            Family::Scrape => self.scrape,
            Family::Crawl => self.crawl,
            Family::Browse => self.browse,
            Family::Search => self.search,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Record per-item errors and keep going instead of aborting
    pub continue_on_fail: bool,
    pub poll_interval: Duration,
    pub timeouts: FamilyTimeouts,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            continue_on_fail: false,
            poll_interval: PollPolicy::DEFAULT_INTERVAL,
            timeouts: FamilyTimeouts::default(),
        }
    }
}

impl DriverConfig {
    pub fn with_continue_on_fail(mut self, continue_on_fail: bool) -> Self {
        self.continue_on_fail = continue_on_fail;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeouts(mut self, timeouts: FamilyTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn policy(&self, family: Family) -> PollPolicy {
        PollPolicy::new(self.timeouts.for_family(family)).with_interval(self.poll_interval)
    }
}

/// One output record: the normalized result or the error that replaced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ItemOutput {
    Completed(RunOutput),
    Failed { error: String },
}

/// An operation resolved from one loosely-typed input item.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Scrape(ScrapeOptions),
    Crawl(CrawlOptions),
    Browse(BrowseOptions),
    Search(SearchOptions),
}

// Items are loosely typed: `null` means "use the default" and counts may
// arrive as whole-number floats.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScraperParams {
    url: Option<String>,
    output_format: Option<String>,
    schema: Option<Value>,
    render_javascript: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrawlerParams {
    url: Option<String>,
    prompt: Option<String>,
    output_format: Option<String>,
    schema: Option<Value>,
    #[serde(deserialize_with = "loose_count")]
    max_pages: Option<u32>,
    render_javascript: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BrowserAgentParams {
    url: Option<String>,
    prompt: Option<String>,
    output_format: Option<String>,
    schema: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchParams {
    query: Option<String>,
    #[serde(deserialize_with = "loose_count")]
    limit: Option<u32>,
    return_content: Option<bool>,
    render_javascript: Option<bool>,
}

/// Accept `25`, `25.0` or `null`; reject fractions, negatives and non-numbers.
fn loose_count<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Option::<Number>::deserialize(deserializer)? {
        Some(number) => number,
        None => return Ok(None),
    };

    let whole = number.as_u64().or_else(|| {
        number
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
            .map(|f| f as u64)
    });

    whole
        .and_then(|n| u32::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("expected a whole non-negative count, got {}", number)))
}

const DEFAULT_SEARCH_LIMIT: u32 = 10;

impl Operation {
    /// Resolve an item of the form `{"resource": "...", ...params}`.
    pub fn from_item(item: &Value) -> Result<Self> {
        let resource = item
            .get("resource")
            .and_then(Value::as_str)
            .ok_or_else(|| AiStudioError::InvalidRequest("resource is required".into()))?;

        match resource {
            "scraper" | "scrape" => {
                let p: ScraperParams = params(item)?;
                let format = output_format(p.output_format.as_deref())?;
                let mut options = ScrapeOptions::new(p.url.unwrap_or_default())
                    .with_output_format(format)
                    .with_render_javascript(p.render_javascript.unwrap_or(false));
                options.schema = json_schema(format, p.schema.as_ref());
                Ok(Operation::Scrape(options))
            }
            "crawler" | "crawl" => {
                let p: CrawlerParams = params(item)?;
                let format = output_format(p.output_format.as_deref())?;
                let mut options =
                    CrawlOptions::new(p.url.unwrap_or_default(), p.prompt.unwrap_or_default())
                        .with_output_format(format)
                        .with_max_pages(p.max_pages.unwrap_or(CrawlOptions::DEFAULT_MAX_PAGES))
                        .with_render_javascript(p.render_javascript.unwrap_or(false));
                options.schema = json_schema(format, p.schema.as_ref());
                Ok(Operation::Crawl(options))
            }
            "browser_agent" | "browserAgent" | "browse" => {
                let p: BrowserAgentParams = params(item)?;
                let format = output_format(p.output_format.as_deref())?;
                let mut options =
                    BrowseOptions::new(p.url.unwrap_or_default(), p.prompt.unwrap_or_default())
                        .with_output_format(format);
                options.schema = json_schema(format, p.schema.as_ref());
                Ok(Operation::Browse(options))
            }
            "search" => {
                let p: SearchParams = params(item)?;
                Ok(Operation::Search(
                    SearchOptions::new(p.query.unwrap_or_default())
                        .with_limit(p.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
                        .with_return_content(p.return_content.unwrap_or(true))
                        .with_render_javascript(p.render_javascript.unwrap_or(false)),
                ))
            }
            other => Err(AiStudioError::InvalidRequest(format!(
                "Unknown resource: {}",
                other
            ))),
        }
    }

    pub fn family(&self) -> Family {
        match self {
            Operation::Scrape(_) => Family::Scrape,
            Operation::Crawl(_) => Family::Crawl,
            Operation::Browse(_) => Family::Browse,
            Operation::Search(_) => Family::Search,
        }
    }
}

fn params<T: DeserializeOwned>(item: &Value) -> Result<T> {
    T::deserialize(item)
        .map_err(|e| AiStudioError::InvalidRequest(format!("invalid parameters: {}", e)))
}

fn output_format(raw: Option<&str>) -> Result<OutputFormat> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => raw.parse(),
        _ => Ok(OutputFormat::default()),
    }
}

fn json_schema(format: OutputFormat, raw: Option<&Value>) -> Option<Schema> {
    (format == OutputFormat::Json).then(|| SchemaResolution::resolve(raw).into_schema())
}

/// Runs batches of items against one shared client.
pub struct InvocationDriver {
    client: AiStudioClient,
    config: DriverConfig,
}

impl InvocationDriver {
    pub fn new(client: AiStudioClient, config: DriverConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Run one operation to completion with the driver's budget for its family.
    pub async fn invoke(&self, operation: &Operation) -> Result<RunOutput> {
        let policy = self.config.policy(operation.family());
        match operation {
            Operation::Scrape(options) => self.client.scrape(options, policy).await,
            Operation::Crawl(options) => self.client.crawl(options, policy).await,
            Operation::Browse(options) => self.client.browse(options, policy).await,
            Operation::Search(options) => self.client.search(options, policy).await,
        }
    }

    /// Process every item in order, producing one output record per item.
    ///
    /// With `continue_on_fail` a failing item becomes `{"error": ...}`;
    /// otherwise the first failure aborts with its item index attached.
    pub async fn run_batch(&self, items: &[Value]) -> std::result::Result<Vec<ItemOutput>, BatchError> {
        let mut outputs = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let result = match Operation::from_item(item) {
                Ok(operation) => self.invoke(&operation).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(output) => {
                    info!(item_index = index, status = ?output.status, "Item completed");
                    outputs.push(ItemOutput::Completed(output));
                }
                Err(e) if self.config.continue_on_fail => {
                    warn!(item_index = index, error = %e, "Item failed, continuing");
                    outputs.push(ItemOutput::Failed {
                        error: e.to_string(),
                    });
                }
                Err(source) => {
                    return Err(BatchError {
                        item_index: index,
                        source,
                    });
                }
            }
        }

        Ok(outputs)
    }
}
