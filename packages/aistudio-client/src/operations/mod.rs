//! Operation adapters: one per family.
//!
//! Each adapter turns validated options into a typed wire request carrying
//! only the fields that family accepts, then hands it to
//! [`RunClient`](crate::run_client::RunClient).

pub mod browse;
pub mod crawl;
pub mod scrape;
pub mod search;

pub use browse::{BrowseOptions, BrowseRequest};
pub use crawl::{CrawlOptions, CrawlRequest};
pub use scrape::{ScrapeOptions, ScrapeRequest};
pub use search::{SearchOptions, SearchRequest};

use serde::Serialize;
use serde_json::Value;

use crate::error::{AiStudioError, Result};
use crate::family::Family;
use crate::schema::Schema;
use crate::types::OutputFormat;

/// Submission payload, one variant per family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RunRequest {
    Scrape(ScrapeRequest),
    Crawl(CrawlRequest),
    Browse(BrowseRequest),
    Search(SearchRequest),
}

impl RunRequest {
    pub fn family(&self) -> Family {
        match self {
            RunRequest::Scrape(_) => Family::Scrape,
            RunRequest::Crawl(_) => Family::Crawl,
            RunRequest::Browse(_) => Family::Browse,
            RunRequest::Search(_) => Family::Search,
        }
    }

    /// JSON body for the submit call.
    pub fn to_body(&self) -> Result<Value> {
        serde_json::to_value(self)
            .map_err(|e| AiStudioError::InvalidRequest(format!("failed to serialize request: {}", e)))
    }
}

/// `json` output always carries a schema object; other formats never do.
pub(crate) fn openapi_schema(format: OutputFormat, schema: Option<&Schema>) -> Option<Schema> {
    match format {
        OutputFormat::Json => Some(schema.cloned().unwrap_or_default()),
        _ => None,
    }
}

pub(crate) fn require(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AiStudioError::InvalidRequest(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
