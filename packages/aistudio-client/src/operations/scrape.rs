//! Single-page scraping (`/scrape`).

use std::time::Duration;

use serde::Serialize;

use super::{openapi_schema, require, RunRequest};
use crate::error::Result;
use crate::schema::Schema;
use crate::types::{OutputFormat, PollPolicy, RunOutput};
use crate::AiStudioClient;

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeOptions {
    pub url: String,
    pub output_format: OutputFormat,
    pub schema: Option<Schema>,
    pub render_javascript: bool,
}

impl ScrapeOptions {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output_format: OutputFormat::Markdown,
            schema: None,
            render_javascript: false,
        }
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_render_javascript(mut self, render: bool) -> Self {
        self.render_javascript = render;
        self
    }

    pub fn default_policy() -> PollPolicy {
        PollPolicy::new(Self::DEFAULT_TIMEOUT)
    }

    pub fn to_request(&self) -> Result<RunRequest> {
        Ok(RunRequest::Scrape(ScrapeRequest {
            url: require("url", &self.url)?,
            output_format: self.output_format,
            render_html: self.render_javascript,
            openapi_schema: openapi_schema(self.output_format, self.schema.as_ref()),
        }))
    }
}

/// Wire body for `POST /scrape`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapeRequest {
    pub url: String,
    pub output_format: OutputFormat,
    pub render_html: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openapi_schema: Option<Schema>,
}

impl AiStudioClient {
    /// Scrape one page and wait for the result.
    pub async fn scrape(&self, options: &ScrapeOptions, policy: PollPolicy) -> Result<RunOutput> {
        tracing::info!(url = %options.url, format = %options.output_format, "Starting scrape");
        let request = options.to_request()?;
        self.run(&request, policy).await
    }
}
