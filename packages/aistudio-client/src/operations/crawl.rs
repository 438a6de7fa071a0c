//! Prompt-driven crawling (`/extract/run`).

use std::time::Duration;

use serde::Serialize;

use super::{openapi_schema, require, RunRequest};
use crate::error::Result;
use crate::schema::Schema;
use crate::types::{OutputFormat, PollPolicy, RunOutput};
use crate::AiStudioClient;

#[derive(Debug, Clone, PartialEq)]
pub struct CrawlOptions {
    pub url: String,
    pub prompt: String,
    pub output_format: OutputFormat,
    pub schema: Option<Schema>,
    /// Documented maximum is 50; the service enforces it, not us
    pub max_pages: u32,
    pub render_javascript: bool,
}

impl CrawlOptions {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(240);
    pub const DEFAULT_MAX_PAGES: u32 = 25;

    pub fn new(url: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prompt: prompt.into(),
            output_format: OutputFormat::Markdown,
            schema: None,
            max_pages: Self::DEFAULT_MAX_PAGES,
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

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
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
        Ok(RunRequest::Crawl(CrawlRequest {
            domain: require("url", &self.url)?,
            output_format: self.output_format,
            auxiliary_prompt: self.prompt.clone(),
            render_html: self.render_javascript,
            return_sources_limit: self.max_pages,
            openapi_schema: openapi_schema(self.output_format, self.schema.as_ref()),
        }))
    }
}

/// Wire body for `POST /extract/run`. The start URL goes out as `domain`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlRequest {
    pub domain: String,
    pub output_format: OutputFormat,
    pub auxiliary_prompt: String,
    pub render_html: bool,
    pub return_sources_limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openapi_schema: Option<Schema>,
}

impl AiStudioClient {
    /// Crawl from a start URL and wait for the collected results.
    pub async fn crawl(&self, options: &CrawlOptions, policy: PollPolicy) -> Result<RunOutput> {
        tracing::info!(
            url = %options.url,
            max_pages = options.max_pages,
            format = %options.output_format,
            "Starting crawl"
        );
        let request = options.to_request()?;
        self.run(&request, policy).await
    }
}
