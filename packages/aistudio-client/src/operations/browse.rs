//! Browser agent runs (`/browser-agent/run`).

use std::time::Duration;

use serde::Serialize;

use super::{openapi_schema, require, RunRequest};
use crate::error::Result;
use crate::schema::Schema;
use crate::types::{OutputFormat, PollPolicy, RunOutput};
use crate::AiStudioClient;

#[derive(Debug, Clone, PartialEq)]
pub struct BrowseOptions {
    pub url: String,
    pub prompt: String,
    pub output_format: OutputFormat,
    pub schema: Option<Schema>,
}

impl BrowseOptions {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(url: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prompt: prompt.into(),
            output_format: OutputFormat::Markdown,
            schema: None,
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

    pub fn default_policy() -> PollPolicy {
        PollPolicy::new(Self::DEFAULT_TIMEOUT)
    }

    pub fn to_request(&self) -> Result<RunRequest> {
        Ok(RunRequest::Browse(BrowseRequest {
            url: require("url", &self.url)?,
            output_format: self.output_format,
            auxiliary_prompt: self.prompt.clone(),
            openapi_schema: openapi_schema(self.output_format, self.schema.as_ref()),
        }))
    }
}

/// Wire body for `POST /browser-agent/run`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowseRequest {
    pub url: String,
    pub output_format: OutputFormat,
    pub auxiliary_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openapi_schema: Option<Schema>,
}

impl AiStudioClient {
    /// Let the browser agent act on a page and wait for its output.
    pub async fn browse(&self, options: &BrowseOptions, policy: PollPolicy) -> Result<RunOutput> {
        tracing::info!(url = %options.url, format = %options.output_format, "Starting browser agent");
        let request = options.to_request()?;
        self.run(&request, policy).await
    }
}
