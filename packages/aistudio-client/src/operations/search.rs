//! Web search (`/search/run`).
//!
//! Search has no steps endpoint: `/search/run/data` reports status and, once
//! completed, the results in the same response.

use std::time::Duration;

use serde::Serialize;

use super::{require, RunRequest};
use crate::error::Result;
use crate::types::{PollPolicy, RunOutput};
use crate::AiStudioClient;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub query: String,
    /// Documented maximum is 50; the service enforces it, not us
    pub limit: Option<u32>,
    pub render_javascript: Option<bool>,
    pub return_content: Option<bool>,
}

impl SearchOptions {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_render_javascript(mut self, render: bool) -> Self {
        self.render_javascript = Some(render);
        self
    }

    pub fn with_return_content(mut self, return_content: bool) -> Self {
        self.return_content = Some(return_content);
        self
    }

    pub fn default_policy() -> PollPolicy {
        PollPolicy::new(Self::DEFAULT_TIMEOUT)
    }

    pub fn to_request(&self) -> Result<RunRequest> {
        Ok(RunRequest::Search(SearchRequest {
            query: require("query", &self.query)?,
            limit: self.limit,
            render_html: self.render_javascript,
            return_content: self.return_content,
        }))
    }
}

/// Wire body for `POST /search/run`. Unset options are left out entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_html: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_content: Option<bool>,
}

impl AiStudioClient {
    /// Run a search and wait for the results.
    pub async fn search(&self, options: &SearchOptions, policy: PollPolicy) -> Result<RunOutput> {
        tracing::info!(query = %options.query, limit = ?options.limit, "Starting search");
        let request = options.to_request()?;
        self.run(&request, policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_payload() {
        let body = SearchOptions::new("weather in London")
            .to_request()
            .unwrap()
            .to_body()
            .unwrap();
        assert_eq!(body, json!({ "query": "weather in London" }));
    }

    #[test]
    fn test_render_javascript_sent_as_render_html() {
        let body = SearchOptions::new("rust")
            .with_limit(75)
            .with_render_javascript(true)
            .with_return_content(false)
            .to_request()
            .unwrap()
            .to_body()
            .unwrap();
        assert_eq!(
            body,
            json!({ "query": "rust", "limit": 75, "render_html": true, "return_content": false })
        );
    }
}
