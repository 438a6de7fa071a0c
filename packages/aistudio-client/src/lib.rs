//! AI Studio REST API client.
//!
//! Every operation (scrape, crawl, browse, search) follows the same run
//! lifecycle: submit a job, poll its status at a fixed interval until it
//! reaches a terminal state or the time budget runs out, then fetch the
//! result and normalize it into `{status, data, message}`.
//!
//! # Example
//!
//! ```rust,ignore
//! use aistudio_client::{AiStudioClient, Credentials, ScrapeOptions, OutputFormat};
//!
//! let client = AiStudioClient::new(Credentials::from_env()?)?;
//!
//! let options = ScrapeOptions::new("https://example.com").with_output_format(OutputFormat::Markdown);
//! let output = client.scrape(&options, ScrapeOptions::default_policy()).await?;
//! println!("{}", output.data);
//! ```
//!
//! # Modules
//!
//! - [`run_client`] - Generic submit/poll/fetch loop
//! - [`family`] - Per-family endpoints and status vocabulary
//! - [`operations`] - Scrape, crawl, browse and search adapters
//! - [`driver`] - Sequential batch invocation
//! - [`transport`] - Authenticated JSON transport
//! - [`testing`] - Mock transport for tests

pub mod credentials;
pub mod driver;
pub mod error;
pub mod family;
pub mod operations;
pub mod run_client;
pub mod schema;
pub mod testing;
pub mod transport;
pub mod types;

use std::sync::Arc;

use serde_json::Value;

pub use credentials::{ApiKey, Credentials, DEFAULT_API_URL};
pub use driver::{DriverConfig, FamilyTimeouts, InvocationDriver, ItemOutput, Operation};
pub use error::{AiStudioError, BatchError, Result, TransportError};
pub use family::{Family, FamilyConfig, RunState};
pub use operations::{BrowseOptions, CrawlOptions, RunRequest, ScrapeOptions, SearchOptions};
pub use run_client::{RunClient, StatusReport};
pub use schema::{Schema, SchemaResolution};
pub use transport::{ApiRequest, HttpTransport, Method, Transport};
pub use types::{OutputFormat, PollPolicy, RunHandle, RunOutput, RunResult, SearchHit};

/// Client for all four operation families, sharing one transport.
#[derive(Clone)]
pub struct AiStudioClient {
    transport: Arc<dyn Transport>,
}

impl AiStudioClient {
    /// Client backed by the real HTTP transport.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(credentials)?))
    }

    /// Read credentials from `AISTUDIO_API_KEY` / `AISTUDIO_API_URL`.
    pub fn from_env() -> Result<Self> {
        Self::new(Credentials::from_env()?)
    }

    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Low-level run client for one family.
    pub fn run_client(&self, family: Family) -> RunClient<'_> {
        RunClient::new(self.transport(), family)
    }

    /// Submit a request, wait for completion and normalize the result.
    pub async fn run(&self, request: &RunRequest, policy: PollPolicy) -> Result<RunOutput> {
        self.run_client(request.family())
            .run_to_completion(request, policy)
            .await
            .map(RunResult::into_output)
    }

    /// Verify the API key and base URL with `GET /status`.
    pub async fn check_credentials(&self) -> Result<Value> {
        let status = self.transport.send(ApiRequest::get("/status")).await?;
        tracing::debug!(%status, "Credential check succeeded");
        Ok(status)
    }
}
