//! Authenticated JSON transport.
//!
//! The run protocol only needs "send this request, give me the JSON back".
//! [`HttpTransport`] is the real implementation; tests swap in
//! [`MockTransport`](crate::testing::MockTransport).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::credentials::Credentials;
use crate::error::{AiStudioError, Result, TransportError, TransportResult};

const API_KEY_HEADER: &str = "x-api-key";
const JSON_CONTENT: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

/// A single request against the API, relative to the base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Look up a query parameter by name.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Sends requests with credentials attached and returns parsed JSON.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> TransportResult<Value>;
}

/// `reqwest`-backed transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    credentials: Credentials,
}

impl HttpTransport {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| AiStudioError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
        })
    }

    /// Absolute URL for a path relative to the configured base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.credentials.api_url(), path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> TransportResult<Value> {
        let url = self.endpoint(&request.path);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        builder = builder
            .header(API_KEY_HEADER, self.credentials.api_key.expose())
            .header(ACCEPT, JSON_CONTENT)
            .header(CONTENT_TYPE, JSON_CONTENT);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(method = %request.method, path = %request.path, error = %e, "AI Studio request failed");
            TransportError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(method = %request.method, path = %request.path, status = %status, "AI Studio API error");
            return Err(TransportError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(method = %request.method, path = %request.path, status = %status, "AI Studio response");

        response
            .json()
            .await
            .map_err(|e| TransportError::Parse(e.to_string()))
    }
}
