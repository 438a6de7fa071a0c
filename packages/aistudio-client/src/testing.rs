//! Test doubles.
//!
//! [`MockTransport`] answers from canned responses queued per method and path
//! and records every request it sees, so tests can assert both on results and
//! on exactly which calls were made.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{TransportError, TransportResult};
use crate::transport::{ApiRequest, Method, Transport};

type Scripted = TransportResult<Value>;

/// Scripted, call-recording transport.
///
/// Responses queued for a method+path are returned in order; the last one is
/// sticky and keeps being returned once the queue is down to it.
///
/// # Example
///
/// ```rust
/// use aistudio_client::testing::MockTransport;
/// use aistudio_client::transport::Method;
/// use serde_json::json;
///
/// let mock = MockTransport::new()
///     .with_response(Method::Post, "/scrape", json!({ "run_id": "r1" }))
///     .with_response(Method::Get, "/scrape/run", json!({ "status": "completed" }));
/// assert_eq!(mock.call_count(Method::Get, "/scrape/run"), 0);
/// ```
#[derive(Default, Clone)]
pub struct MockTransport {
    responses: Arc<RwLock<HashMap<(Method, String), VecDeque<Scripted>>>>,
    calls: Arc<RwLock<Vec<ApiRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON response for a method+path.
    pub fn push_response(&self, method: Method, path: &str, body: Value) {
        self.push(method, path, Ok(body));
    }

    /// Queue a transport failure for a method+path.
    pub fn push_error(&self, method: Method, path: &str, error: TransportError) {
        self.push(method, path, Err(error));
    }

    pub fn with_response(self, method: Method, path: &str, body: Value) -> Self {
        self.push_response(method, path, body);
        self
    }

    pub fn with_error(self, method: Method, path: &str, error: TransportError) -> Self {
        self.push_error(method, path, error);
        self
    }

    /// Every request received so far, in order.
    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.read().unwrap().clone()
    }

    pub fn call_count(&self, method: Method, path: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Clear responses and recorded calls.
    pub fn reset(&self) {
        self.responses.write().unwrap().clear();
        self.calls.write().unwrap().clear();
    }

    fn push(&self, method: Method, path: &str, response: Scripted) {
        self.responses
            .write()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
    }

    fn next_response(&self, method: Method, path: &str) -> Scripted {
        let mut responses = self.responses.write().unwrap();
        let Some(queue) = responses.get_mut(&(method, path.to_string())) else {
            return Err(TransportError::Api {
                status: 404,
                message: format!("no mock response for {} {}", method, path),
            });
        };

        if queue.len() > 1 {
            if let Some(next) = queue.pop_front() {
                return next;
            }
        }
        match queue.front() {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(e)) => Err(clone_error(e)),
            None => Err(TransportError::Api {
                status: 404,
                message: format!("no mock response for {} {}", method, path),
            }),
        }
    }
}

fn clone_error(error: &TransportError) -> TransportError {
    match error {
        TransportError::Network(m) => TransportError::Network(m.clone()),
        TransportError::Api { status, message } => TransportError::Api {
            status: *status,
            message: message.clone(),
        },
        TransportError::Parse(m) => TransportError::Parse(m.clone()),
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> TransportResult<Value> {
        let response = self.next_response(request.method, &request.path);
        self.calls.write().unwrap().push(request);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_queue_then_sticky_last() {
        let mock = MockTransport::new()
            .with_response(Method::Get, "/x", json!(1))
            .with_response(Method::Get, "/x", json!(2));

        assert_eq!(mock.send(ApiRequest::get("/x")).await.unwrap(), json!(1));
        assert_eq!(mock.send(ApiRequest::get("/x")).await.unwrap(), json!(2));
        assert_eq!(mock.send(ApiRequest::get("/x")).await.unwrap(), json!(2));
        assert_eq!(mock.call_count(Method::Get, "/x"), 3);
    }

    #[tokio::test]
    async fn test_unscripted_path_errors() {
        let mock = MockTransport::new();
        let err = mock.send(ApiRequest::get("/missing")).await.unwrap_err();
        assert!(matches!(err, TransportError::Api { status: 404, .. }));
        assert_eq!(mock.total_calls(), 1);
    }
}
