//! Generic submit → poll → fetch primitive.
//!
//! One [`RunClient`] drives a run for a single family. Everything that differs
//! between families comes from its [`FamilyConfig`]; the loop itself is shared.

use serde_json::Value;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::{AiStudioError, Result};
use crate::family::{Classification, Family, FamilyConfig, RunState, UnknownStatePolicy};
use crate::operations::RunRequest;
use crate::transport::{ApiRequest, Transport};
use crate::types::{PollPolicy, RunHandle, RunResult};

/// One status check, already mapped onto the canonical state model.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub state: RunState,
    /// The raw status word, if the response carried one
    pub status: Option<String>,
    /// Full status response body
    pub body: Value,
}

/// Submit/poll/fetch for one operation family.
pub struct RunClient<'a> {
    transport: &'a dyn Transport,
    config: &'static FamilyConfig,
}

impl<'a> RunClient<'a> {
    pub fn new(transport: &'a dyn Transport, family: Family) -> Self {
        Self {
            transport,
            config: family.config(),
        }
    }

    pub fn family(&self) -> Family {
        self.config.family
    }

    /// Submit a run. Fails with [`AiStudioError::Submission`] when the
    /// response carries neither `run_id` nor `id`.
    pub async fn submit(&self, request: &RunRequest) -> Result<RunHandle> {
        let family = self.family();
        if request.family() != family {
            return Err(AiStudioError::InvalidRequest(format!(
                "{} request submitted to the {} endpoint",
                request.family(),
                family
            )));
        }

        let body = request.to_body()?;
        let response = self
            .transport
            .send(ApiRequest::post(self.config.submit_endpoint, body))
            .await?;

        let run_id = run_id_from(&response).ok_or(AiStudioError::Submission { family })?;
        info!(%family, run_id = %run_id, "Run submitted");

        Ok(RunHandle::new(family, run_id))
    }

    /// Query run status once.
    ///
    /// Unrecognized status words count as in progress, except for families
    /// whose policy is [`UnknownStatePolicy::Fail`].
    pub async fn poll_status(&self, handle: &RunHandle) -> Result<StatusReport> {
        self.check_handle(handle)?;

        let body = self
            .transport
            .send(
                ApiRequest::get(self.config.status_endpoint).with_query("run_id", handle.run_id()),
            )
            .await?;

        let status = self.config.extract_status(&body).map(str::to_string);
        let state = match self.config.classify(status.as_deref()) {
            Classification::Known(state) => state,
            Classification::Unrecognized => match self.config.unknown_states {
                UnknownStatePolicy::KeepPolling => {
                    debug!(run_id = %handle.run_id(), status = ?status, "Unrecognized run status, still waiting");
                    RunState::InProgress
                }
                UnknownStatePolicy::Fail => {
                    return Err(AiStudioError::RemoteRunFailure {
                        family: self.family(),
                        message: format!(
                            "Unknown status {}",
                            status.as_deref().unwrap_or("<missing>")
                        ),
                    });
                }
            },
        };

        Ok(StatusReport {
            state,
            status,
            body,
        })
    }

    /// Fetch the raw result payload of a run.
    pub async fn fetch_result(&self, handle: &RunHandle) -> Result<RunResult> {
        self.check_handle(handle)?;

        let payload = self
            .transport
            .send(ApiRequest::get(self.config.data_endpoint).with_query("run_id", handle.run_id()))
            .await?;

        Ok(RunResult {
            family: self.family(),
            payload,
        })
    }

    /// Submit and wait for the run to finish.
    pub async fn run_to_completion(
        &self,
        request: &RunRequest,
        policy: PollPolicy,
    ) -> Result<RunResult> {
        let handle = self.submit(request).await?;
        self.wait_for_run(&handle, policy).await
    }

    /// Poll an already submitted run until it reaches a terminal state.
    ///
    /// The deadline is checked before each poll, so the final sleep may
    /// overshoot `policy.timeout` by up to one interval.
    pub async fn wait_for_run(&self, handle: &RunHandle, policy: PollPolicy) -> Result<RunResult> {
        let family = self.family();
        let started = Instant::now();
        let mut polls: u32 = 0;

        while started.elapsed() < policy.timeout {
            let report = self.poll_status(handle).await?;
            polls += 1;

            match report.state {
                RunState::Succeeded => {
                    info!(
                        %family,
                        run_id = %handle.run_id(),
                        polls,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Run completed"
                    );
                    if self.config.separate_status_endpoint {
                        return self.fetch_result(handle).await;
                    }
                    return Ok(RunResult {
                        family,
                        payload: report.body,
                    });
                }
                RunState::Failed => {
                    let message = self.config.failure_message(&report.body);
                    warn!(%family, run_id = %handle.run_id(), %message, "Run failed");
                    return Err(AiStudioError::RemoteRunFailure { family, message });
                }
                RunState::InProgress => {
                    debug!(
                        %family,
                        run_id = %handle.run_id(),
                        status = ?report.status,
                        polls,
                        "Run still in progress"
                    );
                }
            }

            sleep(policy.interval).await;
        }

        warn!(
            %family,
            run_id = %handle.run_id(),
            timeout_ms = policy.timeout.as_millis() as u64,
            polls,
            "Gave up waiting for run"
        );
        Err(AiStudioError::PollTimeout {
            family,
            timeout: policy.timeout,
        })
    }

    fn check_handle(&self, handle: &RunHandle) -> Result<()> {
        if handle.is_empty() {
            return Err(AiStudioError::InvalidHandle {
                reason: "run_id is required".into(),
            });
        }
        if handle.family() != self.family() {
            return Err(AiStudioError::InvalidHandle {
                reason: format!(
                    "{} run {} cannot be used with the {} endpoints",
                    handle.family(),
                    handle.run_id(),
                    self.family()
                ),
            });
        }
        Ok(())
    }
}

/// `run_id`, falling back to `id`. Empty strings don't count.
fn run_id_from(response: &Value) -> Option<String> {
    ["run_id", "id"]
        .into_iter()
        .filter_map(|key| match response.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .next()
}
