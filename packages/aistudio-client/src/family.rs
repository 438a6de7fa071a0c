//! Per-family run protocol configuration.
//!
//! The four operation families share one submit/poll/fetch loop but disagree
//! on where the status lives, what the status words mean, and whether status
//! and data come from the same endpoint. Each difference is captured here as
//! data so [`RunClient`](crate::run_client::RunClient) stays generic.

use std::fmt;

use serde_json::Value;

/// One of the four operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Scrape,
    Crawl,
    Browse,
    Search,
}

impl Family {
    /// Protocol configuration for this family.
    pub fn config(self) -> &'static FamilyConfig {
        match self {
            Family::Scrape => &SCRAPE,
            Family::Crawl => &CRAWL,
            Family::Browse => &BROWSE,
            Family::Search => &SEARCH,
        }
    }

    /// Wording used in failure and timeout messages.
    pub fn activity(self) -> &'static str {
        match self {
            Family::Scrape => "Scraping",
            Family::Crawl => "Crawling",
            Family::Browse => "Browsing",
            Family::Search => "Search",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Family::Scrape => "scrape",
            Family::Crawl => "crawl",
            Family::Browse => "browse",
            Family::Search => "search",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the status string sits in a status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusField {
    /// `{"status": "..."}`
    TopLevel,
    /// `{"run": {"status": "..."}}`
    NestedRun,
}

/// What to do with a status word the family does not recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownStatePolicy {
    /// Treat it as still in progress and poll again
    KeepPolling,
    /// Fail the run immediately
    Fail,
}

/// Canonical run state shared by all families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    InProgress,
    Succeeded,
    Failed,
}

/// Result of mapping a raw status string onto [`RunState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Known(RunState),
    Unrecognized,
}

/// Endpoint paths and status vocabulary for one family.
#[derive(Debug)]
pub struct FamilyConfig {
    pub family: Family,
    pub submit_endpoint: &'static str,
    pub status_endpoint: &'static str,
    pub data_endpoint: &'static str,
    /// When false the status response already carries the result data
    pub separate_status_endpoint: bool,
    pub status_field: StatusField,
    pub success_states: &'static [&'static str],
    pub failure_states: &'static [&'static str],
    pub in_progress_states: &'static [&'static str],
    pub unknown_states: UnknownStatePolicy,
}

const GENERIC_SUCCESS: &[&str] = &["completed", "success"];
const GENERIC_FAILURE: &[&str] = &["failed", "error"];
const GENERIC_IN_PROGRESS: &[&str] = &["pending", "running", "processing"];

pub static SCRAPE: FamilyConfig = FamilyConfig {
    family: Family::Scrape,
    submit_endpoint: "/scrape",
    status_endpoint: "/scrape/run",
    data_endpoint: "/scrape/run/data",
    separate_status_endpoint: true,
    status_field: StatusField::TopLevel,
    success_states: GENERIC_SUCCESS,
    failure_states: GENERIC_FAILURE,
    in_progress_states: GENERIC_IN_PROGRESS,
    unknown_states: UnknownStatePolicy::KeepPolling,
};

pub static CRAWL: FamilyConfig = FamilyConfig {
    family: Family::Crawl,
    submit_endpoint: "/extract/run",
    status_endpoint: "/extract/run/steps",
    data_endpoint: "/extract/run/data",
    separate_status_endpoint: true,
    status_field: StatusField::NestedRun,
    success_states: GENERIC_SUCCESS,
    failure_states: GENERIC_FAILURE,
    in_progress_states: GENERIC_IN_PROGRESS,
    unknown_states: UnknownStatePolicy::KeepPolling,
};

pub static BROWSE: FamilyConfig = FamilyConfig {
    family: Family::Browse,
    submit_endpoint: "/browser-agent/run",
    status_endpoint: "/browser-agent/run/steps",
    data_endpoint: "/browser-agent/run/data",
    separate_status_endpoint: true,
    status_field: StatusField::NestedRun,
    success_states: GENERIC_SUCCESS,
    failure_states: GENERIC_FAILURE,
    in_progress_states: GENERIC_IN_PROGRESS,
    unknown_states: UnknownStatePolicy::KeepPolling,
};

// Search polls its data endpoint directly and only knows three words.
pub static SEARCH: FamilyConfig = FamilyConfig {
    family: Family::Search,
    submit_endpoint: "/search/run",
    status_endpoint: "/search/run/data",
    data_endpoint: "/search/run/data",
    separate_status_endpoint: false,
    status_field: StatusField::TopLevel,
    success_states: &["completed"],
    failure_states: &["failed"],
    in_progress_states: &["processing"],
    unknown_states: UnknownStatePolicy::Fail,
};

const UNKNOWN_ERROR: &str = "Unknown error";

impl FamilyConfig {
    /// The object holding `status` (and the failure detail) in a status body.
    fn status_container<'a>(&self, body: &'a Value) -> Option<&'a Value> {
        match self.status_field {
            StatusField::TopLevel => Some(body),
            StatusField::NestedRun => body.get("run"),
        }
    }

    /// Pull the raw status string out of a status response.
    pub fn extract_status<'a>(&self, body: &'a Value) -> Option<&'a str> {
        self.status_container(body)?
            .get("status")
            .and_then(Value::as_str)
    }

    /// Map a raw status string onto the canonical state model.
    pub fn classify(&self, status: Option<&str>) -> Classification {
        let Some(status) = status else {
            return Classification::Unrecognized;
        };

        if self.success_states.contains(&status) {
            Classification::Known(RunState::Succeeded)
        } else if self.failure_states.contains(&status) {
            Classification::Known(RunState::Failed)
        } else if self.in_progress_states.contains(&status) {
            Classification::Known(RunState::InProgress)
        } else {
            Classification::Unrecognized
        }
    }

    /// Human-readable failure reason from a status response.
    ///
    /// Looks at `error` then `message`, first inside the status container and
    /// then at the top level, skipping empty strings.
    pub fn failure_message(&self, body: &Value) -> String {
        let mut candidates = Vec::with_capacity(4);
        if let Some(container) = self.status_container(body) {
            candidates.push(container.get("error"));
            candidates.push(container.get("message"));
        }
        candidates.push(body.get("error"));
        candidates.push(body.get("message"));

        candidates
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_ERROR)
            .to_string()
    }
}
