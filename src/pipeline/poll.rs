//! Job polling: query a job's status until it completes, fails or the poll
//! budget runs out.
//!
//! One request is outstanding at a time and consecutive requests are spaced
//! by `poll_interval_ms`. A `completed` reply returns at once; `failed` and
//! `error` replies fail at once. Everything else counts as still running.

use crate::client::EffectsApi;
use crate::config::StudioConfig;
use crate::error::Photo2VectorError;
use crate::pipeline::present::ResultPayload;
use crate::retry::{poll_with_delay, PollError, PollPolicy};
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use tracing::{debug, info};

/// Fallback message when a failed job carries no error text.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Job processing failed";

/// Server-side job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Error,
    /// Any status this client does not know; treated as still running.
    #[default]
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn is_failure(self) -> bool {
        matches!(self, JobStatus::Failed | JobStatus::Error)
    }

    pub fn is_terminal(self) -> bool {
        self == JobStatus::Completed || self.is_failure()
    }
}

/// Body of `GET …/{jobId}/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatusResponse {
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub result: Option<ResultPayload>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl JobStatusResponse {
    /// Human-readable server error, if any.
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) if s.is_empty() => None,
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(map) => match map.get("message") {
                Some(serde_json::Value::String(s)) => Some(s.clone()),
                _ => Some(serde_json::Value::Object(map.clone()).to_string()),
            },
            other => Some(other.to_string()),
        }
    }
}

/// Poll `job_id` until it completes.
///
/// `on_attempt(n)` is called after the n-th non-terminal reply, before the
/// wait that precedes the next query.
///
/// # Errors
/// * [`Photo2VectorError::Network`]: transport failure or non-2xx reply
/// * [`Photo2VectorError::JobFailed`]: status `failed` / `error`
/// * [`Photo2VectorError::Timeout`]: `max_polls` replies without a terminal status
pub async fn poll(
    api: &dyn EffectsApi,
    config: &StudioConfig,
    job_id: &str,
    on_attempt: &(dyn Fn(u32) + Sync),
) -> Result<JobStatusResponse, Photo2VectorError> {
    let policy = PollPolicy::new(config.poll_interval(), config.max_polls);

    let outcome = poll_with_delay(policy, |attempt| async move {
        let response = api.job_status(job_id).await?;
        debug!("Poll {} - Status: {:?}", attempt, response.status);

        match response.status {
            JobStatus::Completed => Ok(ControlFlow::Break(response)),
            status if status.is_failure() => Err(Photo2VectorError::JobFailed {
                job_id: job_id.to_string(),
                message: response
                    .error_message()
                    .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
            }),
            _ => {
                on_attempt(attempt);
                Ok(ControlFlow::Continue(()))
            }
        }
    })
    .await;

    match outcome {
        Ok(response) => {
            info!("Job {} completed", job_id);
            Ok(response)
        }
        Err(PollError::Failed(e)) => Err(e),
        Err(PollError::Exhausted { attempts }) => Err(Photo2VectorError::Timeout {
            job_id: job_id.to_string(),
            attempts,
        }),
    }
}
