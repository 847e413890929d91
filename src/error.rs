//! Error types for the photo2vector library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Photo2VectorError`]: **Fatal for the current action**: a file
//!   selection or a generate request could not complete (bad input, HTTP
//!   failure, job failed, poll budget exhausted). The session itself stays
//!   usable; a fresh upload starts over.
//!
//! * [`DownloadTierError`]: **Non-fatal**: one download strategy failed and
//!   the next one was tried. Stored inside [`crate::output::DownloadReport`]
//!   so callers can see which tiers were skipped and why.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The remote call a [`Photo2VectorError::Network`] error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStage {
    /// `GET /get-emd-upload-url`
    UploadTarget,
    /// `PUT <signed URL>`
    Upload,
    /// `POST /image-gen` or `/video-gen`
    Submit,
    /// `GET …/{jobId}/status`
    Status,
    /// `GET <result URL>`
    Fetch,
}

impl fmt::Display for ApiStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApiStage::UploadTarget => "Failed to get signed URL",
            ApiStage::Upload => "Failed to upload file",
            ApiStage::Submit => "Failed to submit job",
            ApiStage::Status => "Failed to check status",
            ApiStage::Fetch => "Failed to fetch result",
        };
        f.write_str(s)
    }
}

/// All errors returned by the photo2vector pipeline.
#[derive(Debug, Error)]
pub enum Photo2VectorError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Non-image file selected, or generate triggered with nothing uploaded.
    #[error("{0}")]
    Validation(String),

    // ── Remote service errors ─────────────────────────────────────────────
    /// Non-2xx response or transport failure talking to the service.
    #[error("{stage}: {detail}")]
    Network { stage: ApiStage, detail: String },

    /// The service reported the job as `failed` or `error`.
    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    /// The poll budget ran out before the job reached a terminal status.
    #[error("Job {job_id} timed out after {attempts} polls")]
    Timeout { job_id: String, attempts: u32 },

    /// The job completed but no media URL could be extracted.
    #[error("No image URL in response for job {job_id}")]
    MissingResult { job_id: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the downloaded file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config / state errors ─────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The status controller refused a state change.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Photo2VectorError {
    pub(crate) fn network(stage: ApiStage, detail: impl Into<String>) -> Self {
        Photo2VectorError::Network {
            stage,
            detail: detail.into(),
        }
    }

    /// Whether this is a validation error (bad selection or nothing to generate from).
    pub fn is_validation(&self) -> bool {
        matches!(self, Photo2VectorError::Validation(_))
    }
}

/// A non-fatal failure of a single download strategy.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DownloadTierError {
    /// Fetching the result bytes failed.
    #[error("direct download failed: {detail}")]
    Fetch { detail: String },

    /// Re-encoding the presented image failed or no image was loaded.
    #[error("canvas fallback failed: {detail}")]
    Canvas { detail: String },

    /// The system browser could not be launched.
    #[error("could not open browser: {detail}")]
    Browser { detail: String },
}
