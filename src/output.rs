//! Result types returned by the pipeline.

use crate::error::DownloadTierError;
use crate::pipeline::present::ResultPayload;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A completed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub job_id: String,
    /// Public URL of the source image the job ran on.
    pub source_url: String,
    /// The selected media URL (first element when several were returned).
    pub result_url: String,
    /// Raw `result` field from the final status reply.
    pub result: Option<ResultPayload>,
    /// Status queries issued, including the final `completed` one.
    pub polls: u32,
}

/// Which strategy produced a saved file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadTier {
    /// Fetched bytes saved as-is.
    Direct,
    /// Presented image re-encoded as PNG.
    Canvas,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DownloadOutcome {
    Saved { path: PathBuf, tier: DownloadTier },
    /// Nothing was saved; the user has to save `url` by hand.
    Manual { url: String, opened: bool, hint: String },
}

/// What a download attempt did, plus the tiers that failed on the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadReport {
    pub outcome: DownloadOutcome,
    pub failures: Vec<DownloadTierError>,
}

impl DownloadReport {
    pub(crate) fn saved(path: PathBuf, tier: DownloadTier, failures: Vec<DownloadTierError>) -> Self {
        Self {
            outcome: DownloadOutcome::Saved { path, tier },
            failures,
        }
    }

    /// Path of the saved file, if any tier saved one.
    pub fn saved_path(&self) -> Option<&PathBuf> {
        match &self.outcome {
            DownloadOutcome::Saved { path, .. } => Some(path),
            DownloadOutcome::Manual { .. } => None,
        }
    }
}

/// Timing of a one-shot run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizeStats {
    pub upload_duration_ms: u64,
    pub generation_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a one-shot [`crate::vectorize::vectorize`] run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizeOutput {
    pub input_name: String,
    pub generation: Generation,
    /// `(width, height)` of the result, when it could be decoded.
    pub dimensions: Option<(u32, u32)>,
    pub download: Option<DownloadReport>,
    pub stats: VectorizeStats,
}
