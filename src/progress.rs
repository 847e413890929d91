//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::StudioConfigBuilder::progress_callback`] to receive
//! events as a file is uploaded, a job is polled and a result arrives.
//! The library never prints; the CLI turns these events into a spinner.
//!
//! # Example
//!
//! ```rust
//! use photo2vector::{PipelineProgressCallback, StudioConfig, UiState};
//! use std::sync::{Arc, atomic::{AtomicU32, Ordering}};
//!
//! struct PollCounter(AtomicU32);
//!
//! impl PipelineProgressCallback for PollCounter {
//!     fn on_poll_attempt(&self, attempt: u32, _max: u32) {
//!         self.0.store(attempt, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = StudioConfig::builder()
//!     .progress_callback(Arc::new(PollCounter(AtomicU32::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::status::UiState;
use std::sync::Arc;

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called after every accepted status transition.
    fn on_state_change(&self, state: &UiState) {
        let _ = state;
    }

    /// Called after a non-terminal status response.
    ///
    /// # Arguments
    /// * `attempt`: 1-indexed number of the status query just answered
    /// * `max`:     poll budget
    fn on_poll_attempt(&self, attempt: u32, max: u32) {
        let _ = (attempt, max);
    }

    /// Called when an upload is applied to the session.
    fn on_upload_complete(&self, public_url: &str) {
        let _ = public_url;
    }

    /// Called when a completed job yielded a media URL.
    fn on_result_ready(&self, result_url: &str) {
        let _ = result_url;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::StudioConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
