//! Presentation state: the status label machine and the download control.
//!
//! ```text
//! IDLE ─▶ UPLOADING ─▶ READY ─▶ SUBMITTING ─▶ QUEUED ─▶ PROCESSING(n) ─▶ COMPLETE
//!            │                       │            │            │
//!            └───────────────────────┴────────────┴────────────┴─▶ ERROR
//! ```
//!
//! [`StatusController`] only tracks what a front end would show (labels,
//! enabled flags, the armed download URL). The uploaded asset lives in
//! [`crate::session::Session`], never here.

use crate::error::Photo2VectorError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Generate button text while it is idle or ready.
pub const GENERATE_LABEL: &str = "Generate Vector Art";
/// Generate button text after a completed job.
pub const GENERATE_AGAIN_LABEL: &str = "Generate Again";
pub const DOWNLOAD_LABEL: &str = "Download";
pub const DOWNLOADING_LABEL: &str = "Downloading...";

/// A pipeline status as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum UiState {
    #[default]
    Idle,
    Uploading,
    Ready,
    Submitting,
    Queued,
    /// Job still running after `n` status queries.
    Processing(u32),
    Complete,
    Error(String),
}

impl UiState {
    /// Status text, e.g. `PROCESSING... (3)`.
    pub fn label(&self) -> String {
        match self {
            UiState::Idle => "IDLE".to_string(),
            UiState::Uploading => "UPLOADING...".to_string(),
            UiState::Ready => "READY".to_string(),
            UiState::Submitting => "SUBMITTING JOB...".to_string(),
            UiState::Queued => "JOB QUEUED...".to_string(),
            UiState::Processing(n) => format!("PROCESSING... ({n})"),
            UiState::Complete => "COMPLETE".to_string(),
            UiState::Error(_) => "ERROR".to_string(),
        }
    }

    /// Only `READY` and `COMPLETE` allow starting a generation.
    pub fn generate_enabled(&self) -> bool {
        matches!(self, UiState::Ready | UiState::Complete)
    }

    /// A remote call is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            UiState::Uploading | UiState::Submitting | UiState::Queued | UiState::Processing(_)
        )
    }

    /// A generation (submit or poll) is outstanding.
    pub fn is_generating(&self) -> bool {
        matches!(
            self,
            UiState::Submitting | UiState::Queued | UiState::Processing(_)
        )
    }

    pub fn can_transition_to(&self, next: &UiState) -> bool {
        use UiState::*;
        match (self, next) {
            (_, Idle) => true,
            (Idle | Ready | Complete | Error(_) | Uploading, Uploading) => true,
            (Uploading, Ready) => true,
            (Ready | Complete, Submitting) => true,
            (Submitting, Queued) => true,
            (Queued, Processing(n)) => *n >= 1,
            (Processing(n), Processing(m)) => m > n,
            (Queued | Processing(_), Complete) => true,
            (from, Error(_)) => from.is_in_flight(),
            _ => false,
        }
    }
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Snapshot of the download control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadControl {
    /// URL the control will download; `None` while disarmed.
    pub url: Option<String>,
    pub label: String,
    pub enabled: bool,
}

impl Default for DownloadControl {
    fn default() -> Self {
        Self {
            url: None,
            label: DOWNLOAD_LABEL.to_string(),
            enabled: false,
        }
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    state: UiState,
    generate_label: String,
    download: DownloadControl,
    /// Bumped by [`StatusController::reset`] and [`StatusController::supersede`].
    epoch: u64,
}

impl ControllerState {
    fn apply(&mut self, next: &UiState) -> Result<(), Photo2VectorError> {
        if !self.state.can_transition_to(next) {
            return Err(Photo2VectorError::InvalidTransition {
                from: self.state.label(),
                to: next.label(),
            });
        }
        debug!("status: {} → {}", self.state, next);
        match next {
            UiState::Idle | UiState::Ready => self.generate_label = GENERATE_LABEL.to_string(),
            UiState::Complete => self.generate_label = GENERATE_AGAIN_LABEL.to_string(),
            UiState::Error(_) => {}
            in_flight => self.generate_label = in_flight.label(),
        }
        self.state = next.clone();
        Ok(())
    }
}

/// Owns the current [`UiState`] and the download control.
///
/// Interior mutability lets the orchestrator, the poll hook and download
/// guards share one controller by reference.
pub struct StatusController {
    inner: Mutex<ControllerState>,
    callback: Option<ProgressCallback>,
}

impl fmt::Debug for StatusController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusController")
            .field("state", &self.state())
            .finish()
    }
}

impl Default for StatusController {
    fn default() -> Self {
        Self::new(None)
    }
}

impl StatusController {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            inner: Mutex::new(ControllerState {
                generate_label: GENERATE_LABEL.to_string(),
                ..Default::default()
            }),
            callback,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> UiState {
        self.lock().state.clone()
    }

    pub fn generate_enabled(&self) -> bool {
        self.lock().state.generate_enabled()
    }

    /// Text of the generate button.
    pub fn generate_label(&self) -> String {
        self.lock().generate_label.clone()
    }

    /// Move to `next`, rejecting transitions the machine does not allow.
    pub fn transition(&self, next: UiState) -> Result<(), Photo2VectorError> {
        self.lock().apply(&next)?;
        self.notify(&next);
        Ok(())
    }

    /// Current epoch; see [`StatusController::transition_in`].
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Start a new epoch, making every earlier one stale.
    pub fn supersede(&self) -> u64 {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.epoch
    }

    /// Like [`StatusController::transition`], but only while `epoch` is
    /// current. Returns `Ok(false)` without touching the state once a reset
    /// or a newer action has started a later epoch.
    pub fn transition_in(&self, epoch: u64, next: UiState) -> Result<bool, Photo2VectorError> {
        {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                debug!("status: ignoring {} from stale epoch {}", next, epoch);
                return Ok(false);
            }
            inner.apply(&next)?;
        }
        self.notify(&next);
        Ok(true)
    }

    /// Return to `IDLE`, disarm the download control and start a new epoch.
    pub fn reset(&self) {
        {
            let mut inner = self.lock();
            inner.epoch += 1;
            inner.download = DownloadControl::default();
            inner.generate_label = GENERATE_LABEL.to_string();
            debug!("status: {} → {} (reset)", inner.state, UiState::Idle);
            inner.state = UiState::Idle;
        }
        self.notify(&UiState::Idle);
    }

    fn notify(&self, state: &UiState) {
        if let Some(ref cb) = self.callback {
            cb.on_state_change(state);
        }
    }

    /// Point the download control at a result and enable it.
    pub fn arm_download(&self, url: impl Into<String>) {
        let mut inner = self.lock();
        inner.download.url = Some(url.into());
        inner.download.enabled = true;
    }

    pub fn download_control(&self) -> DownloadControl {
        self.lock().download.clone()
    }

    /// Mark the download control busy until the returned guard drops.
    ///
    /// Returns `None` when the control is disarmed or already busy.
    pub fn begin_download(&self) -> Option<DownloadGuard<'_>> {
        let mut inner = self.lock();
        if inner.download.url.is_none() || !inner.download.enabled {
            return None;
        }
        let previous_label = std::mem::replace(&mut inner.download.label, DOWNLOADING_LABEL.to_string());
        inner.download.enabled = false;
        Some(DownloadGuard {
            controller: self,
            previous_label,
        })
    }
}

/// Restores the download control's label on drop and re-enables it if still armed.
#[must_use = "the download control is restored when the guard drops"]
pub struct DownloadGuard<'a> {
    controller: &'a StatusController,
    previous_label: String,
}

impl Drop for DownloadGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.controller.lock();
        inner.download.label = std::mem::take(&mut self.previous_label);
        // A reset during the download leaves the control disarmed.
        inner.download.enabled = inner.download.url.is_some();
    }
}
