//! Per-user session context.
//!
//! A [`Session`] is passed explicitly to every pipeline call instead of
//! living in a global. It holds the current [`UploadedAsset`] and a
//! monotonically increasing upload token: each file selection takes a new
//! token, and an upload result is applied only if its token is still the
//! latest. A slow upload of an older selection therefore can never replace
//! the asset of a newer one.

use crate::pipeline::upload::UploadedAsset;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Identifies one file selection within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UploadToken(u64);

impl UploadToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Mutable per-session slot: "the image the next generation will use".
#[derive(Debug, Default)]
pub struct Session {
    latest_token: AtomicU64,
    asset: Mutex<Option<UploadedAsset>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<UploadedAsset>> {
        self.asset.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a new selection. Every earlier token becomes stale.
    pub fn begin_upload(&self) -> UploadToken {
        UploadToken(self.latest_token.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `token` belongs to the most recent selection.
    pub fn is_latest(&self, token: UploadToken) -> bool {
        self.latest_token.load(Ordering::SeqCst) == token.0
    }

    /// Store `asset` if `token` is still the latest; returns whether it was applied.
    pub fn complete_upload(&self, token: UploadToken, asset: UploadedAsset) -> bool {
        matches!(
            self.complete_upload_with(token, asset, || Ok::<(), std::convert::Infallible>(())),
            Ok(true)
        )
    }

    /// Like [`Session::complete_upload`], but runs `apply` first under the
    /// same lock. The asset is stored only if `apply` succeeds.
    pub fn complete_upload_with<E>(
        &self,
        token: UploadToken,
        asset: UploadedAsset,
        apply: impl FnOnce() -> Result<(), E>,
    ) -> Result<bool, E> {
        let mut slot = self.slot();
        // Checked under the slot lock so a concurrent reset or newer
        // completion cannot interleave between check and write.
        if !self.is_latest(token) {
            debug!("discarding stale upload #{} ({})", token.0, asset.url);
            return Ok(false);
        }
        apply()?;
        *slot = Some(asset);
        Ok(true)
    }

    /// The asset the next generation will use, if any.
    pub fn current_asset(&self) -> Option<UploadedAsset> {
        self.slot().clone()
    }

    /// Clear the asset and invalidate any upload still in flight.
    pub fn reset(&self) {
        let mut slot = self.slot();
        self.latest_token.fetch_add(1, Ordering::SeqCst);
        *slot = None;
    }
}
