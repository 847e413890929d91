//! The orchestrator: one method per user action.
//!
//! [`Studio`] wires the pipeline stages to a [`StatusController`] and reads
//! and writes the caller's [`Session`]. Every action either returns its
//! result or moves the status to `ERROR` and returns the error; nothing is
//! retried and the session stays usable for a fresh upload.

use crate::client::{EffectsApi, HttpEffectsApi};
use crate::config::StudioConfig;
use crate::error::Photo2VectorError;
use crate::output::{DownloadReport, Generation};
use crate::pipeline::download::{self, ExternalOpener, SystemBrowser};
use crate::pipeline::input::LocalImage;
use crate::pipeline::present::{self, PresentedResult};
use crate::pipeline::upload::{self, UploadedAsset};
use crate::pipeline::{poll, submit};
use crate::session::Session;
use crate::status::{StatusController, UiState};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// What happened to a file selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The upload finished and is now the session's asset.
    Applied(UploadedAsset),
    /// A newer selection (or a reset) happened first; nothing was applied.
    Superseded,
}

pub struct Studio {
    api: Arc<dyn EffectsApi>,
    opener: Arc<dyn ExternalOpener>,
    config: StudioConfig,
    status: StatusController,
}

impl Studio {
    /// A studio talking to the configured service over HTTP.
    pub fn new(config: StudioConfig) -> Result<Self, Photo2VectorError> {
        let api = HttpEffectsApi::new(&config)?;
        Ok(Self::with_api(config, Arc::new(api)))
    }

    /// A studio over any [`EffectsApi`] implementation.
    pub fn with_api(config: StudioConfig, api: Arc<dyn EffectsApi>) -> Self {
        let status = StatusController::new(config.progress_callback.clone());
        Self {
            api,
            opener: Arc::new(SystemBrowser),
            config,
            status,
        }
    }

    /// Replace how the last download fallback opens URLs.
    pub fn with_opener(mut self, opener: Arc<dyn ExternalOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn status(&self) -> &StatusController {
        &self.status
    }

    /// Upload a newly selected file and make it the session's asset.
    ///
    /// Overlapping calls are allowed: only the most recent selection is
    /// applied, older ones resolve to [`UploadOutcome::Superseded`] without
    /// touching the status.
    pub async fn select_file(
        &self,
        session: &Session,
        file: LocalImage,
    ) -> Result<UploadOutcome, Photo2VectorError> {
        if !file.content_type.starts_with("image/") {
            return Err(Photo2VectorError::Validation(
                "Please upload an image file.".into(),
            ));
        }
        if self.status.state().is_generating() {
            return Err(Photo2VectorError::Validation(
                "Please wait for the current generation to finish.".into(),
            ));
        }

        // A generation abandoned by a reset must not touch this selection's status.
        let epoch = self.status.supersede();
        let token = session.begin_upload();
        self.status.transition(UiState::Uploading)?;
        info!("Uploading {} (selection #{})", file.name, token.value());

        match upload::upload(self.api.as_ref(), &self.config, &file).await {
            Ok(asset) => {
                let applied = session.complete_upload_with(token, asset.clone(), || {
                    self.status.transition(UiState::Ready)
                })?;
                if !applied {
                    warn!("Upload #{} superseded by a newer selection", token.value());
                    return Ok(UploadOutcome::Superseded);
                }
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_upload_complete(&asset.url);
                }
                Ok(UploadOutcome::Applied(asset))
            }
            Err(e) if !session.is_latest(token) => {
                warn!("Superseded upload #{} failed: {}", token.value(), e);
                Ok(UploadOutcome::Superseded)
            }
            Err(e) => {
                self.fail(epoch, &e);
                Err(e)
            }
        }
    }

    /// Submit the session's asset and wait for the job to complete.
    ///
    /// # Errors
    /// * [`Photo2VectorError::Validation`]: nothing uploaded, or the status
    ///   does not allow generation right now
    /// * anything [`submit::submit`], [`poll::poll`] or
    ///   [`present::extract_media_url`] can return
    ///
    /// After a [`Studio::reset`] or a new [`Studio::select_file`] the job
    /// keeps running, but its outcome no longer changes the status.
    pub async fn generate(&self, session: &Session) -> Result<Generation, Photo2VectorError> {
        let asset = session
            .current_asset()
            .ok_or_else(|| Photo2VectorError::Validation("Please upload an image first.".into()))?;
        let state = self.status.state();
        if !state.generate_enabled() {
            return Err(Photo2VectorError::Validation(format!(
                "Generation is not available while {state}"
            )));
        }

        let epoch = self.status.epoch();
        self.status.transition(UiState::Submitting)?;
        match self.run_job(epoch, &asset).await {
            Ok(generation) => {
                if self.status.transition_in(epoch, UiState::Complete)? {
                    if let Some(ref cb) = self.config.progress_callback {
                        cb.on_result_ready(&generation.result_url);
                    }
                } else {
                    warn!("Job {} finished after a reset; status left unchanged", generation.job_id);
                }
                Ok(generation)
            }
            Err(e) => {
                self.fail(epoch, &e);
                Err(e)
            }
        }
    }

    async fn run_job(&self, epoch: u64, asset: &UploadedAsset) -> Result<Generation, Photo2VectorError> {
        let ticket = submit::submit(self.api.as_ref(), &self.config, asset).await?;
        self.status.transition_in(epoch, UiState::Queued)?;

        let pending = AtomicU32::new(0);
        let on_attempt = |n: u32| {
            pending.store(n, Ordering::SeqCst);
            if let Err(e) = self.status.transition_in(epoch, UiState::Processing(n)) {
                warn!("{}", e);
            }
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_poll_attempt(n, self.config.max_polls);
            }
        };
        let response = poll::poll(self.api.as_ref(), &self.config, &ticket.job_id, &on_attempt).await?;
        let result_url = present::extract_media_url(&ticket.job_id, &response)?;
        info!("Result image URL: {}", result_url);

        Ok(Generation {
            job_id: ticket.job_id,
            source_url: asset.url.clone(),
            result_url,
            result: response.result,
            polls: pending.load(Ordering::SeqCst) + 1,
        })
    }

    /// Load the result for display and arm the download control with it.
    pub async fn present(&self, generation: &Generation) -> PresentedResult {
        let presented = present::present(self.api.as_ref(), &generation.result_url).await;
        self.status.arm_download(&presented.url);
        presented
    }

    /// Save the presented result into `dir`, falling back tier by tier.
    ///
    /// The download control reads `Downloading...` for the duration and is
    /// restored afterwards whatever the outcome.
    pub async fn download(
        &self,
        presented: &PresentedResult,
        dir: impl AsRef<Path>,
    ) -> Result<DownloadReport, Photo2VectorError> {
        let _guard = self.status.begin_download().ok_or_else(|| {
            Photo2VectorError::Validation("There is no result ready to download.".into())
        })?;
        Ok(download::download(
            self.api.as_ref(),
            self.opener.as_ref(),
            presented,
            dir.as_ref(),
            &self.config.download_prefix,
        )
        .await)
    }

    /// Forget the uploaded asset and return to `IDLE`.
    pub fn reset(&self, session: &Session) {
        session.reset();
        self.status.reset();
    }

    fn fail(&self, epoch: u64, error: &Photo2VectorError) {
        tracing::error!("{}", error);
        match self.status.transition_in(epoch, UiState::Error(error.to_string())) {
            Ok(true) => {}
            Ok(false) => warn!("Not reporting a superseded failure as current status"),
            Err(e) => warn!("{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::ScriptedApi;
    use crate::client::FetchedMedia;
    use crate::progress::PipelineProgressCallback;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    fn photo() -> LocalImage {
        LocalImage::new("me.png", "image/png", vec![7; 16]).unwrap()
    }

    fn studio(api: Arc<ScriptedApi>) -> Studio {
        let config = StudioConfig::builder()
            .content_base("https://cdn.test/")
            .build()
            .unwrap();
        Studio::with_api(config, api)
    }

    #[tokio::test(start_paused = true)]
    async fn full_flow_reaches_complete() {
        let api = Arc::new(ScriptedApi::default());
        api.push_json_status(json!({"status": "processing"}));
        api.push_json_status(json!({"status": "completed", "result": [{"mediaUrl": "https://cdn/out.png"}]}));
        let studio = studio(api.clone());
        let session = Session::new();

        let outcome = studio.select_file(&session, photo()).await.unwrap();
        assert!(matches!(outcome, UploadOutcome::Applied(_)));
        assert_eq!(studio.status().state(), UiState::Ready);

        let generation = studio.generate(&session).await.unwrap();
        assert_eq!(generation.result_url, "https://cdn/out.png");
        assert_eq!(generation.polls, 2);
        assert!(generation.source_url.starts_with("https://cdn.test/"));
        assert_eq!(studio.status().state(), UiState::Complete);
        assert!(studio.status().generate_enabled());
    }

    #[tokio::test]
    async fn generate_without_upload_is_validation_error() {
        let studio = studio(Arc::new(ScriptedApi::default()));
        let err = studio.generate(&Session::new()).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn reset_then_generate_is_validation_error() {
        let api = Arc::new(ScriptedApi::default());
        let studio = studio(api.clone());
        let session = Session::new();
        studio.select_file(&session, photo()).await.unwrap();

        studio.reset(&session);

        assert_eq!(studio.status().state(), UiState::Idle);
        let err = studio.generate(&session).await.unwrap_err();
        assert!(err.is_validation());
        assert!(api.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_image_selection_is_rejected_before_upload() {
        let api = Arc::new(ScriptedApi::default());
        let studio = studio(api.clone());
        let file = LocalImage {
            name: "notes.txt".into(),
            content_type: "text/plain".into(),
            bytes: vec![],
        };
        let err = studio.select_file(&Session::new(), file).await.unwrap_err();
        assert!(err.is_validation());
        assert!(api.requested_names.lock().unwrap().is_empty());
        assert_eq!(studio.status().state(), UiState::Idle);
    }

    #[tokio::test]
    async fn upload_failure_moves_to_error_and_recovers() {
        let api = Arc::new(ScriptedApi::default());
        *api.put_result.lock().unwrap() = Err("HTTP 500".into());
        let studio = studio(api.clone());
        let session = Session::new();

        let err = studio.select_file(&session, photo()).await.unwrap_err();
        assert!(matches!(err, Photo2VectorError::Network { .. }));
        assert!(matches!(studio.status().state(), UiState::Error(_)));
        assert!(session.current_asset().is_none());

        *api.put_result.lock().unwrap() = Ok(());
        studio.select_file(&session, photo()).await.unwrap();
        assert_eq!(studio.status().state(), UiState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn job_failure_surfaces_and_keeps_asset() {
        let api = Arc::new(ScriptedApi::default());
        api.push_json_status(json!({"status": "failed", "error": "unsupported image"}));
        let studio = studio(api.clone());
        let session = Session::new();
        studio.select_file(&session, photo()).await.unwrap();

        let err = studio.generate(&session).await.unwrap_err();

        assert!(matches!(err, Photo2VectorError::JobFailed { .. }));
        assert!(matches!(studio.status().state(), UiState::Error(_)));
        assert!(!studio.status().generate_enabled());
        assert!(session.current_asset().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn completed_without_media_is_missing_result() {
        let api = Arc::new(ScriptedApi::default());
        api.push_json_status(json!({"status": "completed", "result": {}}));
        let studio = studio(api.clone());
        let session = Session::new();
        studio.select_file(&session, photo()).await.unwrap();

        let err = studio.generate(&session).await.unwrap_err();

        assert!(matches!(err, Photo2VectorError::MissingResult { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn newer_selection_wins_over_slow_older_upload() {
        let api = Arc::new(ScriptedApi::default());
        api.put_delays
            .lock()
            .unwrap()
            .extend([Duration::from_secs(5), Duration::from_millis(10)]);
        let studio = studio(api.clone());
        let session = Session::new();

        let first = LocalImage::new("old.jpg", "image/jpeg", vec![1]).unwrap();
        let second = LocalImage::new("new.png", "image/png", vec![2]).unwrap();
        let (a, b) = tokio::join!(
            studio.select_file(&session, first),
            studio.select_file(&session, second)
        );

        assert_eq!(a.unwrap(), UploadOutcome::Superseded);
        let UploadOutcome::Applied(asset) = b.unwrap() else {
            panic!("newest selection must be applied");
        };
        assert!(asset.url.ends_with(".png"));
        assert_eq!(session.current_asset(), Some(asset));
        assert_eq!(studio.status().state(), UiState::Ready);
    }

    /// Reset one second into polling, then select a file whose upload takes
    /// five seconds. The old job reports its outcome at two seconds.
    async fn reset_and_reselect_during_poll(
        reply: serde_json::Value,
    ) -> (
        Studio,
        Session,
        Result<Generation, Photo2VectorError>,
        Result<UploadOutcome, Photo2VectorError>,
    ) {
        let api = Arc::new(ScriptedApi::default());
        api.push_json_status(json!({"status": "processing"}));
        api.push_json_status(reply);
        let studio = studio(api.clone());
        let session = Session::new();
        studio.select_file(&session, photo()).await.unwrap();
        api.put_delays.lock().unwrap().push_back(Duration::from_secs(5));

        let (generated, selected) = tokio::join!(studio.generate(&session), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            studio.reset(&session);
            let fresh = LocalImage::new("fresh.webp", "image/webp", vec![3]).unwrap();
            studio.select_file(&session, fresh).await
        });
        (studio, session, generated, selected)
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_job_failure_does_not_clobber_new_upload() {
        let (studio, session, generated, selected) =
            reset_and_reselect_during_poll(json!({"status": "failed", "error": "boom"})).await;

        assert!(matches!(generated, Err(Photo2VectorError::JobFailed { .. })));
        let UploadOutcome::Applied(asset) = selected.unwrap() else {
            panic!("the new selection must be applied");
        };
        assert!(asset.url.ends_with(".webp"));
        assert_eq!(session.current_asset(), Some(asset));
        assert_eq!(studio.status().state(), UiState::Ready);
        assert!(studio.status().generate_enabled());
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_job_completion_leaves_status_alone() {
        let (studio, session, generated, selected) = reset_and_reselect_during_poll(
            json!({"status": "completed", "result": {"mediaUrl": "https://cdn/old.png"}}),
        )
        .await;

        assert_eq!(generated.unwrap().result_url, "https://cdn/old.png");
        assert!(matches!(selected.unwrap(), UploadOutcome::Applied(_)));
        assert_eq!(studio.status().state(), UiState::Ready);
        assert_eq!(studio.status().download_control().url, None);
        assert!(session.current_asset().unwrap().url.ends_with(".webp"));
    }

    #[tokio::test(start_paused = true)]
    async fn progress_callback_sees_poll_attempts() {
        #[derive(Default)]
        struct Polls(Mutex<Vec<(u32, u32)>>);
        impl PipelineProgressCallback for Polls {
            fn on_poll_attempt(&self, attempt: u32, max: u32) {
                self.0.lock().unwrap().push((attempt, max));
            }
        }
        let polls = Arc::new(Polls::default());
        let api = Arc::new(ScriptedApi::default());
        api.push_json_status(json!({"status": "queued"}));
        api.push_json_status(json!({"status": "completed", "result": {"mediaUrl": "u"}}));
        let config = StudioConfig::builder()
            .max_polls(5)
            .progress_callback(polls.clone())
            .build()
            .unwrap();
        let studio = Studio::with_api(config, api);
        let session = Session::new();
        studio.select_file(&session, photo()).await.unwrap();

        studio.generate(&session).await.unwrap();

        assert_eq!(polls.0.lock().unwrap().as_slice(), [(1, 5)]);
    }

    #[tokio::test(start_paused = true)]
    async fn download_restores_control_after_any_outcome() {
        let api = Arc::new(ScriptedApi::default());
        api.push_json_status(json!({"status": "completed", "result": {"mediaUrl": "https://cdn/out.webp"}}));
        *api.media.lock().unwrap() = Ok(FetchedMedia {
            bytes: b"not really webp".to_vec(),
            content_type: Some("image/webp".into()),
        });
        let studio = studio(api.clone());
        let session = Session::new();
        let dir = tempfile::tempdir().unwrap();

        assert!(studio
            .download(&PresentedResult::unloaded("https://cdn/out.webp"), dir.path())
            .await
            .unwrap_err()
            .is_validation());

        studio.select_file(&session, photo()).await.unwrap();
        let generation = studio.generate(&session).await.unwrap();
        let presented = studio.present(&generation).await;
        assert!(!presented.is_loaded(), "bytes are not a decodable image");
        let before = studio.status().download_control();

        let report = studio.download(&presented, dir.path()).await.unwrap();

        assert!(report.saved_path().unwrap().to_string_lossy().ends_with(".webp"));
        assert_eq!(studio.status().download_control(), before);
    }
}
