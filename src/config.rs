//! Configuration types for the photo-to-vector pipeline.
//!
//! Everything the pipeline needs to know about the remote service lives in
//! [`StudioConfig`], built via its [`StudioConfigBuilder`]. The defaults point
//! at the production effects service with the photo-to-vector-art effect, so
//! `StudioConfig::default()` is ready to use.

use crate::error::Photo2VectorError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default base URL of the effects API.
pub const DEFAULT_API_BASE: &str = "https://api.chromastudio.ai";
/// Default prefix under which uploaded files are publicly served.
pub const DEFAULT_CONTENT_BASE: &str = "https://contents.maxstudio.ai/";
/// Account the jobs are submitted under.
pub const DEFAULT_USER_ID: &str = "DObRu1vyStbUynoQmTcHBlhs55z2";
pub const DEFAULT_EFFECT_ID: &str = "photoToVectorArt";
pub const DEFAULT_MODEL: &str = "image-effects";
/// Model name that switches the pipeline to the video endpoints.
pub const VIDEO_MODEL: &str = "video-effects";

/// Shortest random identifier accepted for uploaded file names.
pub const MIN_FILE_ID_LEN: usize = 21;

/// Configuration for a [`crate::studio::Studio`].
///
/// # Example
/// ```rust
/// use photo2vector::StudioConfig;
///
/// let config = StudioConfig::builder()
///     .effect_id("photoToVectorArt")
///     .poll_interval_ms(1000)
///     .max_polls(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_polls, 30);
/// ```
#[derive(Clone)]
pub struct StudioConfig {
    /// Base URL of the effects API (upload targets, job submission, status).
    pub api_base: String,

    /// Public prefix the uploaded file is served from, with or without a trailing `/`.
    pub content_base: String,

    /// Account identifier sent with every job and used in status URLs.
    pub user_id: String,

    /// Effect to apply. Default: `photoToVectorArt`.
    pub effect_id: String,

    /// Model family. `video-effects` selects the video endpoints.
    pub model: String,

    /// Tool type sent with image jobs. Default: same as `model`.
    pub tool_type: String,

    /// Ask the service to strip its watermark. Default: true.
    pub remove_watermark: bool,

    /// Keep the result out of public galleries. Default: true.
    pub is_private: bool,

    /// Length of the random identifier in generated file names. Default: 21.
    pub file_id_len: usize,

    /// Delay between status queries in milliseconds. Default: 2000.
    pub poll_interval_ms: u64,

    /// Maximum number of status queries before giving up. Default: 60.
    pub max_polls: u32,

    /// Per-request timeout for API calls in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// Timeout for the signed-URL upload and result download. Default: 120.
    pub download_timeout_secs: u64,

    /// Prefix of downloaded file names (`<prefix>_<id>.<ext>`). Default: `vector-art`.
    pub download_prefix: String,

    /// Receives status transitions and poll attempts.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            content_base: DEFAULT_CONTENT_BASE.to_string(),
            user_id: DEFAULT_USER_ID.to_string(),
            effect_id: DEFAULT_EFFECT_ID.to_string(),
            model: DEFAULT_MODEL.to_string(),
            tool_type: DEFAULT_MODEL.to_string(),
            remove_watermark: true,
            is_private: true,
            file_id_len: MIN_FILE_ID_LEN,
            poll_interval_ms: 2000,
            max_polls: 60,
            request_timeout_secs: 60,
            download_timeout_secs: 120,
            download_prefix: "vector-art".to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for StudioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StudioConfig")
            .field("api_base", &self.api_base)
            .field("content_base", &self.content_base)
            .field("user_id", &self.user_id)
            .field("effect_id", &self.effect_id)
            .field("model", &self.model)
            .field("tool_type", &self.tool_type)
            .field("remove_watermark", &self.remove_watermark)
            .field("is_private", &self.is_private)
            .field("file_id_len", &self.file_id_len)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("max_polls", &self.max_polls)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn PipelineProgressCallback>"),
            )
            .finish()
    }
}

impl StudioConfig {
    /// Create a new builder for `StudioConfig`.
    pub fn builder() -> StudioConfigBuilder {
        StudioConfigBuilder {
            config: Self::default(),
        }
    }

    /// Which endpoint family the configured model belongs to.
    pub fn family(&self) -> EffectFamily {
        EffectFamily::from_model(&self.model)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Endpoint that accepts job submissions, e.g. `https://…/image-gen`.
    pub fn submit_endpoint(&self) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), self.family().path())
    }

    /// Status endpoint for one job.
    pub fn status_endpoint(&self, job_id: &str) -> String {
        format!("{}/{}/{}/status", self.submit_endpoint(), self.user_id, job_id)
    }

    /// Endpoint that hands out signed upload URLs.
    pub fn upload_target_endpoint(&self) -> String {
        format!("{}/get-emd-upload-url", self.api_base.trim_end_matches('/'))
    }

    /// Public URL of an uploaded file name.
    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.content_base.trim_end_matches('/'), file_name)
    }
}

/// Builder for [`StudioConfig`].
#[derive(Debug)]
pub struct StudioConfigBuilder {
    config: StudioConfig,
}

impl StudioConfigBuilder {
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.config.api_base = url.into();
        self
    }

    pub fn content_base(mut self, url: impl Into<String>) -> Self {
        self.config.content_base = url.into();
        self
    }

    pub fn user_id(mut self, id: impl Into<String>) -> Self {
        self.config.user_id = id.into();
        self
    }

    pub fn effect_id(mut self, id: impl Into<String>) -> Self {
        self.config.effect_id = id.into();
        self
    }

    /// Set the model; the tool type follows it unless set explicitly afterwards.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.config.tool_type = model.clone();
        self.config.model = model;
        self
    }

    pub fn tool_type(mut self, tool_type: impl Into<String>) -> Self {
        self.config.tool_type = tool_type.into();
        self
    }

    pub fn remove_watermark(mut self, v: bool) -> Self {
        self.config.remove_watermark = v;
        self
    }

    pub fn is_private(mut self, v: bool) -> Self {
        self.config.is_private = v;
        self
    }

    pub fn file_id_len(mut self, n: usize) -> Self {
        self.config.file_id_len = n.max(MIN_FILE_ID_LEN);
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn max_polls(mut self, n: u32) -> Self {
        self.config.max_polls = n;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn download_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.download_prefix = prefix.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<StudioConfig, Photo2VectorError> {
        let c = &self.config;
        for (name, url) in [("api_base", &c.api_base), ("content_base", &c.content_base)] {
            if reqwest::Url::parse(url).is_err() {
                return Err(Photo2VectorError::InvalidConfig(format!(
                    "{name} must be an absolute URL, got '{url}'"
                )));
            }
        }
        if c.user_id.is_empty() || c.effect_id.is_empty() {
            return Err(Photo2VectorError::InvalidConfig(
                "user_id and effect_id must not be empty".into(),
            ));
        }
        if c.max_polls == 0 {
            return Err(Photo2VectorError::InvalidConfig(
                "max_polls must be ≥ 1".into(),
            ));
        }
        if c.download_prefix.contains(&['/', '\\'][..]) {
            return Err(Photo2VectorError::InvalidConfig(format!(
                "download_prefix must not contain path separators, got '{}'",
                c.download_prefix
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Endpoint family of an effect model.
///
/// Photo-to-vector is always [`EffectFamily::Image`]; the video family is
/// kept because the service shares one contract for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectFamily {
    #[default]
    Image,
    Video,
}

impl EffectFamily {
    pub fn from_model(model: &str) -> Self {
        if model == VIDEO_MODEL {
            EffectFamily::Video
        } else {
            EffectFamily::Image
        }
    }

    /// Path segment of the submit and status endpoints.
    pub fn path(self) -> &'static str {
        match self {
            EffectFamily::Image => "image-gen",
            EffectFamily::Video => "video-gen",
        }
    }
}
