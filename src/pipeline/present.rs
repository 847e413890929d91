//! Result extraction and presentation.
//!
//! A completed job's `result` is either one object or a list of objects, each
//! exposing its media under `mediaUrl`, `video` or `image`. The first list
//! element wins. Presenting a result loads and decodes it once so the
//! download fallback can re-encode it without another request.

use crate::client::EffectsApi;
use crate::error::Photo2VectorError;
use crate::pipeline::poll::JobStatusResponse;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One media reference in a job result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl MediaItem {
    /// `mediaUrl`, then `video`, then `image`; empty strings are skipped.
    pub fn url(&self) -> Option<&str> {
        [&self.media_url, &self.video, &self.image]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
    }
}

/// The `result` field of a status reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultPayload {
    Many(Vec<MediaItem>),
    One(MediaItem),
    /// Anything else the service might send; never yields a URL.
    Other(serde_json::Value),
}

impl ResultPayload {
    /// The selected item: the only one, or the first of a list.
    pub fn primary(&self) -> Option<&MediaItem> {
        match self {
            ResultPayload::Many(items) => items.first(),
            ResultPayload::One(item) => Some(item),
            ResultPayload::Other(_) => None,
        }
    }

    /// Every URL in the payload, in order.
    pub fn urls(&self) -> Vec<String> {
        match self {
            ResultPayload::Many(items) => items.iter().filter_map(|i| i.url()).map(str::to_string).collect(),
            ResultPayload::One(item) => item.url().map(str::to_string).into_iter().collect(),
            ResultPayload::Other(_) => Vec::new(),
        }
    }
}

/// Pick the media URL to display from a completed status reply.
///
/// # Errors
/// [`Photo2VectorError::MissingResult`] when no URL can be extracted.
pub fn extract_media_url(job_id: &str, response: &JobStatusResponse) -> Result<String, Photo2VectorError> {
    let url = response
        .result
        .as_ref()
        .and_then(ResultPayload::primary)
        .and_then(MediaItem::url);

    match url {
        Some(u) => Ok(u.to_string()),
        None => {
            warn!("Job {} completed without a media URL: {:?}", job_id, response.result);
            Err(Photo2VectorError::MissingResult {
                job_id: job_id.to_string(),
            })
        }
    }
}

/// A result ready to show and download.
#[derive(Debug, Clone)]
pub struct PresentedResult {
    pub url: String,
    /// The decoded media, when it could be loaded.
    pub image: Option<DynamicImage>,
}

impl PresentedResult {
    /// A presented result whose media was never loaded.
    pub fn unloaded(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            image: None,
        }
    }

    /// Decoded and non-empty, i.e. usable by the canvas fallback.
    pub fn is_loaded(&self) -> bool {
        self.image.as_ref().is_some_and(|img| img.width() > 0)
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|img| img.dimensions())
    }
}

/// Load and decode the media at `url` for display.
///
/// Load failures are not errors: the result is still presented, only the
/// canvas download fallback becomes unavailable.
pub async fn present(api: &dyn EffectsApi, url: &str) -> PresentedResult {
    let image = match api.fetch_media(url).await {
        Ok(media) => match image::load_from_memory(&media.bytes) {
            Ok(img) => {
                debug!("Presented {} ({}×{})", url, img.width(), img.height());
                Some(img)
            }
            Err(e) => {
                warn!("Could not decode result {}: {}", url, e);
                None
            }
        },
        Err(e) => {
            warn!("Could not load result {}: {}", url, e);
            None
        }
    };
    PresentedResult {
        url: url.to_string(),
        image,
    }
}
