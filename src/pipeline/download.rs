//! Download with a three-tier fallback.
//!
//! 1. **Direct**: fetch the bytes and save them under a name whose
//!    extension follows the response `Content-Type`.
//! 2. **Canvas**: re-encode the already presented image as PNG. Only
//!    possible when presentation managed to decode the media.
//! 3. **Browser**: open the URL in the system browser and ask the user to
//!    save it by hand.
//!
//! Each tier runs only after the previous one failed. Tier failures are
//! collected in the [`DownloadReport`], never returned as errors.

use crate::client::EffectsApi;
use crate::error::{DownloadTierError, Photo2VectorError};
use crate::output::{DownloadOutcome, DownloadReport, DownloadTier};
use crate::pipeline::present::PresentedResult;
use crate::pipeline::upload::random_id;
use image::ImageFormat;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Shown when every automatic tier failed.
pub const MANUAL_SAVE_HINT: &str = "Download started in new tab. Right-click image to save.";

/// Opens a URL outside the process, e.g. in the default browser.
pub trait ExternalOpener: Send + Sync {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// [`ExternalOpener`] backed by the platform's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl ExternalOpener for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        open::that(url)
    }
}

/// File extension for a response `Content-Type`: `webp`, `png`, else `jpg`.
pub fn extension_for_content_type(content_type: Option<&str>) -> &'static str {
    let ct = content_type.unwrap_or_default().to_ascii_lowercase();
    if ct.contains("webp") {
        "webp"
    } else if ct.contains("png") {
        "png"
    } else {
        "jpg"
    }
}

/// `<prefix>_<8 random chars>.<ext>`
pub fn download_file_name(prefix: &str, ext: &str) -> String {
    format!("{}_{}.{}", prefix, random_id(8), ext)
}

/// Try every tier in order and report what happened.
pub async fn download(
    api: &dyn EffectsApi,
    opener: &dyn ExternalOpener,
    presented: &PresentedResult,
    dir: &Path,
    prefix: &str,
) -> DownloadReport {
    let mut failures = Vec::new();

    match save_direct(api, &presented.url, dir, prefix).await {
        Ok(path) => return DownloadReport::saved(path, DownloadTier::Direct, failures),
        Err(e) => {
            warn!("Direct download failed, trying fallback: {}", e);
            failures.push(e);
        }
    }

    match save_canvas(presented, dir, prefix).await {
        Ok(path) => return DownloadReport::saved(path, DownloadTier::Canvas, failures),
        Err(e) => {
            warn!("Canvas fallback failed: {}", e);
            failures.push(e);
        }
    }

    let opened = match opener.open(&presented.url) {
        Ok(()) => true,
        Err(e) => {
            failures.push(DownloadTierError::Browser {
                detail: e.to_string(),
            });
            false
        }
    };
    info!("Opened {} externally (launched: {})", presented.url, opened);
    DownloadReport {
        outcome: DownloadOutcome::Manual {
            url: presented.url.clone(),
            opened,
            hint: MANUAL_SAVE_HINT.to_string(),
        },
        failures,
    }
}

async fn save_direct(
    api: &dyn EffectsApi,
    url: &str,
    dir: &Path,
    prefix: &str,
) -> Result<PathBuf, DownloadTierError> {
    let media = api
        .fetch_media(url)
        .await
        .map_err(|e| DownloadTierError::Fetch { detail: e.to_string() })?;
    let ext = extension_for_content_type(media.content_type.as_deref());
    let path = dir.join(download_file_name(prefix, ext));
    write_atomic(&path, media.bytes)
        .await
        .map_err(|e| DownloadTierError::Fetch { detail: e.to_string() })?;
    Ok(path)
}

async fn save_canvas(
    presented: &PresentedResult,
    dir: &Path,
    prefix: &str,
) -> Result<PathBuf, DownloadTierError> {
    let img = match &presented.image {
        Some(img) if presented.is_loaded() => img,
        _ => {
            return Err(DownloadTierError::Canvas {
                detail: "no rendered image available".into(),
            })
        }
    };
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| DownloadTierError::Canvas { detail: e.to_string() })?;
    let path = dir.join(download_file_name(prefix, "png"));
    write_atomic(&path, png)
        .await
        .map_err(|e| DownloadTierError::Canvas { detail: e.to_string() })?;
    Ok(path)
}

/// Write to a temp file next to `path`, then rename it into place.
///
/// The temp file is deleted if anything fails before the rename.
async fn write_atomic(path: &Path, bytes: Vec<u8>) -> Result<(), Photo2VectorError> {
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let dir = target.parent().unwrap_or_else(|| Path::new("."));
        let fail = |source| Photo2VectorError::OutputWriteFailed {
            path: target.clone(),
            source,
        };
        std::fs::create_dir_all(dir).map_err(fail)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(fail)?;
        tmp.write_all(&bytes).map_err(fail)?;
        tmp.persist(&target).map_err(|e| fail(e.error))?;
        Ok::<(), Photo2VectorError>(())
    })
    .await
    .map_err(|e| Photo2VectorError::Internal(format!("Write task panicked: {e}")))?
}
