//! One-shot entry points.
//!
//! These run a whole selection through a private [`Studio`] and
//! [`Session`]: upload, generate, present, and optionally download. Use
//! [`Studio`] directly when the same session should see several uploads or
//! generations.

use crate::config::StudioConfig;
use crate::error::Photo2VectorError;
use crate::output::{VectorizeOutput, VectorizeStats};
use crate::pipeline::input::LocalImage;
use crate::pipeline::upload::UploadedAsset;
use crate::session::Session;
use crate::studio::{Studio, UploadOutcome};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Turn the image at `path` into vector art and return the result URL.
///
/// # Example
/// ```rust,no_run
/// use photo2vector::{vectorize, StudioConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let output = vectorize("portrait.jpg", &StudioConfig::default()).await?;
/// println!("{}", output.generation.result_url);
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// Anything [`Studio::select_file`] or [`Studio::generate`] can return.
pub async fn vectorize(
    path: impl AsRef<Path>,
    config: &StudioConfig,
) -> Result<VectorizeOutput, Photo2VectorError> {
    run(path.as_ref(), None, config).await
}

/// Like [`vectorize`], then save the result into `dir`.
///
/// A failed download is not an error: the report in
/// [`VectorizeOutput::download`] says which tiers failed and, when nothing
/// could be saved, which URL to save by hand.
pub async fn vectorize_to_dir(
    path: impl AsRef<Path>,
    dir: impl AsRef<Path>,
    config: &StudioConfig,
) -> Result<VectorizeOutput, Photo2VectorError> {
    run(path.as_ref(), Some(dir.as_ref()), config).await
}

/// Synchronous wrapper around [`vectorize`].
///
/// Creates a temporary tokio runtime internally.
pub fn vectorize_sync(
    path: impl AsRef<Path>,
    config: &StudioConfig,
) -> Result<VectorizeOutput, Photo2VectorError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Photo2VectorError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(vectorize(path, config))
}

/// Upload the image at `path` without generating anything.
pub async fn upload_file(
    path: impl AsRef<Path>,
    config: &StudioConfig,
) -> Result<UploadedAsset, Photo2VectorError> {
    let file = LocalImage::from_path(path).await?;
    let studio = Studio::new(config.clone())?;
    select(&studio, &Session::new(), file).await
}

async fn run(
    path: &Path,
    dir: Option<&Path>,
    config: &StudioConfig,
) -> Result<VectorizeOutput, Photo2VectorError> {
    let total_start = Instant::now();
    info!("Starting vectorization: {}", path.display());

    let file = LocalImage::from_path(path).await?;
    let input_name = file.name.clone();
    let studio = Studio::new(config.clone())?;
    let session = Session::new();

    let upload_start = Instant::now();
    select(&studio, &session, file).await?;
    let upload_duration_ms = upload_start.elapsed().as_millis() as u64;

    let generation_start = Instant::now();
    let generation = studio.generate(&session).await?;
    let generation_duration_ms = generation_start.elapsed().as_millis() as u64;

    let presented = studio.present(&generation).await;
    let download = match dir {
        Some(dir) => Some(studio.download(&presented, dir).await?),
        None => None,
    };

    let stats = VectorizeStats {
        upload_duration_ms,
        generation_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Vectorized {} in {}ms ({} polls)",
        input_name, stats.total_duration_ms, generation.polls
    );

    Ok(VectorizeOutput {
        input_name,
        dimensions: presented.dimensions(),
        generation,
        download,
        stats,
    })
}

async fn select(
    studio: &Studio,
    session: &Session,
    file: LocalImage,
) -> Result<UploadedAsset, Photo2VectorError> {
    match studio.select_file(session, file).await? {
        UploadOutcome::Applied(asset) => Ok(asset),
        // Only one selection is ever made on this session.
        UploadOutcome::Superseded => Err(Photo2VectorError::Internal(
            "upload superseded on a private session".into(),
        )),
    }
}
