//! Upload: local file → publicly fetchable URL.
//!
//! Two calls: ask the service for a signed write URL for a freshly generated
//! file name, then `PUT` the raw bytes there. The public URL is derived from
//! the file name alone, so nothing needs to be read back.

use crate::client::EffectsApi;
use crate::config::StudioConfig;
use crate::error::Photo2VectorError;
use crate::pipeline::input::LocalImage;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Where a file is about to be written. Discarded after the upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub file_name: String,
    pub signed_url: String,
}

/// A file that is live at its public URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub file_name: String,
    pub url: String,
}

/// Random identifier over `[A-Za-z0-9]`.
pub fn random_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// `<random id>.<extension>`. Collisions are not checked.
pub fn generate_file_name(file: &LocalImage, id_len: usize) -> String {
    format!("{}.{}", random_id(id_len), file.extension())
}

/// Upload `file` and return its public URL.
///
/// # Errors
/// [`Photo2VectorError::Network`] when either the signed-URL request or the
/// byte transfer fails.
pub async fn upload(
    api: &dyn EffectsApi,
    config: &StudioConfig,
    file: &LocalImage,
) -> Result<UploadedAsset, Photo2VectorError> {
    let file_name = generate_file_name(file, config.file_id_len);
    let target = UploadTarget {
        signed_url: api.request_upload_target(&file_name).await?,
        file_name,
    };

    api.put_object(&target.signed_url, file.bytes.clone(), &file.content_type)
        .await?;

    let url = config.public_url(&target.file_name);
    info!("Uploaded {} to: {}", file.name, url);
    Ok(UploadedAsset {
        file_name: target.file_name,
        url,
    })
}
