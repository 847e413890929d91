//! Input resolution: load a user-selected file and check it is an image.
//!
//! The declared content type comes from the file extension, like a browser's
//! `File.type`. When the extension is unknown the first bytes are sniffed
//! instead; anything that is still not `image/*` is rejected before any
//! network call is made.

use crate::error::Photo2VectorError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A selected file, fully read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImage {
    /// Original file name, including extension.
    pub name: String,
    /// Declared MIME type, e.g. `image/png`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl LocalImage {
    /// Build from bytes already in memory.
    ///
    /// Returns a validation error unless the content type is `image/*`.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, Photo2VectorError> {
        let image = Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        };
        if !image.content_type.starts_with("image/") {
            return Err(Photo2VectorError::Validation(format!(
                "Please upload an image file ('{}' is {})",
                image.name, image.content_type
            )));
        }
        Ok(image)
    }

    /// Read a file from disk, validating existence and type.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Photo2VectorError> {
        let path = path.as_ref();
        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(Photo2VectorError::PermissionDenied {
                    path: path.to_path_buf(),
                });
            }
            Err(_) => {
                return Err(Photo2VectorError::FileNotFound {
                    path: PathBuf::from(path),
                });
            }
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let content_type = declared_content_type(&name, &bytes);
        debug!("Resolved local image: {} ({}, {} bytes)", path.display(), content_type, bytes.len());

        Self::new(name, content_type, bytes)
    }

    /// Text after the last `.` of the name, or `jpg` when there is none.
    pub fn extension(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext,
            _ => "jpg",
        }
    }
}

/// Content type from the extension, falling back to magic bytes.
pub fn declared_content_type(name: &str, bytes: &[u8]) -> String {
    let ext = name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    let by_ext = match ext.as_str() {
        "jpg" | "jpeg" | "jfif" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        "avif" => Some("image/avif"),
        "heic" => Some("image/heic"),
        "svg" => Some("image/svg+xml"),
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        _ => None,
    };
    if let Some(ct) = by_ext {
        return ct.to_string();
    }
    match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type().to_string(),
        Err(_) => "application/octet-stream".to_string(),
    }
}
