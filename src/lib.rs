//! # photo2vector
//!
//! Turn a photo into vector-style art with a remote image-effects service.
//!
//! The service does the work; this crate drives it. A selected image is
//! uploaded to object storage through a signed URL, an effect job is
//! submitted for its public URL, the job is polled until it finishes, and the
//! resulting media is presented and saved locally.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image file
//!  │
//!  ├─ 1. Input     read the file, check it is image/*
//!  ├─ 2. Upload    signed URL + PUT → public URL
//!  ├─ 3. Submit    effect job for the public URL → job id
//!  ├─ 4. Poll      status every 2 s, at most 60 times
//!  ├─ 5. Present   pick the result URL, decode it once
//!  └─ 6. Download  direct save → PNG re-encode → open in browser
//! ```
//!
//! [`Studio`] exposes each user action (select, generate, present,
//! download, reset) and keeps a [`StatusController`] in sync with them.
//! [`vectorize`] and friends run the whole pipeline in one call.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use photo2vector::{vectorize_to_dir, StudioConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StudioConfig::default();
//!     let output = vectorize_to_dir("portrait.jpg", "out", &config).await?;
//!     println!("{}", output.generation.result_url);
//!     if let Some(path) = output.download.as_ref().and_then(|d| d.saved_path()) {
//!         eprintln!("saved to {}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `photo2vector` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! photo2vector = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod retry;
pub mod session;
pub mod status;
pub mod studio;
pub mod vectorize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{EffectsApi, FetchedMedia, HttpEffectsApi};
pub use config::{EffectFamily, StudioConfig, StudioConfigBuilder};
pub use error::{ApiStage, DownloadTierError, Photo2VectorError};
pub use output::{DownloadOutcome, DownloadReport, DownloadTier, Generation, VectorizeOutput, VectorizeStats};
pub use pipeline::download::{ExternalOpener, SystemBrowser};
pub use pipeline::input::LocalImage;
pub use pipeline::poll::{JobStatus, JobStatusResponse};
pub use pipeline::present::{PresentedResult, ResultPayload};
pub use pipeline::submit::{JobRequest, JobTicket};
pub use pipeline::upload::UploadedAsset;
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use session::Session;
pub use status::{DownloadControl, StatusController, UiState};
pub use studio::{Studio, UploadOutcome};
pub use vectorize::{upload_file, vectorize, vectorize_sync, vectorize_to_dir};
