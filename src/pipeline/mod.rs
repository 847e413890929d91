//! Pipeline stages for photo-to-vector generation.
//!
//! Each submodule implements one step and talks to the service only through
//! [`crate::client::EffectsApi`], so every stage can be tested against a
//! scripted API.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ upload ──▶ submit ──▶ poll ──▶ present ──▶ download
//! (file)   (signed PUT) (job)   (status)  (decode)   (3 tiers)
//! ```
//!
//! 1. [`input`]:    read and type-check the local image
//! 2. [`upload`]:   name it, get a signed URL, `PUT` the bytes
//! 3. [`submit`]:   build the image or video job request and submit it
//! 4. [`poll`]:     query status at a fixed interval until terminal
//! 5. [`present`]:  pick the result URL and decode the media once
//! 6. [`download`]: direct save, PNG re-encode, then browser fallback

pub mod download;
pub mod input;
pub mod poll;
pub mod present;
pub mod submit;
pub mod upload;
