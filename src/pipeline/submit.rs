//! Job submission: uploaded asset → server-issued job id.
//!
//! The request body is built entirely from [`StudioConfig`]; only the image
//! URL varies between calls.

use crate::client::EffectsApi;
use crate::config::{EffectFamily, StudioConfig, VIDEO_MODEL};
use crate::error::Photo2VectorError;
use crate::pipeline::poll::JobStatus;
use crate::pipeline::upload::UploadedAsset;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

/// Body of `POST /image-gen`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageJobRequest {
    pub model: String,
    pub tool_type: String,
    pub effect_id: String,
    pub image_url: String,
    pub user_id: String,
    pub remove_watermark: bool,
    pub is_private: bool,
}

/// Body of `POST /video-gen`; the image URL travels as a one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoJobRequest {
    pub image_url: Vec<String>,
    pub effect_id: String,
    pub user_id: String,
    pub remove_watermark: bool,
    pub model: String,
    pub is_private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum JobRequest {
    Image(ImageJobRequest),
    Video(VideoJobRequest),
}

impl JobRequest {
    /// Build the request for `image_url` from static configuration.
    pub fn new(config: &StudioConfig, image_url: &str) -> Self {
        match config.family() {
            EffectFamily::Image => JobRequest::Image(ImageJobRequest {
                model: config.model.clone(),
                tool_type: config.tool_type.clone(),
                effect_id: config.effect_id.clone(),
                image_url: image_url.to_string(),
                user_id: config.user_id.clone(),
                remove_watermark: config.remove_watermark,
                is_private: config.is_private,
            }),
            EffectFamily::Video => JobRequest::Video(VideoJobRequest {
                image_url: vec![image_url.to_string()],
                effect_id: config.effect_id.clone(),
                user_id: config.user_id.clone(),
                remove_watermark: config.remove_watermark,
                model: VIDEO_MODEL.to_string(),
                is_private: config.is_private,
            }),
        }
    }

    pub fn family(&self) -> EffectFamily {
        match self {
            JobRequest::Image(_) => EffectFamily::Image,
            JobRequest::Video(_) => EffectFamily::Video,
        }
    }
}

/// Response to a job submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTicket {
    #[serde(deserialize_with = "string_or_number")]
    pub job_id: String,
    #[serde(default)]
    pub status: JobStatus,
}

/// Job ids are strings, but accept a bare number too.
fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }
    Ok(match Id::deserialize(d)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Submit a processing job for `asset`.
pub async fn submit(
    api: &dyn EffectsApi,
    config: &StudioConfig,
    asset: &UploadedAsset,
) -> Result<JobTicket, Photo2VectorError> {
    let request = JobRequest::new(config, &asset.url);
    let ticket = api.submit_job(&request).await?;
    info!("Job submitted: {} Status: {:?}", ticket.job_id, ticket.status);
    Ok(ticket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::ScriptedApi;
    use serde_json::json;

    fn asset(url: &str) -> UploadedAsset {
        UploadedAsset {
            file_name: "x.png".into(),
            url: url.into(),
        }
    }

    #[test]
    fn image_body_matches_wire_contract() {
        let config = StudioConfig::builder().user_id("u1").build().unwrap();
        let body = serde_json::to_value(JobRequest::new(&config, "https://cdn/x.png")).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "image-effects",
                "toolType": "image-effects",
                "effectId": "photoToVectorArt",
                "imageUrl": "https://cdn/x.png",
                "userId": "u1",
                "removeWatermark": true,
                "isPrivate": true,
            })
        );
    }

    #[test]
    fn video_body_wraps_url_in_list() {
        let config = StudioConfig::builder().model("video-effects").build().unwrap();
        let req = JobRequest::new(&config, "https://cdn/x.png");
        assert_eq!(req.family(), EffectFamily::Video);
        let body = serde_json::to_value(req).unwrap();
        assert_eq!(body["imageUrl"], json!(["https://cdn/x.png"]));
        assert_eq!(body["model"], "video-effects");
        assert!(body.get("toolType").is_none());
    }

    #[tokio::test]
    async fn static_fields_do_not_depend_on_input_url() {
        let api = ScriptedApi::default();
        let config = StudioConfig::default();
        for url in ["https://a/1.png", "https://b/2.jpg", ""] {
            submit(&api, &config, &asset(url)).await.unwrap();
        }
        for req in api.submitted.lock().unwrap().iter() {
            let JobRequest::Image(body) = req else {
                panic!("expected image request, got {req:?}");
            };
            assert_eq!(body.model, config.model);
            assert_eq!(body.tool_type, config.tool_type);
            assert_eq!(body.effect_id, config.effect_id);
        }
    }

    #[tokio::test]
    async fn submit_failure_is_network_error() {
        let api = ScriptedApi::default();
        *api.ticket.lock().unwrap() = Err("HTTP 502 Bad Gateway".into());
        let err = submit(&api, &StudioConfig::default(), &asset("https://a/1.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, Photo2VectorError::Network { .. }));
    }

    #[test]
    fn ticket_accepts_string_or_numeric_id() {
        let t: JobTicket = serde_json::from_value(json!({"jobId": "abc", "status": "queued"})).unwrap();
        assert_eq!(t.job_id, "abc");
        assert_eq!(t.status, JobStatus::Queued);
        let t: JobTicket = serde_json::from_value(json!({"jobId": 42})).unwrap();
        assert_eq!(t.job_id, "42");
    }
}
