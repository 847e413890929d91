//! HTTP access to the remote effects service.
//!
//! Pipeline stages never touch `reqwest` directly; they talk to an
//! [`EffectsApi`]. [`HttpEffectsApi`] is the production implementation, and
//! tests swap in a scripted one so the poll loop can run on a paused clock.

use crate::config::StudioConfig;
use crate::error::{ApiStage, Photo2VectorError};
use crate::pipeline::poll::JobStatusResponse;
use crate::pipeline::submit::{JobRequest, JobTicket};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

const JSON_ACCEPT: &str = "application/json, text/plain, */*";

/// Raw bytes of a fetched media resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    pub bytes: Vec<u8>,
    /// `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
}

/// The remote calls the pipeline depends on.
#[async_trait]
pub trait EffectsApi: Send + Sync {
    /// Ask for a time-limited signed URL that accepts `file_name`.
    async fn request_upload_target(&self, file_name: &str) -> Result<String, Photo2VectorError>;

    /// Transfer raw bytes to a signed URL.
    async fn put_object(
        &self,
        signed_url: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), Photo2VectorError>;

    /// Submit a processing job.
    async fn submit_job(&self, request: &JobRequest) -> Result<JobTicket, Photo2VectorError>;

    /// Query the status of a submitted job.
    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, Photo2VectorError>;

    /// Download a media resource as bytes.
    async fn fetch_media(&self, url: &str) -> Result<FetchedMedia, Photo2VectorError>;
}

/// [`EffectsApi`] over HTTPS with `reqwest`.
pub struct HttpEffectsApi {
    /// Short timeout: upload-target, submit and status calls.
    api: Client,
    /// Long timeout: byte transfers to and from storage.
    transfer: Client,
    config: StudioConfig,
}

impl HttpEffectsApi {
    pub fn new(config: &StudioConfig) -> Result<Self, Photo2VectorError> {
        Ok(Self {
            api: build_client(config.request_timeout_secs)?,
            transfer: build_client(config.download_timeout_secs)?,
            config: config.clone(),
        })
    }
}

fn build_client(timeout_secs: u64) -> Result<Client, Photo2VectorError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("photo2vector/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Photo2VectorError::Internal(format!("Failed to build HTTP client: {e}")))
}

/// Map a transport failure, then reject non-2xx responses.
fn check(stage: ApiStage, sent: Result<Response, reqwest::Error>) -> Result<Response, Photo2VectorError> {
    let response = sent.map_err(|e| {
        if e.is_timeout() {
            Photo2VectorError::network(stage, format!("request timed out: {e}"))
        } else {
            Photo2VectorError::network(stage, e.to_string())
        }
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(Photo2VectorError::network(stage, format!("HTTP {status}")));
    }
    Ok(response)
}

#[async_trait]
impl EffectsApi for HttpEffectsApi {
    async fn request_upload_target(&self, file_name: &str) -> Result<String, Photo2VectorError> {
        let stage = ApiStage::UploadTarget;
        let sent = self
            .api
            .get(self.config.upload_target_endpoint())
            .query(&[("fileName", file_name)])
            .send()
            .await;
        let signed = check(stage, sent)?
            .text()
            .await
            .map_err(|e| Photo2VectorError::network(stage, e.to_string()))?;
        let signed = signed.trim();
        if signed.is_empty() {
            return Err(Photo2VectorError::network(stage, "empty signed URL"));
        }
        debug!("Got signed URL for {}", file_name);
        Ok(signed.to_string())
    }

    async fn put_object(
        &self,
        signed_url: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), Photo2VectorError> {
        let sent = self
            .transfer
            .put(signed_url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await;
        check(ApiStage::Upload, sent)?;
        Ok(())
    }

    async fn submit_job(&self, request: &JobRequest) -> Result<JobTicket, Photo2VectorError> {
        let stage = ApiStage::Submit;
        let endpoint = format!(
            "{}/{}",
            self.config.api_base.trim_end_matches('/'),
            request.family().path()
        );
        let sent = self
            .api
            .post(endpoint)
            .header(ACCEPT, JSON_ACCEPT)
            .json(request)
            .send()
            .await;
        check(stage, sent)?
            .json::<JobTicket>()
            .await
            .map_err(|e| Photo2VectorError::network(stage, format!("invalid response body: {e}")))
    }

    async fn job_status(&self, job_id: &str) -> Result<JobStatusResponse, Photo2VectorError> {
        let stage = ApiStage::Status;
        let sent = self
            .api
            .get(self.config.status_endpoint(job_id))
            .header(ACCEPT, JSON_ACCEPT)
            .send()
            .await;
        check(stage, sent)?
            .json::<JobStatusResponse>()
            .await
            .map_err(|e| Photo2VectorError::network(stage, format!("invalid response body: {e}")))
    }

    async fn fetch_media(&self, url: &str) -> Result<FetchedMedia, Photo2VectorError> {
        let stage = ApiStage::Fetch;
        let response = check(stage, self.transfer.get(url).send().await)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Photo2VectorError::network(stage, e.to_string()))?;
        Ok(FetchedMedia {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
