//! Integration tests: the real HTTP client against a local mock service.
//!
//! Every endpoint the pipeline touches (upload target, signed PUT, job
//! submission, status, result media) is served by one `wiremock` server.

use image::{ImageFormat, Rgba, RgbaImage};
use photo2vector::{
    vectorize, vectorize_to_dir, ApiStage, DownloadOutcome, DownloadTier, LocalImage,
    Photo2VectorError, Session, Studio, StudioConfig, UiState, UploadOutcome,
};
use serde_json::json;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use wiremock::matchers::{body_partial_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: &str = "test-user";

// ── Test helpers ─────────────────────────────────────────────────────────────

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([20, 40, 60, 255])))
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

fn write_photo(dir: &Path) -> PathBuf {
    let p = dir.join("portrait.png");
    std::fs::write(&p, png_bytes(8, 8)).unwrap();
    p
}

fn config(server: &MockServer) -> StudioConfig {
    StudioConfig::builder()
        .api_base(server.uri())
        .content_base(format!("{}/cdn/", server.uri()))
        .user_id(USER)
        .poll_interval_ms(10)
        .max_polls(5)
        .build()
        .unwrap()
}

/// Upload target + signed PUT, both succeeding.
async fn mount_upload(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/get-emd-upload-url"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(format!("{}/storage/put?sig=abc\n", server.uri())),
        )
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/storage/put"))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_submit(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/image-gen"))
        .and(body_partial_json(json!({
            "model": "image-effects",
            "toolType": "image-effects",
            "effectId": "photoToVectorArt",
            "userId": USER,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jobId": "job-42", "status": "queued"})))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, replies: &[serde_json::Value]) {
    let status_path = format!("/image-gen/{USER}/job-42/status");
    for reply in replies {
        Mock::given(method("GET"))
            .and(path(status_path.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply.clone()))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn photo_to_saved_vector_art() {
    let server = MockServer::start().await;
    mount_upload(&server).await;
    mount_submit(&server).await;
    let result_url = format!("{}/results/out.png", server.uri());
    mount_status(
        &server,
        &[
            json!({"status": "processing"}),
            json!({"status": "completed", "result": [{"mediaUrl": result_url}]}),
        ],
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/results/out.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(png_bytes(4, 3)),
        )
        .mount(&server)
        .await;

    let input = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let photo = write_photo(input.path());

    let output = vectorize_to_dir(&photo, out.path(), &config(&server)).await.unwrap();

    assert_eq!(output.input_name, "portrait.png");
    assert_eq!(output.generation.job_id, "job-42");
    assert_eq!(output.generation.result_url, result_url);
    assert_eq!(output.generation.polls, 2);
    assert!(output.generation.source_url.starts_with(&format!("{}/cdn/", server.uri())));
    assert!(output.generation.source_url.ends_with(".png"));
    assert_eq!(output.dimensions, Some((4, 3)));

    let report = output.download.expect("download requested");
    let DownloadOutcome::Saved { path, tier } = &report.outcome else {
        panic!("expected a saved file, got {:?}", report.outcome);
    };
    assert_eq!(*tier, DownloadTier::Direct);
    assert_eq!(path.extension().unwrap(), "png");
    assert!(path.starts_with(out.path()));
    assert_eq!(std::fs::read(path).unwrap(), png_bytes(4, 3));

    let requests = server.received_requests().await.unwrap();
    let target = requests
        .iter()
        .find(|r| r.url.path() == "/get-emd-upload-url")
        .unwrap();
    let (key, file_name) = target.url.query_pairs().next().unwrap();
    assert_eq!(key, "fileName");
    assert_eq!(file_name.len(), 21 + ".png".len());
    assert!(output.generation.source_url.ends_with(&*file_name));
}

#[tokio::test]
async fn no_download_returns_url_only() {
    let server = MockServer::start().await;
    mount_upload(&server).await;
    mount_submit(&server).await;
    mount_status(&server, &[json!({"status": "completed", "result": {"image": "https://elsewhere/r.jpg"}})]).await;

    let input = tempfile::tempdir().unwrap();
    let output = vectorize(write_photo(input.path()), &config(&server)).await.unwrap();

    assert_eq!(output.generation.result_url, "https://elsewhere/r.jpg");
    assert!(output.download.is_none());
    assert_eq!(output.generation.polls, 1);
}

#[tokio::test]
async fn failed_job_reports_server_message() {
    let server = MockServer::start().await;
    mount_upload(&server).await;
    mount_submit(&server).await;
    mount_status(&server, &[json!({"status": "failed", "error": "no face found"})]).await;

    let input = tempfile::tempdir().unwrap();
    let err = vectorize(write_photo(input.path()), &config(&server)).await.unwrap_err();

    match err {
        Photo2VectorError::JobFailed { job_id, message } => {
            assert_eq!(job_id, "job-42");
            assert_eq!(message, "no face found");
        }
        other => panic!("expected JobFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn status_budget_runs_out() {
    let server = MockServer::start().await;
    mount_upload(&server).await;
    mount_submit(&server).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/image-gen/.+/status$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "processing"})))
        .expect(5)
        .mount(&server)
        .await;

    let input = tempfile::tempdir().unwrap();
    let err = vectorize(write_photo(input.path()), &config(&server)).await.unwrap_err();

    assert!(matches!(err, Photo2VectorError::Timeout { attempts: 5, .. }), "{err:?}");
}

#[tokio::test]
async fn upload_target_error_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get-emd-upload-url"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let studio = Studio::new(config(&server)).unwrap();
    let session = Session::new();
    let file = LocalImage::new("me.jpg", "image/jpeg", vec![1, 2, 3]).unwrap();

    let err = studio.select_file(&session, file).await.unwrap_err();

    match &err {
        Photo2VectorError::Network { stage, .. } => assert_eq!(*stage, ApiStage::UploadTarget),
        other => panic!("expected Network, got {other:?}"),
    }
    assert!(err.to_string().starts_with("Failed to get signed URL"), "{err}");
    assert!(matches!(studio.status().state(), UiState::Error(_)));
}

#[tokio::test]
async fn submit_error_leaves_session_usable() {
    let server = MockServer::start().await;
    mount_upload(&server).await;
    Mock::given(method("POST"))
        .and(path("/image-gen"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let studio = Studio::new(config(&server)).unwrap();
    let session = Session::new();
    let file = LocalImage::new("me.png", "image/png", png_bytes(2, 2)).unwrap();
    assert!(matches!(
        studio.select_file(&session, file).await.unwrap(),
        UploadOutcome::Applied(_)
    ));

    let err = studio.generate(&session).await.unwrap_err();

    assert!(matches!(err, Photo2VectorError::Network { stage: ApiStage::Submit, .. }), "{err:?}");
    assert!(matches!(studio.status().state(), UiState::Error(_)));
    assert!(session.current_asset().is_some());
}

#[tokio::test]
async fn missing_input_file() {
    let err = vectorize("/definitely/not/here.png", &StudioConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Photo2VectorError::FileNotFound { .. }), "{err:?}");
}
