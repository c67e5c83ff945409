use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use tube_downloader::{
    common::client::client::TubeClient,
    downloader::{
        ChunkedDownloader, DownloadError, DownloadOutcome, DownloadTask, OverwritePolicy,
    },
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

async fn serve(route: &str, body: Vec<u8>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;
    server
}

fn downloader() -> ChunkedDownloader {
    ChunkedDownloader::new(Arc::new(TubeClient::new().unwrap()))
}

#[tokio::test]
async fn test_download_reports_every_chunk() {
    let body = sample(5000);
    let server = serve("/video.mp4", body.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("nested/video.mp4");

    let task = DownloadTask::new(format!("{}/video.mp4", server.uri()), &output);
    let calls = Mutex::new(Vec::new());
    let outcome = downloader()
        .run_download(
            &task,
            |downloaded, total| calls.lock().unwrap().push((downloaded, total)),
            || false,
        )
        .await
        .unwrap();

    assert_eq!(outcome, DownloadOutcome::Completed { bytes: 5000 });
    assert_eq!(std::fs::read(&output).unwrap(), body);

    let calls = calls.into_inner().unwrap();
    let progress: Vec<u64> = calls.iter().map(|(downloaded, _)| *downloaded).collect();
    assert_eq!(progress, vec![1024, 2048, 3072, 4096, 5000]);
    assert!(calls.iter().all(|(_, total)| *total == Some(5000)));
}

#[tokio::test]
async fn test_pause_keeps_downloaded_prefix() {
    let body = sample(8192);
    let server = serve("/video.mp4", body.clone()).await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("video.mp4");

    let written = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&written);
    let task = DownloadTask::new(format!("{}/video.mp4", server.uri()), &output);
    let outcome = downloader()
        .run_download(
            &task,
            move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            || written.load(Ordering::SeqCst) >= 2,
        )
        .await
        .unwrap();

    assert_eq!(outcome, DownloadOutcome::PausedIncomplete { bytes: 2048 });
    assert_eq!(std::fs::read(&output).unwrap(), body[..2048].to_vec());
}

#[tokio::test]
async fn test_missing_resource_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let task = DownloadTask::new(format!("{}/gone.mp4", server.uri()), dir.path().join("gone.mp4"));
    let result = downloader().run_download(&task, |_, _| {}, || false).await;

    assert!(matches!(result, Err(DownloadError::Transport(_))));
}

#[tokio::test]
async fn test_expired_link_keeps_completed_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("done.mp4");
    std::fs::write(&output, sample(4096)).unwrap();

    let task = DownloadTask::new(format!("{}/done.mp4", server.uri()), &output);
    let result = downloader().run_download(&task, |_, _| {}, || false).await;

    assert!(matches!(result, Err(DownloadError::Transport(_))));
    assert_eq!(std::fs::read(&output).unwrap(), sample(4096));
}

#[tokio::test]
async fn test_reject_retry_after_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(sample(2000)))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("new.mp4");

    let task = DownloadTask::new(format!("{}/new.mp4", server.uri()), &output)
        .with_overwrite(OverwritePolicy::Reject);
    let first = downloader().run_download(&task, |_, _| {}, || false).await;
    assert!(matches!(first, Err(DownloadError::Transport(_))));
    assert!(!output.exists());

    let second = downloader()
        .run_download(&task, |_, _| {}, || false)
        .await
        .unwrap();
    assert_eq!(second, DownloadOutcome::Completed { bytes: 2000 });
    assert_eq!(std::fs::read(&output).unwrap(), sample(2000));
}
