//! HTTP-surface tests driven through the router with Axum's in-process
//! dispatch, against fake upstream clients instead of a real RM/HS/S3 stack.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use strata_archive::FakePersistedJobClient;
use strata_clients::{FakeHdfsHistoryClient, FakeJobFixture, FakeRecentJobClient};
use strata_core::clock::SystemClock;
use strata_core::job::{Job, JobDetails, JobState};
use strata_daemon::http::build_router;
use strata_daemon::orchestrator::AppState;
use strata_tracker::{Tracker, TrackerConfig};
use tower::ServiceExt;

fn job_details(id: &str, state: JobState) -> JobDetails {
    JobDetails { id: id.to_string(), name: format!("{id} name"), user: "alice".to_string(), state, ..Default::default() }
}

async fn build_state(
    fixture: FakeJobFixture,
    persisted: FakePersistedJobClient,
) -> Arc<AppState<FakeRecentJobClient, FakeHdfsHistoryClient, SystemClock, FakePersistedJobClient>> {
    let (broadcaster, broadcast_loop) = strata_broadcast::Broadcaster::new();
    tokio::spawn(broadcast_loop.run());

    let job_client = FakeRecentJobClient::new(fixture);
    let history_client = FakeHdfsHistoryClient::new();
    let config = TrackerConfig::new("test-cluster", "http://rm.example.com", "http://hs.example.com", Duration::from_millis(10));
    let tracker = Tracker::new(config, job_client, history_client, SystemClock, broadcaster.clone());
    tracker.spawn();

    // Give the poll loop a couple of ticks to discover whatever's running.
    tokio::time::sleep(Duration::from_millis(80)).await;

    Arc::new(AppState { trackers: vec![tracker], persisted, broadcaster })
}

async fn get(router: axum::Router, path: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(path).body(Body::empty()).expect("valid request");
    let resp = router.oneshot(req).await.expect("router handles request");
    let status = resp.status();
    let body = resp.into_body().collect().await.expect("collect body").to_bytes();
    (status, String::from_utf8(body.to_vec()).expect("utf-8"))
}

#[tokio::test]
async fn in_memory_hit_never_touches_the_archive() {
    let fixture = FakeJobFixture { running: vec![job_details("job_A", JobState::Running)], ..Default::default() };
    let state = build_state(fixture, FakePersistedJobClient::new()).await;
    let router = build_router(state);

    let (status, body) = get(router, "/jobs/job_A").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"id\":\"job_A\""), "body was: {body}");
}

#[tokio::test]
async fn miss_everywhere_is_a_404() {
    let state = build_state(FakeJobFixture::default(), FakePersistedJobClient::new()).await;
    let router = build_router(state);

    let (status, _) = get(router, "/jobs/job_X").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn archive_fallback_serves_cold_jobs() {
    let persisted = FakePersistedJobClient::new();
    let mut cold = Job::default();
    cold.details.id = "job_X".to_string();
    cold.details.name = "cold job".to_string();
    persisted.insert_job("job_X", cold);

    let state = build_state(FakeJobFixture::default(), persisted).await;
    let router = build_router(state);

    let (status, body) = get(router, "/jobs/job_X").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"id\":\"job_X\""), "body was: {body}");
}

#[tokio::test]
async fn listing_labels_every_job_with_its_cluster() {
    let fixture = FakeJobFixture { running: vec![job_details("job_A", JobState::Running)], ..Default::default() };
    let state = build_state(fixture, FakePersistedJobClient::new()).await;
    let router = build_router(state);

    let (status, body) = get(router, "/jobs/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"cluster\":\"test-cluster\""), "body was: {body}");
}

#[tokio::test]
async fn num_clusters_reports_the_tracker_count() {
    let state = build_state(FakeJobFixture::default(), FakePersistedJobClient::new()).await;
    let router = build_router(state);

    let (status, body) = get(router, "/numClusters/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "1");
}

#[tokio::test]
async fn kill_on_unknown_job_is_a_404() {
    let state = build_state(FakeJobFixture::default(), FakePersistedJobClient::new()).await;
    let router = build_router(state);

    let req = Request::builder()
        .method("POST")
        .uri("/jobs/job_missing/kill")
        .body(Body::empty())
        .expect("valid request");
    let resp = router.oneshot(req).await.expect("router handles request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
