// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The public HTTP surface: job listing/detail/kill endpoints plus the SSE
//! update stream. Grounded on a conventional `axum` + `tower-http` server
//! layout — the teacher ships no HTTP server of its own.
//!
//! Every handler is generic over the tracker's client triple and the
//! archive client so tests can build a router against the fakes from
//! `strata-clients`/`strata-archive` instead of a real RM/HS/S3 stack.

use crate::orchestrator::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use strata_archive::PersistedJobClient;
use strata_clients::{HdfsHistoryClient, RecentJobClient};
use strata_core::clock::Clock;
use strata_core::job::Job;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router<C, H, K, P>(state: Arc<AppState<C, H, K, P>>) -> Router
where
    C: RecentJobClient,
    H: HdfsHistoryClient,
    K: Clock,
    P: PersistedJobClient,
{
    Router::new()
        .route("/jobs/", get(list_jobs::<C, H, K, P>))
        .route("/jobs/:id", get(get_job::<C, H, K, P>))
        .route("/jobs/:id/conf", get(get_job_conf::<C, H, K, P>))
        .route("/jobs/:id/kill", post(kill_job::<C, H, K, P>))
        .route("/jobIds/:flow_id", get(job_ids_for_flow::<C, H, K, P>))
        .route("/numClusters/", get(num_clusters::<C, H, K, P>))
        .route("/sse", get(sse_handler::<C, H, K, P>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn list_jobs<C, H, K, P>(State(state): State<Arc<AppState<C, H, K, P>>>) -> Json<Vec<Job>>
where
    C: RecentJobClient,
    H: HdfsHistoryClient,
    K: Clock,
    P: PersistedJobClient,
{
    Json(state.list_jobs())
}

async fn get_job<C, H, K, P>(State(state): State<Arc<AppState<C, H, K, P>>>, Path(id): Path<String>) -> Response
where
    C: RecentJobClient,
    H: HdfsHistoryClient,
    K: Clock,
    P: PersistedJobClient,
{
    match find_job_anywhere(&state, &id).await {
        Ok(Some(job)) => Json(job).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(id, error = %e, "error fetching job");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_job_conf<C, H, K, P>(State(state): State<Arc<AppState<C, H, K, P>>>, Path(id): Path<String>) -> Response
where
    C: RecentJobClient,
    H: HdfsHistoryClient,
    K: Clock,
    P: PersistedJobClient,
{
    match find_job_anywhere(&state, &id).await {
        Ok(Some(job)) => Json(serde_json::json!({
            "conf": job.conf.flags,
            "id": job.details.id,
            "name": job.details.name,
        }))
        .into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!(id, error = %e, "error fetching job conf");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Check every tracker's in-memory map first, falling back to the long-term
/// archive: an in-memory hit never touches the archive client.
async fn find_job_anywhere<C, H, K, P>(state: &AppState<C, H, K, P>, id: &str) -> anyhow::Result<Option<Job>>
where
    C: RecentJobClient,
    H: HdfsHistoryClient,
    K: Clock,
    P: PersistedJobClient,
{
    if let Some(job) = state.find_job(id).await? {
        return Ok(Some(job));
    }
    match state.persisted.fetch_job(id).await {
        Ok(job) => Ok(Some(job)),
        Err(_) => Ok(None),
    }
}

#[derive(Debug, Deserialize)]
struct KillParams {
    #[serde(default = "default_user")]
    user: String,
}

fn default_user() -> String {
    "anonymous".to_string()
}

async fn kill_job<C, H, K, P>(
    State(state): State<Arc<AppState<C, H, K, P>>>,
    Path(id): Path<String>,
    Query(params): Query<KillParams>,
) -> Response
where
    C: RecentJobClient,
    H: HdfsHistoryClient,
    K: Clock,
    P: PersistedJobClient,
{
    let Some(tracker) = state.owning_tracker(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match tracker.kill_job(&id, &params.user).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => StatusCode::BAD_GATEWAY.into_response(),
        Err(e) => {
            tracing::error!(id, error = %e, "error killing job");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn job_ids_for_flow<C, H, K, P>(
    State(state): State<Arc<AppState<C, H, K, P>>>,
    Path(flow_id): Path<String>,
) -> Response
where
    C: RecentJobClient,
    H: HdfsHistoryClient,
    K: Clock,
    P: PersistedJobClient,
{
    match state.persisted.fetch_flow_job_ids(&flow_id).await {
        Ok(ids) => Json(ids).into_response(),
        Err(e) => {
            tracing::error!(flow_id, error = %e, "error listing flow job ids");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn num_clusters<C, H, K, P>(State(state): State<Arc<AppState<C, H, K, P>>>) -> Json<usize>
where
    C: RecentJobClient,
    H: HdfsHistoryClient,
    K: Clock,
    P: PersistedJobClient,
{
    Json(state.trackers.len())
}

async fn sse_handler<C, H, K, P>(
    State(state): State<Arc<AppState<C, H, K, P>>>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, Response>
where
    C: RecentJobClient,
    H: HdfsHistoryClient,
    K: Clock,
    P: PersistedJobClient,
{
    let rx = state
        .broadcaster
        .subscribe()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response())?;

    let stream = tokio_stream::wrappers::ReceiverStream::new(rx)
        .map(|bytes| Ok(Event::default().data(String::from_utf8_lossy(&bytes).into_owned())));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
