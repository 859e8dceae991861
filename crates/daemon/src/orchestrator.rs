// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires flag-parsed configuration into the shared, process-wide state the
//! HTTP handlers read from: one tracker per cluster, a single broadcaster,
//! and a single persisted-job archive client.

use crate::cli::Cli;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use strata_archive::{ArchiveError, NullPersistedJobClient, PersistedJobClient, S3PersistedJobClient};
use strata_clients::{HdfsHistoryClient, HttpRecentJobClient, RecentJobClient, WebHdfsHistoryClient};
use strata_core::clock::{Clock, SystemClock};
use strata_core::job::Job;
use strata_tracker::{Tracker, TrackerConfig};

/// The client triple a production daemon runs with. Tests build
/// [`AppState`] directly against the fakes instead.
pub type AppTracker = Tracker<HttpRecentJobClient, WebHdfsHistoryClient, SystemClock>;

/// Either flavor of [`PersistedJobClient`] the daemon may be configured
/// with, collapsed behind one concrete type since the trait's `Clone`
/// supertrait rules out a trait object.
#[derive(Clone)]
pub enum AnyPersistedJobClient {
    S3(S3PersistedJobClient),
    Null(NullPersistedJobClient),
}

#[async_trait]
impl PersistedJobClient for AnyPersistedJobClient {
    async fn fetch_job(&self, id: &str) -> Result<Job, ArchiveError> {
        match self {
            Self::S3(c) => c.fetch_job(id).await,
            Self::Null(c) => c.fetch_job(id).await,
        }
    }

    async fn fetch_flow_job_ids(&self, flow_id: &str) -> Result<Vec<String>, ArchiveError> {
        match self {
            Self::S3(c) => c.fetch_flow_job_ids(flow_id).await,
            Self::Null(c) => c.fetch_flow_job_ids(flow_id).await,
        }
    }
}

/// Process-wide state shared by every HTTP handler. Generic over the
/// per-cluster client triple and the archive client so tests can substitute
/// the fakes from `strata-clients`/`strata-archive` for a real RM/HS/S3
/// stack.
pub struct AppState<C = HttpRecentJobClient, H = WebHdfsHistoryClient, K = SystemClock, P = AnyPersistedJobClient>
where
    C: RecentJobClient,
    H: HdfsHistoryClient,
    K: Clock,
    P: PersistedJobClient,
{
    pub trackers: Vec<Arc<Tracker<C, H, K>>>,
    pub persisted: P,
    pub broadcaster: strata_broadcast::Broadcaster,
}

impl<C, H, K, P> AppState<C, H, K, P>
where
    C: RecentJobClient,
    H: HdfsHistoryClient,
    K: Clock,
    P: PersistedJobClient,
{
    /// Search every tracker for a running or recently-finished job, fully
    /// reified (decorated URLs, on-demand history re-ingestion).
    pub async fn find_job(&self, job_id: &str) -> anyhow::Result<Option<Job>> {
        for tracker in &self.trackers {
            if let Some(job) = tracker.fetch_full_job(job_id).await? {
                return Ok(Some(job));
            }
        }
        Ok(None)
    }

    /// Find the tracker owning a job, if any, without reifying it.
    pub fn owning_tracker(&self, job_id: &str) -> Option<Arc<Tracker<C, H, K>>> {
        self.trackers.iter().find(|t| t.get_job(job_id).is_some()).cloned()
    }

    /// Every tracked job across every cluster, projected to its listing view
    /// and labeled with the cluster that owns it.
    pub fn list_jobs(&self) -> Vec<Job> {
        self.trackers
            .iter()
            .flat_map(|t| {
                let cluster = t.cluster_name().to_string();
                t.list_jobs().into_iter().map(move |mut job| {
                    job.cluster = cluster.clone();
                    job
                })
            })
            .collect()
    }
}

/// Build every per-cluster tracker, start its background tasks, and
/// assemble the shared [`AppState`].
pub async fn build(cli: &Cli) -> Result<Arc<AppState>> {
    let clusters = cli.clusters()?;
    let (broadcaster, broadcast_loop) = strata_broadcast::Broadcaster::new();
    tokio::spawn(broadcast_loop.run());

    let mut trackers = Vec::with_capacity(clusters.len());
    for cluster in &clusters {
        let job_client = HttpRecentJobClient::new(
            cluster.resource_manager_url.clone(),
            cluster.history_server_url.clone(),
            cluster.proxy_server_url.clone(),
            cluster.namenode_address.clone(),
            cli.http_timeout,
        )?;
        let history_client =
            WebHdfsHistoryClient::new(cluster.namenode_address.clone(), cli.yarn_history_dir.clone(), cli.http_timeout)?;

        if let Err(e) = history_client.check_dir(&cli.yarn_logs_dir).await {
            tracing::warn!(
                cluster = %cluster.cluster_name,
                dir = %cli.yarn_logs_dir,
                error = %e,
                "could not read yarn logs directory; change it with --yarn-logs-dir, \
                 and make sure the namenode/datanodes are reachable",
            );
        }

        let config = TrackerConfig::new(
            cluster.cluster_name.clone(),
            cluster.resource_manager_url.clone(),
            cluster.history_server_url.clone(),
            cli.poll_interval,
        );

        let tracker = Tracker::new(config, job_client, history_client, SystemClock, broadcaster.clone());
        tracker.spawn();
        trackers.push(tracker);
    }

    let persisted = if cli.s3_bucket.is_empty() {
        tracing::warn!("no --s3-bucket given; archive fallback for cold jobs is disabled");
        AnyPersistedJobClient::Null(NullPersistedJobClient)
    } else {
        let client =
            S3PersistedJobClient::new(cli.s3_bucket.clone(), cli.s3_jobs_prefix.clone(), cli.s3_flow_prefix.clone())
                .await;
        AnyPersistedJobClient::S3(client)
    };

    if cli.pprof {
        tracing::warn!("--pprof was set but this build has no profiling endpoint wired up");
    }

    Ok(Arc::new(AppState { trackers, persisted, broadcaster }))
}
