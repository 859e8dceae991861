// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-cluster job tracker: discovery pollers, enrichment workers, and
//! the cleanup/eviction loop that together maintain the in-memory job map.

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use parking_lot::Mutex as SyncMutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use strata_broadcast::{BroadcastEvent, Broadcaster};
use strata_clients::{HdfsHistoryClient, RecentJobClient};
use strata_core::clock::Clock;
use strata_core::id::JobId;
use strata_core::job::{sort_by_finish_time_desc, Job, JobState};
use strata_core::tasks::{sum_times, trim};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::time::interval;

const RUNNING_JOB_WORKERS: usize = 1;
const FINISHED_JOB_WORKERS: usize = 3;
const DISCOVERY_CHANNEL_CAPACITY: usize = 1;
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Tracks one cluster's jobs: a concurrent map plus the background tasks
/// that keep it fresh. Generic over the upstream clients and clock so tests
/// can swap in fakes and a deterministic clock.
pub struct Tracker<C, H, K>
where
    C: RecentJobClient,
    H: HdfsHistoryClient,
    K: Clock,
{
    config: TrackerConfig,
    job_client: C,
    history_client: H,
    clock: K,
    broadcaster: Broadcaster,
    jobs: Arc<SyncMutex<HashMap<JobId, Job>>>,
    running_tx: mpsc::Sender<Job>,
    running_rx: Arc<AsyncMutex<mpsc::Receiver<Job>>>,
    finished_tx: mpsc::Sender<Job>,
    finished_rx: Arc<AsyncMutex<mpsc::Receiver<Job>>>,
}

impl<C, H, K> Tracker<C, H, K>
where
    C: RecentJobClient,
    H: HdfsHistoryClient,
    K: Clock,
{
    pub fn new(config: TrackerConfig, job_client: C, history_client: H, clock: K, broadcaster: Broadcaster) -> Arc<Self> {
        let (running_tx, running_rx) = mpsc::channel(DISCOVERY_CHANNEL_CAPACITY);
        let (finished_tx, finished_rx) = mpsc::channel(DISCOVERY_CHANNEL_CAPACITY);

        Arc::new(Self {
            config,
            job_client,
            history_client,
            clock,
            broadcaster,
            jobs: Arc::new(SyncMutex::new(HashMap::new())),
            running_tx,
            running_rx: Arc::new(AsyncMutex::new(running_rx)),
            finished_tx,
            finished_rx: Arc::new(AsyncMutex::new(finished_rx)),
        })
    }

    pub fn cluster_name(&self) -> &str {
        &self.config.cluster_name
    }

    /// Spawn every supervisor task. Fire-and-forget: the returned tasks run
    /// for the life of the process.
    pub fn spawn(self: &Arc<Self>) {
        for _ in 0..RUNNING_JOB_WORKERS {
            tokio::spawn(Arc::clone(self).running_job_worker());
        }
        for _ in 0..FINISHED_JOB_WORKERS {
            tokio::spawn(Arc::clone(self).finished_job_worker());
        }
        tokio::spawn(Arc::clone(self).running_job_poll_loop());
        tokio::spawn(Arc::clone(self).finished_job_poll_loop());
        tokio::spawn(Arc::clone(self).backfill_task());
        tokio::spawn(Arc::clone(self).cleanup_loop());
    }

    async fn running_job_worker(self: Arc<Self>) {
        loop {
            let job = { self.running_rx.lock().await.recv().await };
            let Some(mut job) = job else { break };
            let id = job.details.id.clone();

            if let Err(e) = self.update_job(&mut job).await {
                tracing::warn!(id, error = %e, "error updating job");
                // A brand-new job won't yet have details the RM can answer for,
                // so this is expected right after discovery. Only skip the
                // save if we already have richer data for this id.
                if self.has_job(&id) {
                    continue;
                }
            }

            self.save_and_publish(job).await;
        }
    }

    async fn finished_job_worker(self: Arc<Self>) {
        loop {
            let job = { self.finished_rx.lock().await.recv().await };
            let Some(mut job) = job else { break };
            let id = job.details.id.clone();

            let cutoff_ms = self.clock.now_ms() - self.config.full_data_duration.as_millis() as i64;
            let full = job.details.finish_time > cutoff_ms;

            if let Err(e) = self.update_from_history_file(&mut job, full).await {
                tracing::warn!(id, error = %e, "error updating from history file");
                continue;
            }

            job.updated_ms = self.clock.now_ms();
            self.save_and_publish(job).await;
        }
    }

    async fn running_job_poll_loop(self: Arc<Self>) {
        let mut ticker = interval(self.config.poll_interval);
        loop {
            ticker.tick().await;
            tracing::info!(cluster = %self.config.cluster_name, "listing running jobs");

            let running = match self.job_client.list_jobs().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(error = %e, "error listing running jobs");
                    continue;
                }
            };
            tracing::info!(count = running.len(), jobs_cached = self.jobs.lock().len(), "running jobs");

            for job in self.reap_disappeared_jobs() {
                self.publish(&job).await;
            }

            for details in running {
                let job = Job {
                    details,
                    running: true,
                    updated_ms: self.clock.now_ms(),
                    ..Default::default()
                };
                if self.running_tx.send(job).await.is_err() {
                    break;
                }
            }
        }
    }

    /// A running job not refreshed in `disappearance_ticks` poll intervals
    /// is assumed to have left the RM without ever reaching the history
    /// server (this happens); mark it `GONE` and forget it.
    fn reap_disappeared_jobs(&self) -> Vec<Job> {
        let threshold_ms = self.config.poll_interval.as_millis() as i64 * i64::from(self.config.disappearance_ticks);
        let now_ms = self.clock.now_ms();

        let mut jobs = self.jobs.lock();
        let disappeared: Vec<JobId> = jobs
            .iter()
            .filter(|(_, job)| job.running && now_ms - job.updated_ms > threshold_ms)
            .map(|(id, _)| id.clone())
            .collect();

        let mut gone = Vec::with_capacity(disappeared.len());
        for id in disappeared {
            if let Some(mut job) = jobs.remove(&id) {
                tracing::info!(%id, cluster = %self.config.cluster_name, "job has not updated in a while, marking gone");
                job.details.state = JobState::Gone;
                gone.push(job);
            }
        }
        gone
    }

    async fn finished_job_poll_loop(self: Arc<Self>) {
        let mut ticker = interval(self.config.poll_interval);
        loop {
            ticker.tick().await;
            let window = std::cmp::max(Duration::from_secs(60), self.config.poll_interval * 2);
            let since_ms = self.clock.now_ms() - window.as_millis() as i64;

            let finished = match self.job_client.list_finished_jobs(since_ms).await {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!(error = %e, "error listing finished jobs");
                    continue;
                }
            };
            tracing::info!(count = finished.len(), "finished jobs");

            for details in finished {
                if let Some(existing) = self.get_job(&details.id) {
                    if existing.details.state == JobState::parse(details.state.as_str()) {
                        continue;
                    }
                }
                let job = Job { details, running: false, ..Default::default() };
                if self.finished_tx.send(job).await.is_err() {
                    break;
                }
            }
        }
    }

    async fn backfill_task(self: Arc<Self>) {
        let since_ms = self.clock.now_ms() - self.config.job_history_duration.as_millis() as i64;

        let mut backfill = loop {
            match self.job_client.list_finished_jobs(since_ms).await {
                Ok(jobs) => break jobs,
                Err(e) => {
                    tracing::warn!(error = %e, "error listing backfill jobs, retrying");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        };

        sort_by_finish_time_desc(&mut backfill);
        let total = backfill.len();
        tracing::info!(total, "jobs to backfill");

        for (i, details) in backfill.into_iter().enumerate() {
            if i > self.config.job_limit {
                break;
            }
            if i % 100 == 0 {
                tracing::info!(i, total, "backfilling jobs");
            }
            let job = Job { details, running: false, ..Default::default() };
            if self.finished_tx.send(job).await.is_err() {
                break;
            }
        }
        tracing::info!("finished backfilling jobs");
    }

    async fn cleanup_loop(self: Arc<Self>) {
        let mut ticker = interval(CLEANUP_INTERVAL);
        loop {
            ticker.tick().await;
            self.run_cleanup_tick();
        }
    }

    fn run_cleanup_tick(&self) {
        let mut jobs = self.jobs.lock();
        let before = jobs.len();

        let mut succeeded: Vec<(JobId, i64)> = jobs
            .iter()
            .filter(|(_, j)| j.details.state == JobState::Succeeded)
            .map(|(id, j)| (id.clone(), j.details.finish_time))
            .collect();

        if succeeded.len() > self.config.job_limit {
            succeeded.sort_by(|a, b| b.1.cmp(&a.1));
            for (id, _) in succeeded.into_iter().skip(self.config.job_limit) {
                jobs.remove(&id);
            }
        }
        tracing::info!(forgotten = before.saturating_sub(jobs.len()), "forgot jobs to stay near the limit");

        let cutoff_ms = self.clock.now_ms() - self.config.full_data_duration.as_millis() as i64;
        let mut dropped = 0usize;
        for job in jobs.values_mut() {
            if job.running || job.partial {
                continue;
            }
            if job.details.finish_time < cutoff_ms {
                *job = job.clone().into_partial();
                dropped += 1;
            }
        }
        tracing::info!(dropped, "dropped full data for older jobs");
    }

    fn has_job(&self, id: &str) -> bool {
        self.jobs.lock().contains_key(&JobId::new(id.to_string()))
    }

    /// Look up a tracked job by either id form.
    pub fn get_job(&self, id: &str) -> Option<Job> {
        self.jobs.lock().get(&JobId::new(id.to_string())).cloned()
    }

    /// All tracked jobs projected to their listing view (no tasks/counters).
    pub fn list_jobs(&self) -> Vec<Job> {
        self.jobs.lock().values().map(Job::listing_view).collect()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().len()
    }

    fn save_job(&self, job: Job) {
        self.jobs.lock().insert(job.job_id(), job);
    }

    async fn save_and_publish(&self, job: Job) {
        self.save_job(job.clone());
        self.publish(&job).await;
    }

    async fn publish(&self, job: &Job) {
        let mut reified = job.clone();
        if let Err(e) = self.reify_job(&mut reified).await {
            tracing::warn!(id = %reified.details.id, error = %e, "error reifying job before publish");
        }
        let event = BroadcastEvent::JobUpdated { job: Box::new(reified) };
        if let Err(e) = self.broadcaster.publish(&event).await {
            tracing::warn!(error = %e, "failed to publish job update");
        }
    }

    /// Decorate a job with cluster-qualified links, re-ingesting full detail
    /// from history on demand if it had been trimmed to a partial record.
    pub async fn reify_job(&self, job: &mut Job) -> Result<(), TrackerError> {
        if !job.running && job.partial {
            self.update_from_history_file(job, true).await?;
        }

        let app_id = JobId::new(job.details.id.clone()).application_form();
        let job_id = job.job_id();
        job.cluster = self.config.cluster_name.clone();
        job.resource_manager_url =
            format!("{}/cluster/app/{}", self.config.public_resource_manager_url, app_id);
        job.job_history_url = format!("{}/jobhistory/job/{}", self.config.public_history_server_url, job_id);
        Ok(())
    }

    /// Look up a job and reify it for an on-demand detail-page view.
    pub async fn fetch_full_job(&self, id: &str) -> Result<Option<Job>, TrackerError> {
        let Some(mut job) = self.get_job(id) else { return Ok(None) };
        self.reify_job(&mut job).await?;
        Ok(Some(job))
    }

    /// Refresh a job's details, tasks, and counters from the live RM/proxy
    /// APIs. Used for running jobs.
    pub async fn update_job(&self, job: &mut Job) -> Result<(), TrackerError> {
        let details = self.job_client.fetch_job_details(&job.details.id).await?;
        job.details = details;

        let conf = self.job_client.fetch_conf(&job.details.id).await?;
        job.conf.update(conf);

        // Upstream submitters sometimes fail to set the job name properly,
        // leaving a "null/" prefix; patch in the app name lifted from conf.
        if job.details.name.contains("null/") && !job.conf.name.is_empty() {
            job.details.name = job.details.name.replacen("null/", &format!("{}/", job.conf.name), 1);
        }

        job.counters = self.job_client.fetch_counters(&job.details.id).await?;

        let (map, reduce) = self.job_client.fetch_tasks(&job.details.id).await?;
        job.details.maps_total_time = sum_times(&map, &self.clock);
        job.details.reduces_total_time = sum_times(&reduce, &self.clock);
        job.tasks.map = trim(&map);
        job.tasks.reduce = trim(&reduce);

        Ok(())
    }

    /// Load a finished job's archived `.jhist`/`_conf.xml` files from HDFS.
    pub async fn update_from_history_file(&self, job: &mut Job, full: bool) -> Result<(), TrackerError> {
        let job_id = job.job_id();
        let (conf_path, hist_path) = self
            .history_client
            .find_history_and_conf_files(job_id.as_str(), job.details.finish_time)
            .await?;

        let hist_bytes = self.history_client.open(&hist_path).await?;
        strata_parsers::parse_jhist(std::io::BufReader::new(hist_bytes.as_slice()), job, full, &self.clock)?;

        let conf_bytes = self.history_client.open(&conf_path).await?;
        let conf = strata_parsers::parse_conf_xml(std::io::BufReader::new(conf_bytes.as_slice()))?;
        job.conf.update(conf);

        if full {
            job.partial = false;
        }
        Ok(())
    }

    /// Ask the resource manager to kill a running job, then patch the
    /// in-memory record: the RM doesn't route kills through the history
    /// server, so the tracker must move running counts to killed itself and
    /// close any open task pairs.
    pub async fn kill_job(&self, id: &str, user: &str) -> Result<bool, TrackerError> {
        let accepted = self.job_client.kill(id, user).await?;
        if !accepted {
            return Ok(false);
        }

        let kill_time_ms = self.clock.now_ms();
        let job_id = JobId::new(id.to_string());

        let updated = {
            let mut jobs = self.jobs.lock();
            let Some(job) = jobs.get_mut(&job_id) else {
                return Ok(true);
            };

            job.details.state = JobState::Killed;
            job.details.finish_time = kill_time_ms;
            job.details.maps_killed += job.details.maps_running;
            job.details.maps_running = 0;
            job.details.reduces_killed += job.details.reduces_running;
            job.details.reduces_running = 0;

            for task in job.tasks.map.iter_mut() {
                if task[1] == 0 {
                    task[1] = kill_time_ms;
                }
            }
            for task in job.tasks.reduce.iter_mut() {
                if task[1] == 0 {
                    task[1] = kill_time_ms;
                }
            }
            job.clone()
        };

        self.publish(&updated).await;
        Ok(true)
    }
}
