// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client over the YARN ResourceManager, JobHistory server, and MapReduce
//! application-master proxy: everything needed to discover and enrich
//! in-flight and freshly-finished jobs.

use crate::error::ClientError;
use crate::wire::{self, AppsResp, ConfResp, CountersResp, JobsResp, TasksResp};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use strata_core::job::{Counter, JobDetails};
use strata_core::tasks::TaskPair;

/// Everything needed to discover and enrich jobs across an RM/HS/proxy
/// triple. Implementations must be cheap to clone: a single instance is
/// shared across the poller and every enrichment worker.
#[async_trait]
pub trait RecentJobClient: Clone + Send + Sync + 'static {
    async fn list_jobs(&self) -> Result<Vec<JobDetails>, ClientError>;
    async fn list_finished_jobs(&self, since_ms: i64) -> Result<Vec<JobDetails>, ClientError>;
    async fn fetch_job_details(&self, id: &str) -> Result<JobDetails, ClientError>;
    async fn fetch_tasks(&self, id: &str) -> Result<(Vec<TaskPair>, Vec<TaskPair>), ClientError>;
    async fn fetch_counters(&self, id: &str) -> Result<Vec<Counter>, ClientError>;
    async fn fetch_conf(&self, id: &str) -> Result<HashMap<String, String>, ClientError>;
    fn namenode_address(&self) -> &str;

    /// Request the resource manager kill a running application. Returns
    /// `true` when the RM accepted the request (HTTP 202); the RM doesn't
    /// propagate killed jobs to the history server through this API, so
    /// callers must patch their own in-memory state.
    async fn kill(&self, id: &str, user: &str) -> Result<bool, ClientError>;
}

static REDIRECT_MESSAGE: &str =
    r"This is standby RM\. Redirecting to the current active RM: (https?://[^/]*)";

/// Real `RecentJobClient` backed by `reqwest`.
///
/// Redirects are never followed: a RUNNING job's proxy redirects to an HTML
/// page once it reaches ACCEPTED, and a finished job's RM entry redirects to
/// the history server over an address this process may not be able to
/// reach. Instead, an unfollowed redirect body is inspected for the standby
/// RM's "redirecting to the active RM" message and used to self-heal the
/// resource manager host under a lock, since the host is shared across every
/// task polling this cluster.
#[derive(Clone)]
pub struct HttpRecentJobClient {
    http: Client,
    resource_manager_host: std::sync::Arc<parking_lot::RwLock<String>>,
    job_history_host: String,
    proxy_host: std::sync::Arc<parking_lot::RwLock<String>>,
    namenode_address: String,
    redirect_pattern: regex::Regex,
}

impl HttpRecentJobClient {
    // REDIRECT_MESSAGE is a fixed pattern compiled once per client; a failure
    // here would mean the constant itself is malformed, not anything caller
    // supplied.
    #[allow(clippy::expect_used)]
    pub fn new(
        resource_manager_host: impl Into<String>,
        job_history_host: impl Into<String>,
        proxy_host: impl Into<String>,
        namenode_address: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .connection_verbose(false)
            .build()
            .map_err(|source| ClientError::Transport {
                url: "<client construction>".to_string(),
                source,
            })?;

        Ok(Self {
            http,
            resource_manager_host: std::sync::Arc::new(parking_lot::RwLock::new(
                resource_manager_host.into(),
            )),
            job_history_host: job_history_host.into(),
            proxy_host: std::sync::Arc::new(parking_lot::RwLock::new(proxy_host.into())),
            namenode_address: namenode_address.into(),
            redirect_pattern: regex::Regex::new(REDIRECT_MESSAGE)
                .expect("redirect pattern is a fixed valid regex"),
        })
    }

    async fn get_json_text(&self, url: &str) -> Result<String, ClientError> {
        let resp = self
            .http
            .get(url)
            .header("Connection", "close")
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.to_string(), source })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|source| ClientError::Transport { url: url.to_string(), source })?;

        if !status.is_success() {
            return Err(ClientError::Status { url: url.to_string(), status: status.as_u16() });
        }
        Ok(body)
    }

    fn rebind_if_standby(&self, body: &str, field: &std::sync::Arc<parking_lot::RwLock<String>>) {
        if let Some(captures) = self.redirect_pattern.captures(body) {
            if let Some(new_host) = captures.get(1) {
                let new_host = new_host.as_str().to_string();
                tracing::warn!(new_host, "redirected to active RM, rebinding host");
                *field.write() = new_host;
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        rebind: Option<&std::sync::Arc<parking_lot::RwLock<String>>>,
    ) -> Result<T, ClientError> {
        let body = self.get_json_text(url).await?;
        if let Some(field) = rebind {
            self.rebind_if_standby(&body, field);
        }
        serde_json::from_str(&body).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            body,
            source,
        })
    }
}

#[async_trait]
impl RecentJobClient for HttpRecentJobClient {
    async fn list_jobs(&self) -> Result<Vec<JobDetails>, ClientError> {
        let host = self.resource_manager_host.read().clone();
        let url = format!("{host}/ws/v1/cluster/apps/?states=running,submitted,accepted,new");
        tracing::debug!(url, "listing jobs from RM");
        let resp: AppsResp = self.get_json(&url, Some(&self.resource_manager_host)).await?;
        Ok(resp.apps.app.into_iter().map(Into::into).collect())
    }

    async fn list_finished_jobs(&self, since_ms: i64) -> Result<Vec<JobDetails>, ClientError> {
        let url = format!(
            "{}/ws/v1/history/mapreduce/jobs?finishedTimeBegin={}",
            self.job_history_host, since_ms
        );
        let resp: JobsResp = self.get_json(&url, None).await?;
        Ok(resp.jobs.job.into_iter().map(Into::into).collect())
    }

    async fn fetch_job_details(&self, id: &str) -> Result<JobDetails, ClientError> {
        let app_id = strata_core::id::JobId::new(id.to_string()).application_form();
        let proxy = self.proxy_host.read().clone();
        let url = format!("{proxy}/proxy/{app_id}/ws/v1/mapreduce/jobs");
        let resp: JobsResp = self.get_json(&url, Some(&self.proxy_host)).await?;
        resp.jobs
            .job
            .into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| ClientError::NotFound(id.to_string()))
    }

    async fn fetch_tasks(&self, id: &str) -> Result<(Vec<TaskPair>, Vec<TaskPair>), ClientError> {
        let app_id = strata_core::id::JobId::new(id.to_string()).application_form();
        let proxy = self.proxy_host.read().clone();
        let url = format!("{proxy}/proxy/{app_id}/ws/v1/mapreduce/jobs/{id}/tasks");
        let resp: TasksResp = self.get_json(&url, None).await?;
        Ok(wire::split_tasks(resp))
    }

    async fn fetch_counters(&self, id: &str) -> Result<Vec<Counter>, ClientError> {
        let app_id = strata_core::id::JobId::new(id.to_string()).application_form();
        let proxy = self.proxy_host.read().clone();
        let url = format!("{proxy}/proxy/{app_id}/ws/v1/mapreduce/jobs/{id}/counters");
        let resp: CountersResp = self.get_json(&url, None).await?;
        Ok(wire::flatten_counters(resp))
    }

    async fn fetch_conf(&self, id: &str) -> Result<HashMap<String, String>, ClientError> {
        let app_id = strata_core::id::JobId::new(id.to_string()).application_form();
        let host = self.resource_manager_host.read().clone();
        let url = format!("{host}/proxy/{app_id}/ws/v1/mapreduce/jobs/{id}/conf");
        let resp: ConfResp = self.get_json(&url, None).await?;
        Ok(resp
            .conf
            .property
            .into_iter()
            .map(|p| (p.name, p.value))
            .collect())
    }

    fn namenode_address(&self) -> &str {
        &self.namenode_address
    }

    async fn kill(&self, id: &str, user: &str) -> Result<bool, ClientError> {
        let host = self.resource_manager_host.read().clone();
        let url = format!("{host}/ws/v1/cluster/apps/{id}/state?user.name={user}");
        tracing::info!(id, user, "killing job");

        let resp = self
            .http
            .put(&url)
            .header("Content-Type", "application/json")
            .body(r#"{"state":"KILLED"}"#)
            .send()
            .await
            .map_err(|source| ClientError::Transport { url: url.clone(), source })?;

        Ok(resp.status().as_u16() == 202)
    }
}

/// Fake `RecentJobClient` for tests: returns canned responses and records
/// every call made against it.
#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Clone, Default)]
    pub struct FakeJobFixture {
        pub running: Vec<JobDetails>,
        pub finished: Vec<JobDetails>,
        pub details: HashMap<String, JobDetails>,
        pub tasks: HashMap<String, (Vec<TaskPair>, Vec<TaskPair>)>,
        pub counters: HashMap<String, Vec<Counter>>,
        pub confs: HashMap<String, HashMap<String, String>>,
        pub kill_accepted: bool,
        pub kill_calls: Vec<(String, String)>,
    }

    #[derive(Clone, Default)]
    pub struct FakeRecentJobClient {
        inner: Arc<parking_lot::Mutex<FakeJobFixture>>,
        namenode_address: String,
    }

    impl FakeRecentJobClient {
        pub fn new(fixture: FakeJobFixture) -> Self {
            Self {
                inner: Arc::new(parking_lot::Mutex::new(fixture)),
                namenode_address: "namenode:8020".to_string(),
            }
        }

        pub fn set_running(&self, jobs: Vec<JobDetails>) {
            self.inner.lock().running = jobs;
        }

        pub fn set_finished(&self, jobs: Vec<JobDetails>) {
            self.inner.lock().finished = jobs;
        }
    }

    #[async_trait]
    impl RecentJobClient for FakeRecentJobClient {
        async fn list_jobs(&self) -> Result<Vec<JobDetails>, ClientError> {
            Ok(self.inner.lock().running.clone())
        }

        async fn list_finished_jobs(&self, _since_ms: i64) -> Result<Vec<JobDetails>, ClientError> {
            Ok(self.inner.lock().finished.clone())
        }

        async fn fetch_job_details(&self, id: &str) -> Result<JobDetails, ClientError> {
            self.inner
                .lock()
                .details
                .get(id)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(id.to_string()))
        }

        async fn fetch_tasks(
            &self,
            id: &str,
        ) -> Result<(Vec<TaskPair>, Vec<TaskPair>), ClientError> {
            Ok(self.inner.lock().tasks.get(id).cloned().unwrap_or_default())
        }

        async fn fetch_counters(&self, id: &str) -> Result<Vec<Counter>, ClientError> {
            Ok(self.inner.lock().counters.get(id).cloned().unwrap_or_default())
        }

        async fn fetch_conf(&self, id: &str) -> Result<HashMap<String, String>, ClientError> {
            Ok(self.inner.lock().confs.get(id).cloned().unwrap_or_default())
        }

        fn namenode_address(&self) -> &str {
            &self.namenode_address
        }

        async fn kill(&self, id: &str, user: &str) -> Result<bool, ClientError> {
            let mut fixture = self.inner.lock();
            fixture.kill_calls.push((id.to_string(), user.to_string()));
            Ok(fixture.kill_accepted)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeJobFixture, FakeRecentJobClient};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_pattern_extracts_active_rm_host() {
        let re = regex::Regex::new(REDIRECT_MESSAGE).unwrap();
        let body = "This is standby RM. Redirecting to the current active RM: http://rm2.example.com:8088";
        let caps = re.captures(body).expect("pattern should match");
        assert_eq!(&caps[1], "http://rm2.example.com:8088");
    }

    #[tokio::test]
    async fn fake_client_returns_fixtures() {
        use fake::{FakeJobFixture, FakeRecentJobClient};

        let mut fixture = FakeJobFixture::default();
        fixture.running.push(JobDetails {
            id: "job_1_1".to_string(),
            ..Default::default()
        });
        let client = FakeRecentJobClient::new(fixture);

        let jobs = client.list_jobs().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "job_1_1");

        let err = client.fetch_job_details("job_missing").await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }
}
