// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for locating and reading a finished job's archived `.jhist` and
//! `_conf.xml` files out of HDFS.
//!
//! The corpus this workspace was built from has no native HDFS RPC crate
//! available, so the real implementation speaks WebHDFS's REST surface
//! (`LISTSTATUS`/`OPEN`) over the same `reqwest` stack the recent-job client
//! already depends on, rather than adding a second HTTP client crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HdfsError {
    #[error("transport error calling {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("webhdfs returned status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("could not decode webhdfs response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no matching jhist/conf files found at {0}")]
    NotFound(String),
}

/// Locates and opens the history and conf files for a finished job.
#[async_trait]
pub trait HdfsHistoryClient: Clone + Send + Sync + 'static {
    /// Returns `(conf_file_path, hist_file_path)`.
    async fn find_history_and_conf_files(
        &self,
        job_id: &str,
        finish_time_ms: i64,
    ) -> Result<(String, String), HdfsError>;

    async fn open(&self, path: &str) -> Result<Vec<u8>, HdfsError>;

    /// Probe that a directory exists and is listable, without caring about
    /// its contents. Used at startup to check the configured YARN logs
    /// directory is reachable.
    async fn check_dir(&self, dir: &str) -> Result<(), HdfsError>;
}

/// Build the directory WebHDFS stores a job's finished history under:
/// `{yarn_history_dir}/{year}/{month}/{day}/{serial/1000}`, where `serial` is
/// the numeric suffix of the job id.
pub fn history_dir(yarn_history_dir: &str, job_id: &str, finish_time_ms: i64) -> String {
    let serial: i64 = job_id
        .rsplit('_')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let t = DateTime::<Utc>::from_timestamp_millis(finish_time_ms).unwrap_or_else(|| Utc::now());
    format!(
        "{}/{:04}/{:02}/{:02}/{:06}",
        yarn_history_dir,
        t.format("%Y"),
        t.format("%m"),
        t.format("%d"),
        serial / 1000
    )
}

#[derive(Debug, Deserialize)]
struct ListStatusResp {
    #[serde(rename = "FileStatuses")]
    file_statuses: FileStatuses,
}

#[derive(Debug, Deserialize)]
struct FileStatuses {
    #[serde(rename = "FileStatus", default)]
    file_status: Vec<FileStatus>,
}

#[derive(Debug, Deserialize)]
struct FileStatus {
    #[serde(rename = "pathSuffix")]
    path_suffix: String,
}

#[derive(Clone)]
pub struct WebHdfsHistoryClient {
    http: Client,
    namenode_address: String,
    yarn_history_dir: String,
}

impl WebHdfsHistoryClient {
    pub fn new(
        namenode_address: impl Into<String>,
        yarn_history_dir: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, HdfsError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| HdfsError::Transport {
                url: "<client construction>".to_string(),
                source,
            })?;
        Ok(Self { http, namenode_address: namenode_address.into(), yarn_history_dir: yarn_history_dir.into() })
    }

    fn base_url(&self) -> String {
        format!("http://{}/webhdfs/v1", self.namenode_address)
    }
}

#[async_trait]
impl HdfsHistoryClient for WebHdfsHistoryClient {
    async fn find_history_and_conf_files(
        &self,
        job_id: &str,
        finish_time_ms: i64,
    ) -> Result<(String, String), HdfsError> {
        let dir = history_dir(&self.yarn_history_dir, job_id, finish_time_ms);
        let url = format!("{}{}?op=LISTSTATUS", self.base_url(), dir);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| HdfsError::Transport { url: url.clone(), source })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|source| HdfsError::Transport { url: url.clone(), source })?;
        if !status.is_success() {
            return Err(HdfsError::Status { url, status: status.as_u16() });
        }
        let parsed: ListStatusResp = serde_json::from_str(&body)
            .map_err(|source| HdfsError::Decode { url: url.clone(), source })?;

        let mut conf_file = None;
        let mut hist_file = None;
        for file in parsed.file_statuses.file_status {
            if !file.path_suffix.starts_with(job_id) {
                continue;
            }
            let full = format!("{dir}/{}", file.path_suffix);
            if full.ends_with("conf.xml") {
                conf_file = Some(full);
            } else if full.ends_with(".jhist") {
                hist_file = Some(full);
            }
        }

        match (conf_file, hist_file) {
            (Some(c), Some(h)) => Ok((c, h)),
            _ => Err(HdfsError::NotFound(dir)),
        }
    }

    async fn open(&self, path: &str) -> Result<Vec<u8>, HdfsError> {
        let url = format!("{}{}?op=OPEN", self.base_url(), path);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| HdfsError::Transport { url: url.clone(), source })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(HdfsError::Status { url, status: status.as_u16() });
        }
        let bytes = resp.bytes().await.map_err(|source| HdfsError::Transport { url, source })?;
        Ok(bytes.to_vec())
    }

    async fn check_dir(&self, dir: &str) -> Result<(), HdfsError> {
        let url = format!("{}{}?op=LISTSTATUS", self.base_url(), dir);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| HdfsError::Transport { url: url.clone(), source })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(HdfsError::Status { url, status: status.as_u16() });
        }
        Ok(())
    }
}

/// Fake `HdfsHistoryClient` for tests: holds a fixed map of path -> bytes.
#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakeHdfsHistoryClient {
        files: Arc<parking_lot::Mutex<HashMap<String, Vec<u8>>>>,
        locations: Arc<parking_lot::Mutex<HashMap<String, (String, String)>>>,
        dirs: Arc<parking_lot::Mutex<HashMap<String, bool>>>,
    }

    impl FakeHdfsHistoryClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_job(self, job_id: &str, conf_path: &str, conf_bytes: Vec<u8>, hist_path: &str, hist_bytes: Vec<u8>) -> Self {
            self.locations
                .lock()
                .insert(job_id.to_string(), (conf_path.to_string(), hist_path.to_string()));
            self.files.lock().insert(conf_path.to_string(), conf_bytes);
            self.files.lock().insert(hist_path.to_string(), hist_bytes);
            self
        }

        /// Make `check_dir` succeed or fail for a given path. Unregistered
        /// paths fail by default, matching an HDFS path that doesn't exist.
        pub fn with_dir(self, dir: &str, accessible: bool) -> Self {
            self.dirs.lock().insert(dir.to_string(), accessible);
            self
        }
    }

    #[async_trait]
    impl HdfsHistoryClient for FakeHdfsHistoryClient {
        async fn find_history_and_conf_files(
            &self,
            job_id: &str,
            _finish_time_ms: i64,
        ) -> Result<(String, String), HdfsError> {
            self.locations
                .lock()
                .get(job_id)
                .cloned()
                .ok_or_else(|| HdfsError::NotFound(job_id.to_string()))
        }

        async fn open(&self, path: &str) -> Result<Vec<u8>, HdfsError> {
            self.files
                .lock()
                .get(path)
                .cloned()
                .ok_or_else(|| HdfsError::NotFound(path.to_string()))
        }

        async fn check_dir(&self, dir: &str) -> Result<(), HdfsError> {
            match self.dirs.lock().get(dir) {
                Some(true) => Ok(()),
                _ => Err(HdfsError::NotFound(dir.to_string())),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHdfsHistoryClient;
