// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client over the long-term job archive: expects an S3 layout of
//! `<jobs_prefix>/<job_id>.json` for individual records and
//! `<flow_prefix>/<flow_id>/<job_id>.json` for flow membership lookups.

use crate::error::ArchiveError;
use crate::wire::{self, ArchivedJob};
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use strata_core::job::Job;

/// Fetches retired jobs from storage that retains them far longer than the
/// live ResourceManager/JobHistory servers do.
#[async_trait]
pub trait PersistedJobClient: Clone + Send + Sync + 'static {
    async fn fetch_job(&self, id: &str) -> Result<Job, ArchiveError>;
    async fn fetch_flow_job_ids(&self, flow_id: &str) -> Result<Vec<String>, ArchiveError>;
}

#[derive(Clone)]
pub struct S3PersistedJobClient {
    s3: S3Client,
    bucket: String,
    jobs_prefix: String,
    flow_prefix: String,
}

impl S3PersistedJobClient {
    pub async fn new(bucket: impl Into<String>, jobs_prefix: impl Into<String>, flow_prefix: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self {
            s3: S3Client::new(&config),
            bucket: bucket.into(),
            jobs_prefix: jobs_prefix.into(),
            flow_prefix: flow_prefix.into(),
        }
    }

    pub fn with_client(s3: S3Client, bucket: impl Into<String>, jobs_prefix: impl Into<String>, flow_prefix: impl Into<String>) -> Self {
        Self { s3, bucket: bucket.into(), jobs_prefix: jobs_prefix.into(), flow_prefix: flow_prefix.into() }
    }
}

#[async_trait]
impl PersistedJobClient for S3PersistedJobClient {
    async fn fetch_job(&self, id: &str) -> Result<Job, ArchiveError> {
        let key = format!("{}/{}.json", self.jobs_prefix, id);
        tracing::debug!(bucket = %self.bucket, key, "fetching archived job from s3");

        let output = self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|source| ArchiveError::Get { key: key.clone(), source: Box::new(source) })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|source| ArchiveError::Get { key: key.clone(), source: Box::new(source) })?
            .into_bytes();

        let archived: ArchivedJob = serde_json::from_slice(&bytes)
            .map_err(|source| ArchiveError::Decode { key: key.clone(), source })?;

        Ok(wire::archived_job_to_job(archived))
    }

    async fn fetch_flow_job_ids(&self, flow_id: &str) -> Result<Vec<String>, ArchiveError> {
        let prefix = format!("{}/{}", self.flow_prefix, flow_id);
        tracing::debug!(bucket = %self.bucket, prefix, "listing flow job ids from s3");

        let output = self
            .s3
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(&prefix)
            .send()
            .await
            .map_err(|source| ArchiveError::List { prefix: prefix.clone(), source: Box::new(source) })?;

        Ok(output
            .contents()
            .iter()
            .filter_map(|obj| obj.key())
            .map(wire::job_id_from_key)
            .collect())
    }
}

/// No-op `PersistedJobClient` for deployments without an archive configured
/// (no `--s3-bucket` given): every lookup behaves as a miss.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPersistedJobClient;

#[async_trait]
impl PersistedJobClient for NullPersistedJobClient {
    async fn fetch_job(&self, id: &str) -> Result<Job, ArchiveError> {
        Err(ArchiveError::NotFound(id.to_string()))
    }

    async fn fetch_flow_job_ids(&self, _flow_id: &str) -> Result<Vec<String>, ArchiveError> {
        Ok(Vec::new())
    }
}

/// Fake `PersistedJobClient` for tests.
#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakePersistedJobClient {
        jobs: Arc<parking_lot::Mutex<HashMap<String, Job>>>,
        flows: Arc<parking_lot::Mutex<HashMap<String, Vec<String>>>>,
    }

    impl FakePersistedJobClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert_job(&self, id: impl Into<String>, job: Job) {
            self.jobs.lock().insert(id.into(), job);
        }

        pub fn insert_flow(&self, flow_id: impl Into<String>, job_ids: Vec<String>) {
            self.flows.lock().insert(flow_id.into(), job_ids);
        }
    }

    #[async_trait]
    impl PersistedJobClient for FakePersistedJobClient {
        async fn fetch_job(&self, id: &str) -> Result<Job, ArchiveError> {
            self.jobs.lock().get(id).cloned().ok_or_else(|| ArchiveError::NotFound(id.to_string()))
        }

        async fn fetch_flow_job_ids(&self, flow_id: &str) -> Result<Vec<String>, ArchiveError> {
            Ok(self.flows.lock().get(flow_id).cloned().unwrap_or_default())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePersistedJobClient;

#[cfg(test)]
mod tests {
    use super::*;
    use fake::FakePersistedJobClient;

    #[tokio::test]
    async fn fake_client_round_trips_inserted_jobs() {
        let client = FakePersistedJobClient::new();
        let mut job = Job::default();
        job.details.id = "job_1_1".to_string();
        client.insert_job("job_1_1", job);
        client.insert_flow("flow-7", vec!["job_1_1".to_string()]);

        let fetched = client.fetch_job("job_1_1").await.unwrap();
        assert_eq!(fetched.details.id, "job_1_1");

        let flow_jobs = client.fetch_flow_job_ids("flow-7").await.unwrap();
        assert_eq!(flow_jobs, vec!["job_1_1".to_string()]);

        let err = client.fetch_job("missing").await.unwrap_err();
        assert!(matches!(err, ArchiveError::NotFound(_)));
    }
}
