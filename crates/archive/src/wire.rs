// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persisted-job JSON schema and its translation into
//! [`strata_core::job::Job`]. The archive's schema predates (and differs
//! from) the live JobHistory server's, so field names, task-status
//! filtering, and a couple of counter-naming quirks are translated here
//! rather than upstream.

use serde::Deserialize;
use std::collections::HashMap;
use strata_core::job::{Configuration, Counter, Job, JobDetails, JobState, TaskAttempt, Tasks};
use strata_core::tasks::TaskPair;

#[derive(Debug, Clone, Deserialize)]
pub struct ArchivedJob {
    #[serde(rename = "job_id")]
    pub id: String,
    #[serde(rename = "job_name")]
    pub name: String,
    pub user: String,
    #[serde(rename = "submit_date")]
    pub start_time: i64,
    #[serde(rename = "finish_date")]
    pub finish_time: i64,
    pub outcome: String,
    #[serde(rename = "job_properties", default)]
    pub conf: HashMap<String, String>,

    #[serde(default)]
    pub map_tasks: Vec<ArchivedTask>,
    #[serde(default)]
    pub reduce_tasks: Vec<ArchivedTask>,

    #[serde(default)]
    pub map_counters: HashMap<String, i64>,
    #[serde(default)]
    pub reduce_counters: HashMap<String, i64>,

    #[serde(rename = "total_maps", default)]
    pub maps_total: i32,
    #[serde(rename = "total_reduces", default)]
    pub reduces_total: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchivedTask {
    #[serde(rename = "launch_date")]
    pub start_time: i64,
    #[serde(rename = "finish_date")]
    pub end_time: i64,
    #[serde(rename = "task_status")]
    pub status: String,
}

const CPU_MILLISECONDS: &str = "CPU_MILLISECONDS";

/// Translate a counter name from the archive's flat naming to the live
/// server's `Group.COUNTER_NAME` convention, so consumers see one shape
/// regardless of where a job's data came from.
fn counter_name(raw: &str) -> String {
    if raw.contains("BYTES_READ") || raw.contains("BYTES_WRITTEN") {
        format!("FileSystemCounter.{raw}")
    } else if raw == "REDUCE_SHUFFLE_BYTES" || raw.contains("PUT_RECORDS") {
        format!("TaskCounter.{raw}")
    } else {
        raw.to_string()
    }
}

fn task_pairs(tasks: &[ArchivedTask]) -> Vec<TaskPair> {
    tasks.iter().map(|t| [t.start_time, t.end_time]).collect()
}

fn count_status(tasks: &[ArchivedTask], status: &str) -> i32 {
    tasks.iter().filter(|t| t.status == status).count() as i32
}

fn to_job_details(archived: &ArchivedJob) -> JobDetails {
    let state = if archived.outcome == "SUCCESS" {
        JobState::Succeeded
    } else {
        JobState::parse(&archived.outcome)
    };

    JobDetails {
        id: archived.id.clone(),
        name: archived.name.clone(),
        user: archived.user.clone(),
        state,
        start_time: archived.start_time,
        finish_time: archived.finish_time,

        maps_total: archived.maps_total,
        map_progress: 100.0,
        maps_completed: count_status(&archived.map_tasks, "SUCCESS"),
        maps_pending: 0,
        maps_running: 0,
        maps_failed: count_status(&archived.map_tasks, "FAILED"),
        maps_killed: count_status(&archived.map_tasks, "KILLED"),
        maps_total_time: *archived.map_counters.get(CPU_MILLISECONDS).unwrap_or(&0),

        reduces_total: archived.reduces_total,
        reduce_progress: 100.0,
        reduces_completed: count_status(&archived.reduce_tasks, "SUCCESS"),
        reduces_pending: 0,
        reduces_running: 0,
        reduces_failed: count_status(&archived.reduce_tasks, "FAILED"),
        reduces_killed: count_status(&archived.reduce_tasks, "KILLED"),
        reduces_total_time: *archived.reduce_counters.get(CPU_MILLISECONDS).unwrap_or(&0),
    }
}

fn to_counters(archived: &ArchivedJob) -> Vec<Counter> {
    let mut names: std::collections::HashSet<&String> = archived.map_counters.keys().collect();
    names.extend(archived.reduce_counters.keys());

    names
        .into_iter()
        .map(|key| {
            let map = *archived.map_counters.get(key).unwrap_or(&0);
            let reduce = *archived.reduce_counters.get(key).unwrap_or(&0);
            Counter { name: counter_name(key), total: map + reduce, map, reduce }
        })
        .collect()
}

fn to_configuration(archived: &ArchivedJob) -> Configuration {
    let mut conf = Configuration::default();
    conf.update(archived.conf.clone());
    conf
}

/// Translate an archive record into the workspace's live domain model,
/// decorating it as a complete (non-partial) historical job with no open
/// task-error detail (the archive doesn't retain per-attempt failure text).
pub fn archived_job_to_job(archived: ArchivedJob) -> Job {
    let flow_id = archived.conf.get("cascading.flow.id").cloned();

    Job {
        details: to_job_details(&archived),
        counters: to_counters(&archived),
        conf: to_configuration(&archived),
        tasks: Tasks {
            map: task_pairs(&archived.map_tasks),
            reduce: task_pairs(&archived.reduce_tasks),
            errors: HashMap::<String, Vec<TaskAttempt>>::new(),
        },
        flow_id,
        running: false,
        partial: false,
        updated_ms: 0,
        cluster: String::new(),
        resource_manager_url: String::new(),
        job_history_url: String::new(),
    }
}

/// Extract the job id from an S3 key of the form `<prefix>/<job_id>.json`.
pub fn job_id_from_key(key: &str) -> String {
    let name = key.rsplit('/').next().unwrap_or(key);
    name.strip_suffix(".json").unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ArchivedJob {
        let mut conf = HashMap::new();
        conf.insert("cascading.flow.id".to_string(), "flow-7".to_string());
        conf.insert(
            "mapreduce.input.fileinputformat.inputdir".to_string(),
            "/input".to_string(),
        );

        let mut map_counters = HashMap::new();
        map_counters.insert("CPU_MILLISECONDS".to_string(), 5000);
        map_counters.insert("HDFS_BYTES_READ".to_string(), 480);

        let mut reduce_counters = HashMap::new();
        reduce_counters.insert("CPU_MILLISECONDS".to_string(), 1200);

        ArchivedJob {
            id: "job_1_1".to_string(),
            name: "archived job".to_string(),
            user: "user".to_string(),
            start_time: 1000,
            finish_time: 2000,
            outcome: "SUCCESS".to_string(),
            conf,
            map_tasks: vec![
                ArchivedTask { start_time: 1000, end_time: 1500, status: "SUCCESS".to_string() },
                ArchivedTask { start_time: 1000, end_time: 1400, status: "FAILED".to_string() },
            ],
            reduce_tasks: vec![ArchivedTask {
                start_time: 1500,
                end_time: 2000,
                status: "SUCCESS".to_string(),
            }],
            map_counters,
            reduce_counters,
            maps_total: 2,
            reduces_total: 1,
        }
    }

    #[test]
    fn translates_outcome_and_counts() {
        let job = archived_job_to_job(sample());
        assert_eq!(job.details.state, JobState::Succeeded);
        assert_eq!(job.details.maps_completed, 1);
        assert_eq!(job.details.maps_failed, 1);
        assert_eq!(job.details.maps_total_time, 5000);
        assert_eq!(job.details.reduces_total_time, 1200);
        assert_eq!(job.flow_id.as_deref(), Some("flow-7"));
        assert_eq!(job.conf.input, "/input");
    }

    #[test]
    fn prefixes_filesystem_and_task_counters() {
        let job = archived_job_to_job(sample());
        let bytes_read = job.counters.iter().find(|c| c.name.ends_with("HDFS_BYTES_READ")).unwrap();
        assert_eq!(bytes_read.name, "FileSystemCounter.HDFS_BYTES_READ");
    }

    #[test]
    fn parses_job_id_from_s3_key() {
        assert_eq!(job_id_from_key("jobs/job_1_1.json"), "job_1_1");
        assert_eq!(job_id_from_key("job_1_1.json"), "job_1_1");
    }
}
