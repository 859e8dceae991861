// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job domain types: the unit of tracking, its detail snapshot, configuration,
//! counters, and task timelines.

use crate::id::JobId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// MapReduce job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    #[serde(rename = "NEW")]
    New,
    #[serde(rename = "SUBMITTED")]
    Submitted,
    #[serde(rename = "ACCEPTED")]
    Accepted,
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "SUCCEEDED")]
    Succeeded,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "KILLED")]
    Killed,
    #[serde(rename = "GONE")]
    Gone,
}

impl JobState {
    /// Parse a state string from an upstream API, falling back to `New` for
    /// anything unrecognized rather than failing the whole response.
    pub fn parse(raw: &str) -> JobState {
        match raw {
            "NEW" => JobState::New,
            "SUBMITTED" => JobState::Submitted,
            "ACCEPTED" => JobState::Accepted,
            "RUNNING" => JobState::Running,
            "SUCCEEDED" => JobState::Succeeded,
            "FAILED" => JobState::Failed,
            "KILLED" => JobState::Killed,
            "GONE" => JobState::Gone,
            _ => JobState::New,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::New => "NEW",
            JobState::Submitted => "SUBMITTED",
            JobState::Accepted => "ACCEPTED",
            JobState::Running => "RUNNING",
            JobState::Succeeded => "SUCCEEDED",
            JobState::Failed => "FAILED",
            JobState::Killed => "KILLED",
            JobState::Gone => "GONE",
        }
    }
}

impl Default for JobState {
    fn default() -> Self {
        JobState::New
    }
}

/// A snapshot of a job's headline details, as returned by the RM/HS APIs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetails {
    pub id: String,
    pub name: String,
    pub user: String,
    #[serde(default)]
    pub state: JobState,
    pub start_time: i64,
    pub finish_time: i64,

    pub maps_total: i32,
    pub map_progress: f32,
    pub maps_completed: i32,
    pub maps_pending: i32,
    pub maps_running: i32,
    #[serde(rename = "failedMapAttempts")]
    pub maps_failed: i32,
    #[serde(rename = "killedMapAttempts")]
    pub maps_killed: i32,
    pub maps_total_time: i64,

    pub reduces_total: i32,
    pub reduce_progress: f32,
    pub reduces_completed: i32,
    pub reduces_pending: i32,
    pub reduces_running: i32,
    #[serde(rename = "failedReduceAttempts")]
    pub reduces_failed: i32,
    #[serde(rename = "killedReduceAttempts")]
    pub reduces_killed: i32,
    pub reduces_total_time: i64,
}

impl JobDetails {
    pub fn job_id(&self) -> JobId {
        JobId::new(self.id.clone())
    }
}

/// Ordering job details by finish time, used for eviction and backfill sort.
pub fn sort_by_finish_time_desc(details: &mut [JobDetails]) {
    details.sort_by(|a, b| b.finish_time.cmp(&a.finish_time));
}

/// A named counter triple, reported per map/reduce phase plus a total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub name: String,
    pub total: i64,
    pub map: i64,
    pub reduce: i64,
}

/// Shortens `a.b.c.CounterGroupName` style group names to the substring after
/// the last `.`.
pub fn short_group_name(group: &str) -> &str {
    match group.rfind('.') {
        Some(idx) => &group[idx + 1..],
        None => group,
    }
}

/// Flat job-configuration bag plus a handful of lifted, well-known fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(rename = "flags")]
    pub flags: HashMap<String, String>,
    pub input: String,
    pub output: String,
    #[serde(rename = "scaldingSteps")]
    pub scalding_steps: String,
    /// Application label lifted from `cascading.app.name`; not serialized to
    /// the public wire format (it is folded into `JobDetails::name` instead).
    #[serde(skip)]
    pub name: String,
}

impl Configuration {
    pub const INPUT_DIR_KEY: &'static str = "mapreduce.input.fileinputformat.inputdir";
    pub const OUTPUT_DIR_KEY: &'static str = "mapreduce.output.fileoutputformat.outputdir";
    pub const SCALDING_STEPS_KEY: &'static str = "scalding.step.descriptions";
    pub const APP_NAME_KEY: &'static str = "cascading.app.name";

    /// Merge a flat property map into this configuration, lifting recognized
    /// keys into their typed fields.
    pub fn update(&mut self, props: HashMap<String, String>) {
        for (key, value) in props {
            match key.as_str() {
                Self::INPUT_DIR_KEY => self.input = value.clone(),
                Self::OUTPUT_DIR_KEY => self.output = value.clone(),
                Self::SCALDING_STEPS_KEY => self.scalding_steps = value.clone(),
                Self::APP_NAME_KEY => self.name = value.clone(),
                _ => {}
            }
            self.flags.insert(key, value);
        }
    }
}

/// A failed attempt summary, grouped by error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAttempt {
    pub id: String,
    pub hostname: String,
    #[serde(rename = "type")]
    pub phase: String,
}

/// Per-phase task timelines plus error groupings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tasks {
    #[serde(rename = "maps")]
    pub map: Vec<crate::tasks::TaskPair>,
    #[serde(rename = "reduces")]
    pub reduce: Vec<crate::tasks::TaskPair>,
    #[serde(default)]
    pub errors: HashMap<String, Vec<TaskAttempt>>,
}

/// The unit of tracking: a job's identity, details, config, counters, and
/// task timelines, plus the tracker's bookkeeping flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Job {
    pub details: JobDetails,
    #[serde(default)]
    pub counters: Vec<Counter>,
    #[serde(default)]
    pub conf: Configuration,
    #[serde(default)]
    pub tasks: Tasks,

    /// Set when this job belongs to a cascading-style flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_id: Option<String>,

    /// Present in the most recent RM listing (or added within the last 30
    /// poll ticks).
    #[serde(default)]
    pub running: bool,
    /// Heavy fields (`tasks`, `counters`) have been dropped by cleanup.
    #[serde(default)]
    pub partial: bool,
    /// Wall-clock milliseconds of the last refresh.
    #[serde(default)]
    pub updated_ms: i64,

    /// Decorated at read time; not authoritative state.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_manager_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub job_history_url: String,
}

impl Job {
    pub fn job_id(&self) -> JobId {
        self.details.job_id()
    }

    /// A stripped copy retaining only `details` and `conf`, used by the
    /// cleanup loop's partial-retention policy.
    pub fn into_partial(self) -> Job {
        Job {
            details: self.details,
            conf: self.conf,
            running: self.running,
            partial: true,
            updated_ms: self.updated_ms,
            flow_id: self.flow_id,
            ..Default::default()
        }
    }

    /// Project down to the fields needed for job-listing views: details and a
    /// conf subset, dropping tasks/counters regardless of `partial`.
    pub fn listing_view(&self) -> Job {
        Job {
            details: self.details.clone(),
            conf: self.conf.clone(),
            running: self.running,
            partial: self.partial,
            updated_ms: self.updated_ms,
            flow_id: self.flow_id.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_lifts_known_keys() {
        let mut conf = Configuration::default();
        let mut props = HashMap::new();
        props.insert(Configuration::INPUT_DIR_KEY.to_string(), "/input/dir".to_string());
        props.insert(Configuration::OUTPUT_DIR_KEY.to_string(), "/output/dir".to_string());
        props.insert(Configuration::APP_NAME_KEY.to_string(), "appname".to_string());
        conf.update(props);

        assert_eq!(conf.input, "/input/dir");
        assert_eq!(conf.output, "/output/dir");
        assert_eq!(conf.name, "appname");
        assert_eq!(conf.flags.len(), 3);
    }

    #[test]
    fn short_group_name_takes_last_segment() {
        assert_eq!(short_group_name("org.apache.hadoop.FileSystemCounter"), "FileSystemCounter");
        assert_eq!(short_group_name("NoDots"), "NoDots");
    }

    #[test]
    fn partial_retention_drops_heavy_fields() {
        let mut job = Job::default();
        job.details.id = "job_1_1".to_string();
        job.counters.push(Counter { name: "x".into(), total: 1, map: 1, reduce: 0 });
        job.tasks.map.push([0, 10]);

        let partial = job.into_partial();
        assert!(partial.partial);
        assert!(partial.counters.is_empty());
        assert!(partial.tasks.map.is_empty());
        assert_eq!(partial.details.id, "job_1_1");
    }
}
