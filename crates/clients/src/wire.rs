// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON shapes returned by the YARN ResourceManager, JobHistory server, and
//! MapReduce application proxy. These mirror the upstream REST APIs exactly
//! (including their inconsistent casing) and are converted into
//! [`strata_core::job`] types at the client boundary.

use serde::Deserialize;
use strata_core::job::{Counter, JobDetails, JobState};
use strata_core::tasks::TaskPair;

#[derive(Debug, Default, Deserialize)]
pub struct AppsResp {
    #[serde(default)]
    pub apps: Apps,
}

#[derive(Debug, Default, Deserialize)]
pub struct Apps {
    #[serde(default)]
    pub app: Vec<WireJobDetail>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobsResp {
    #[serde(default)]
    pub jobs: Jobs,
}

#[derive(Debug, Default, Deserialize)]
pub struct Jobs {
    #[serde(default)]
    pub job: Vec<WireJobDetail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireJobDetail {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub finish_time: i64,

    #[serde(default)]
    pub maps_total: i32,
    #[serde(default)]
    pub map_progress: f32,
    #[serde(default)]
    pub maps_completed: i32,
    #[serde(default)]
    pub maps_pending: i32,
    #[serde(default)]
    pub maps_running: i32,
    #[serde(default, rename = "failedMapAttempts")]
    pub maps_failed: i32,
    #[serde(default, rename = "killedMapAttempts")]
    pub maps_killed: i32,

    #[serde(default)]
    pub reduces_total: i32,
    #[serde(default)]
    pub reduce_progress: f32,
    #[serde(default)]
    pub reduces_completed: i32,
    #[serde(default)]
    pub reduces_pending: i32,
    #[serde(default)]
    pub reduces_running: i32,
    #[serde(default, rename = "failedReduceAttempts")]
    pub reduces_failed: i32,
    #[serde(default, rename = "killedReduceAttempts")]
    pub reduces_killed: i32,
}

impl From<WireJobDetail> for JobDetails {
    fn from(w: WireJobDetail) -> Self {
        JobDetails {
            id: w.id,
            name: w.name,
            user: w.user,
            state: JobState::parse(&w.state),
            start_time: w.start_time,
            finish_time: w.finish_time,
            maps_total: w.maps_total,
            map_progress: w.map_progress,
            maps_completed: w.maps_completed,
            maps_pending: w.maps_pending,
            maps_running: w.maps_running,
            maps_failed: w.maps_failed,
            maps_killed: w.maps_killed,
            maps_total_time: 0,
            reduces_total: w.reduces_total,
            reduce_progress: w.reduce_progress,
            reduces_completed: w.reduces_completed,
            reduces_pending: w.reduces_pending,
            reduces_running: w.reduces_running,
            reduces_failed: w.reduces_failed,
            reduces_killed: w.reduces_killed,
            reduces_total_time: 0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfResp {
    #[serde(default)]
    pub conf: ConfBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfBody {
    #[serde(default)]
    pub property: Vec<ConfProperty>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfProperty {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CountersResp {
    #[serde(default)]
    pub job_counters: JobCounters,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCounters {
    #[serde(default, rename = "counterGroup")]
    pub counter_groups: Vec<CounterGroup>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CounterGroup {
    #[serde(rename = "counterGroupName")]
    pub name: String,
    #[serde(default, rename = "counter")]
    pub counters: Vec<WireCounter>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCounter {
    pub name: String,
    #[serde(rename = "totalCounterValue")]
    pub total: i64,
    #[serde(rename = "mapCounterValue")]
    pub map: i64,
    #[serde(rename = "reduceCounterValue")]
    pub reduce: i64,
}

/// Flatten the nested counter-group response into `group.name` keyed
/// counters, shortening the group name to the substring after the last `.`.
pub fn flatten_counters(resp: CountersResp) -> Vec<Counter> {
    let mut counters = Vec::new();
    for group in resp.job_counters.counter_groups {
        let short = strata_core::job::short_group_name(&group.name).to_string();
        for c in group.counters {
            counters.push(Counter {
                name: format!("{}.{}", short, c.name),
                total: c.total,
                map: c.map,
                reduce: c.reduce,
            });
        }
    }
    counters
}

#[derive(Debug, Default, Deserialize)]
pub struct TasksResp {
    #[serde(default)]
    pub tasks: TasksBody,
}

#[derive(Debug, Default, Deserialize)]
pub struct TasksBody {
    #[serde(default)]
    pub task: Vec<WireTask>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTask {
    pub start_time: i64,
    pub finish_time: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: String,
}

/// Split a flat task list into map/reduce timelines, mapping the RM's
/// `SCHEDULED` state to the `-1` sentinel start time (the API reports
/// scheduled tasks' start time as the job's start time, which isn't real).
pub fn split_tasks(resp: TasksResp) -> (Vec<TaskPair>, Vec<TaskPair>) {
    let mut map = Vec::new();
    let mut reduce = Vec::new();
    for task in resp.tasks.task {
        let start = if task.state == "SCHEDULED" { -1 } else { task.start_time };
        let pair: TaskPair = [start, task.finish_time];
        match task.kind.as_str() {
            "MAP" => map.push(pair),
            "REDUCE" => reduce.push(pair),
            _ => {}
        }
    }
    (map, reduce)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_nested_counter_groups_with_shortened_names() {
        let json = r#"{
            "jobCounters": {
                "counterGroup": [
                    {
                        "counterGroupName": "org.apache.hadoop.mapreduce.FileSystemCounter",
                        "counter": [
                            {"name": "HDFS_BYTES_READ", "totalCounterValue": 10, "mapCounterValue": 10, "reduceCounterValue": 0}
                        ]
                    }
                ]
            }
        }"#;
        let resp: CountersResp = serde_json::from_str(json).unwrap();
        let counters = flatten_counters(resp);
        assert_eq!(counters.len(), 1);
        assert_eq!(counters[0].name, "FileSystemCounter.HDFS_BYTES_READ");
        assert_eq!(counters[0].total, 10);
    }

    #[test]
    fn split_tasks_marks_scheduled_tasks_as_not_started() {
        let json = r#"{"tasks":{"task":[
            {"startTime": 100, "finishTime": 0, "type": "MAP", "state": "SCHEDULED"},
            {"startTime": 50, "finishTime": 200, "type": "REDUCE", "state": "RUNNING"}
        ]}}"#;
        let resp: TasksResp = serde_json::from_str(json).unwrap();
        let (map, reduce) = split_tasks(resp);
        assert_eq!(map, vec![[-1, 0]]);
        assert_eq!(reduce, vec![[50, 200]]);
    }
}
