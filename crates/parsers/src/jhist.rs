// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser for the line-delimited Avro-JSON job-history log (`.jhist` files).
//!
//! The first non-empty line is the literal header `Avro-Json`. Every
//! subsequent line is a JSON object `{"type": ..., "event": {...}}`, where
//! `event` wraps a single fully-qualified event-class key whose value holds
//! the actual fields (this mirrors the Avro schema's union-of-records
//! encoding). Unrecognized event types are ignored.

use serde_json::Value;
use std::collections::HashMap;
use std::io::BufRead;
use strata_core::clock::Clock;
use strata_core::job::{Counter, Job, JobState, TaskAttempt};
use strata_core::tasks::{sum_times, trim, TaskPair};

const HEADER: &str = "Avro-Json";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid Avro-Json header")]
    InvalidHeader,
    #[error("line {line}: {cause}")]
    Line { line: usize, cause: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
struct Attempt {
    phase: String, // "MAP" | "REDUCE"
    start_ms: i64,
    finish_ms: i64,
    hostname: String,
    status: String,
    error: String,
    counters: Vec<(String, String, i64)>, // (group, name, value)
}

/// Parse a jhist byte stream, applying the events to `job`.
///
/// When `full` is true, a second pass over the accumulated attempt table
/// populates `job.tasks` (trimmed), `job.counters`, and per-error attempt
/// groupings, and sets `MapsTotalTime`/`ReducesTotalTime`.
pub fn parse_jhist<R: BufRead>(
    reader: R,
    job: &mut Job,
    full: bool,
    clock: &impl Clock,
) -> Result<(), ParseError> {
    let mut lines = reader.lines();

    let header = loop {
        match lines.next() {
            Some(line) => {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                break line;
            }
            None => return Err(ParseError::InvalidHeader),
        }
    };
    if header.trim() != HEADER {
        return Err(ParseError::InvalidHeader);
    }

    // Reset so re-parses don't double count.
    job.details.maps_completed = 0;
    job.details.maps_failed = 0;
    job.details.maps_killed = 0;
    job.details.reduces_completed = 0;
    job.details.reduces_failed = 0;
    job.details.reduces_killed = 0;

    let mut attempts: HashMap<String, Attempt> = HashMap::new();
    let mut line_number = 1usize;

    for line in lines {
        line_number += 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let wrapper: Value = serde_json::from_str(line).map_err(|e| ParseError::Line {
            line: line_number,
            cause: e.to_string(),
        })?;

        let event_type = wrapper.get("type").and_then(Value::as_str).unwrap_or("");
        let event = unwrap_event(wrapper.get("event"));

        match event_type {
            "JOB_SUBMITTED" => {
                job.details.id = str_field(event, "jobid").unwrap_or_default();
                job.details.name = str_field(event, "jobName").unwrap_or_default();
                job.details.user = str_field(event, "userName").unwrap_or_default();
            }
            "JOB_INITED" => {
                job.details.id = str_field(event, "jobid").unwrap_or_default();
                job.details.start_time = int_field(event, "launchTime").unwrap_or_default();
                job.details.maps_total = int_field(event, "totalMaps").unwrap_or_default() as i32;
                job.details.reduces_total =
                    int_field(event, "totalReduces").unwrap_or_default() as i32;
            }
            "JOB_FINISHED" => {
                job.details.id = str_field(event, "jobid").unwrap_or_default();
                job.details.finish_time = int_field(event, "finishTime").unwrap_or_default();
                job.details.state = JobState::Succeeded;
            }
            "JOB_FAILED" => {
                job.details.id = str_field(event, "jobid").unwrap_or_default();
                job.details.finish_time = int_field(event, "finishTime").unwrap_or_default();
                job.details.state = JobState::parse(&str_field(event, "jobStatus").unwrap_or_default());
            }
            "MAP_ATTEMPT_STARTED" | "REDUCE_ATTEMPT_STARTED" => {
                let (id, attempt) = parse_started(event);
                attempts.insert(id, attempt);
            }
            "MAP_ATTEMPT_FINISHED" => {
                job.details.maps_completed += 1;
                merge_finished(&mut attempts, event, "MAP");
            }
            "MAP_ATTEMPT_FAILED" => {
                job.details.maps_failed += 1;
                merge_finished(&mut attempts, event, "MAP");
            }
            "MAP_ATTEMPT_KILLED" => {
                job.details.maps_killed += 1;
                merge_finished(&mut attempts, event, "MAP");
            }
            "REDUCE_ATTEMPT_FINISHED" => {
                job.details.reduces_completed += 1;
                merge_finished(&mut attempts, event, "REDUCE");
            }
            "REDUCE_ATTEMPT_FAILED" => {
                job.details.reduces_failed += 1;
                merge_finished(&mut attempts, event, "REDUCE");
            }
            "REDUCE_ATTEMPT_KILLED" => {
                job.details.reduces_killed += 1;
                merge_finished(&mut attempts, event, "REDUCE");
            }
            _ => {}
        }
    }

    if !full {
        return Ok(());
    }

    let mut map_pairs: Vec<TaskPair> = Vec::new();
    let mut reduce_pairs: Vec<TaskPair> = Vec::new();
    let mut errors: HashMap<String, Vec<TaskAttempt>> = HashMap::new();
    let mut counters: HashMap<String, Counter> = HashMap::new();

    for (id, attempt) in &attempts {
        let pair: TaskPair = [attempt.start_ms, attempt.finish_ms];
        match attempt.phase.as_str() {
            "MAP" => map_pairs.push(pair),
            "REDUCE" => reduce_pairs.push(pair),
            _ => {}
        }

        if attempt.status == "FAILED" && !attempt.error.is_empty() {
            errors.entry(attempt.error.clone()).or_default().push(TaskAttempt {
                id: id.clone(),
                hostname: attempt.hostname.clone(),
                phase: attempt.phase.clone(),
            });
        }

        for (group, name, value) in &attempt.counters {
            let short_group = strata_core::job::short_group_name(group);
            let counter_name = format!("{}.{}", short_group, name);
            let counter = counters.entry(counter_name.clone()).or_insert_with(|| Counter {
                name: counter_name.clone(),
                total: 0,
                map: 0,
                reduce: 0,
            });
            counter.total += value;
            match attempt.phase.as_str() {
                "MAP" => counter.map += value,
                "REDUCE" => counter.reduce += value,
                _ => {}
            }
        }
    }

    job.details.maps_total_time = sum_times(&map_pairs, clock);
    job.details.reduces_total_time = sum_times(&reduce_pairs, clock);
    job.tasks.map = trim(&map_pairs);
    job.tasks.reduce = trim(&reduce_pairs);
    job.tasks.errors = errors;
    job.counters = counters.into_values().collect();

    Ok(())
}

fn unwrap_event(event: Option<&Value>) -> &Value {
    static NULL: Value = Value::Null;
    let Some(event) = event else { return &NULL };
    match event.as_object().and_then(|o| o.values().next()) {
        Some(inner) => inner,
        None => event,
    }
}

fn str_field(event: &Value, key: &str) -> Option<String> {
    event.get(key).and_then(Value::as_str).map(str::to_string)
}

fn int_field(event: &Value, key: &str) -> Option<i64> {
    event.get(key).and_then(Value::as_i64)
}

fn parse_started(event: &Value) -> (String, Attempt) {
    let id = str_field(event, "attemptId").unwrap_or_default();
    let attempt = Attempt {
        phase: str_field(event, "taskType").unwrap_or_default(),
        start_ms: int_field(event, "startTime").unwrap_or_default(),
        hostname: str_field(event, "hostname").unwrap_or_default(),
        ..Default::default()
    };
    (id, attempt)
}

fn merge_finished(attempts: &mut HashMap<String, Attempt>, event: &Value, fallback_phase: &str) {
    let id = str_field(event, "attemptId").unwrap_or_default();
    let start_ms = attempts.get(&id).map(|a| a.start_ms).unwrap_or(-1);
    let phase = attempts
        .get(&id)
        .map(|a| a.phase.clone())
        .filter(|p| !p.is_empty())
        .or_else(|| str_field(event, "taskType"))
        .unwrap_or_else(|| fallback_phase.to_string());

    let mut counters = Vec::new();
    if let Some(groups) = event.get("counters").and_then(|c| c.get("groups")).and_then(Value::as_array) {
        for group in groups {
            let group_name = str_field(group, "name").unwrap_or_default();
            if let Some(counts) = group.get("counts").and_then(Value::as_array) {
                for count in counts {
                    let name = str_field(count, "name").unwrap_or_default();
                    let value = int_field(count, "value").unwrap_or_default();
                    counters.push((group_name.clone(), name, value));
                }
            }
        }
    }

    attempts.insert(
        id,
        Attempt {
            phase,
            start_ms,
            finish_ms: int_field(event, "finishTime").unwrap_or_default(),
            hostname: str_field(event, "hostname").unwrap_or_default(),
            status: str_field(event, "status").unwrap_or_default(),
            error: str_field(event, "error").unwrap_or_default(),
            counters,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;
    use strata_core::clock::FakeClock;

    fn line(event_type: &str, class: &str, fields: &str) -> String {
        format!(r#"{{"type":"{event_type}","event":{{"{class}":{fields}}}}}"#)
    }

    fn sample_jhist() -> String {
        let mut out = vec!["Avro-Json".to_string()];
        out.push(line(
            "JOB_SUBMITTED",
            "org.apache.hadoop.mapreduce.jobhistory.JobSubmitted",
            r#"{"jobid":"job_1329348432655_0001","jobName":"Sleep job","userName":"user"}"#,
        ));
        out.push(line(
            "JOB_INITED",
            "org.apache.hadoop.mapreduce.jobhistory.JobInited",
            r#"{"jobid":"job_1329348432655_0001","launchTime":1329348448308,"totalMaps":10,"totalReduces":1}"#,
        ));

        for i in 0..10 {
            let id = format!("attempt_1457998088753_7918_m_{:06}_0", i);
            out.push(line(
                "MAP_ATTEMPT_STARTED",
                "org.apache.hadoop.mapreduce.jobhistory.TaskAttemptStarted",
                &format!(
                    r#"{{"attemptId":"{id}","taskType":"MAP","startTime":1329348448308,"hostname":"bigdata{i}"}}"#
                ),
            ));
            let counters = if i == 0 {
                r#","counters":{"groups":[{"name":"hdfs","counts":[{"name":"bytes_read","value":480}]}]}"#
            } else {
                ""
            };
            out.push(line(
                "MAP_ATTEMPT_FINISHED",
                "org.apache.hadoop.mapreduce.jobhistory.MapAttemptFinished",
                &format!(
                    r#"{{"attemptId":"{id}","taskType":"MAP","finishTime":1329348457508,"status":"SUCCEEDED"{counters}}}"#
                ),
            ));
        }

        out.push(line(
            "MAP_ATTEMPT_STARTED",
            "org.apache.hadoop.mapreduce.jobhistory.TaskAttemptStarted",
            r#"{"attemptId":"attempt_1457998088753_7918_m_000014_0","taskType":"MAP","startTime":1329348448308,"hostname":"bigdata33"}"#,
        ));
        out.push(line(
            "MAP_ATTEMPT_FAILED",
            "org.apache.hadoop.mapreduce.jobhistory.TaskAttemptUnsuccessfulCompletion",
            r#"{"attemptId":"attempt_1457998088753_7918_m_000014_0","taskType":"MAP","finishTime":1329348457918,"status":"FAILED","error":"This is an error.","hostname":"bigdata33"}"#,
        ));

        out.push(line(
            "REDUCE_ATTEMPT_STARTED",
            "org.apache.hadoop.mapreduce.jobhistory.TaskAttemptStarted",
            r#"{"attemptId":"attempt_1329348432655_0001_r_000000_0","taskType":"REDUCE","startTime":1329348448308,"hostname":"bigdata1"}"#,
        ));
        out.push(line(
            "REDUCE_ATTEMPT_FINISHED",
            "org.apache.hadoop.mapreduce.jobhistory.ReduceAttemptFinished",
            r#"{"attemptId":"attempt_1329348432655_0001_r_000000_0","taskType":"REDUCE","finishTime":1329348451913,"status":"SUCCEEDED"}"#,
        ));

        out.push(line(
            "JOB_FINISHED",
            "org.apache.hadoop.mapreduce.jobhistory.JobFinished",
            r#"{"jobid":"job_1329348432655_0001","finishTime":1329348468601}"#,
        ));

        out.join("\n")
    }

    #[test]
    fn parses_the_sample_history_file() {
        let text = sample_jhist();
        let reader = BufReader::new(text.as_bytes());
        let mut job = Job::default();
        let clock = FakeClock::new(0);

        parse_jhist(reader, &mut job, true, &clock).expect("parse should succeed");

        assert_eq!(job.details.id, "job_1329348432655_0001");
        assert_eq!(job.details.name, "Sleep job");
        assert_eq!(job.details.user, "user");
        assert_eq!(job.details.state, JobState::Succeeded);
        assert_eq!(job.details.start_time, 1329348448308);
        assert_eq!(job.details.finish_time, 1329348468601);

        assert_eq!(job.details.maps_total, 10);
        assert_eq!(job.details.maps_completed, 10);
        assert_eq!(job.details.maps_failed, 1);
        assert_eq!(job.details.maps_killed, 0);
        assert_eq!(job.details.maps_total_time, 10 * 9200 + 9610);

        assert_eq!(job.details.reduces_total, 1);
        assert_eq!(job.details.reduces_completed, 1);
        assert_eq!(job.details.reduces_total_time, 3605);

        assert_eq!(job.tasks.map.len(), 11);
        assert_eq!(job.tasks.reduce.len(), 1);
        assert_eq!(job.tasks.errors.len(), 1);

        let attempts = job.tasks.errors.get("This is an error.").expect("error entry");
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].id, "attempt_1457998088753_7918_m_000014_0");
        assert_eq!(attempts[0].hostname, "bigdata33");
        assert_eq!(attempts[0].phase, "MAP");

        let bytes_read = job
            .counters
            .iter()
            .find(|c| c.name == "hdfs.bytes_read")
            .expect("hdfs.bytes_read counter");
        assert_eq!(bytes_read.total, 480);
        assert_eq!(bytes_read.map, 480);
        assert_eq!(bytes_read.reduce, 0);
    }

    #[test]
    fn rejects_bad_header() {
        let mut job = Job::default();
        let clock = FakeClock::new(0);
        let reader = BufReader::new("not-avro-json\n".as_bytes());
        let err = parse_jhist(reader, &mut job, true, &clock).unwrap_err();
        assert!(matches!(err, ParseError::InvalidHeader));
    }

    #[test]
    fn resets_counters_across_reparses() {
        let text = sample_jhist();
        let clock = FakeClock::new(0);
        let mut job = Job::default();
        parse_jhist(BufReader::new(text.as_bytes()), &mut job, true, &clock).unwrap();
        parse_jhist(BufReader::new(text.as_bytes()), &mut job, true, &clock).unwrap();
        assert_eq!(job.details.maps_completed, 10);
        assert_eq!(job.details.maps_failed, 1);
    }
}
