// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Per-cluster tracker tuning. Defaults mirror the values the original
/// job tracker hardcoded as constants.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub cluster_name: String,
    pub public_resource_manager_url: String,
    pub public_history_server_url: String,

    /// How often the RM/HS are polled for job listings.
    pub poll_interval: Duration,
    /// Maximum number of SUCCEEDED jobs retained per cluster before the
    /// oldest (by finish time) are forgotten entirely.
    pub job_limit: usize,
    /// How far back to ask the history server for jobs during startup
    /// backfill.
    pub job_history_duration: Duration,
    /// Finished jobs older than this have their tasks/counters dropped to
    /// save memory; a detail-page visit re-ingests them on demand.
    pub full_data_duration: Duration,
    /// A running job not refreshed for this many poll ticks is assumed gone
    /// and marked `GONE`.
    pub disappearance_ticks: u32,
}

impl TrackerConfig {
    pub fn new(
        cluster_name: impl Into<String>,
        public_resource_manager_url: impl Into<String>,
        public_history_server_url: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            public_resource_manager_url: public_resource_manager_url.into(),
            public_history_server_url: public_history_server_url.into(),
            poll_interval,
            job_limit: 5_000,
            job_history_duration: Duration::from_secs(60 * 60 * 24 * 7),
            full_data_duration: Duration::from_secs(60 * 60 * 24),
            disappearance_ticks: 30,
        }
    }
}
