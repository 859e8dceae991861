// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! strata-clients: upstream HTTP clients for the YARN ResourceManager,
//! JobHistory server, application-master proxy, and HDFS (via WebHDFS).

pub mod error;
pub mod hdfs;
pub mod recent_job;
mod wire;

pub use error::ClientError;
pub use hdfs::{HdfsError, HdfsHistoryClient, WebHdfsHistoryClient};
pub use recent_job::{HttpRecentJobClient, RecentJobClient};

#[cfg(any(test, feature = "test-support"))]
pub use hdfs::FakeHdfsHistoryClient;
#[cfg(any(test, feature = "test-support"))]
pub use recent_job::{FakeJobFixture, FakeRecentJobClient};
