// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! strata-archive: the long-term, S3-backed job archive.

pub mod client;
pub mod error;
mod wire;

pub use client::{NullPersistedJobClient, PersistedJobClient, S3PersistedJobClient};
pub use error::ArchiveError;

#[cfg(any(test, feature = "test-support"))]
pub use client::FakePersistedJobClient;
