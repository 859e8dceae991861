// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("s3 get_object failed for key {key}: {source}")]
    Get {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("s3 list_objects failed for prefix {prefix}: {source}")]
    List {
        prefix: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("could not decode archived job record for key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("job {0} not found in archive")]
    NotFound(String),
}
