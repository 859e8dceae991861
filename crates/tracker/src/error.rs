// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Client(#[from] strata_clients::ClientError),

    #[error(transparent)]
    Hdfs(#[from] strata_clients::HdfsError),

    #[error(transparent)]
    History(#[from] strata_parsers::ParseError),

    #[error(transparent)]
    Conf(#[from] strata_parsers::ConfParseError),

    #[error(transparent)]
    Archive(#[from] strata_archive::ArchiveError),

    #[error(transparent)]
    Broadcast(#[from] strata_broadcast::BroadcastError),

    #[error("job {0} not tracked")]
    NotTracked(String),

    #[error("io error reading history/conf bytes: {0}")]
    Io(#[from] std::io::Error),
}
