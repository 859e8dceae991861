// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! strata-broadcast: fans out job-change events to every connected SSE
//! subscriber.
//!
//! Split into a cloneable [`Broadcaster`] handle (used by the tracker to
//! publish updates and by HTTP handlers to subscribe) and a single
//! [`BroadcastLoop`] that owns the client set, mirroring the teacher's
//! split-handle event bus.

use bytes::Bytes;
use serde::Serialize;
use strata_core::job::Job;
use tokio::sync::mpsc;

/// Per-subscriber channel capacity. A subscriber that falls this far behind
/// is dropped rather than allowed to stall every other subscriber.
pub const SUBSCRIBER_CAPACITY: usize = 32;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BroadcastEvent {
    JobUpdated { job: Box<Job> },
    JobRemoved { job_id: String },
}

#[derive(Debug, thiserror::Error)]
pub enum BroadcastError {
    #[error("failed to serialize broadcast event: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("broadcast loop has shut down")]
    LoopClosed,
}

/// Cloneable publish/subscribe handle. Cheap to clone and share across
/// tracker supervisors and HTTP handlers.
#[derive(Clone)]
pub struct Broadcaster {
    events_tx: mpsc::Sender<Bytes>,
    add_client_tx: mpsc::Sender<mpsc::Sender<Bytes>>,
}

/// The single task that owns the subscriber set. Spawn its `run` future once
/// per process.
pub struct BroadcastLoop {
    events_rx: mpsc::Receiver<Bytes>,
    add_client_rx: mpsc::Receiver<mpsc::Sender<Bytes>>,
    clients: Vec<mpsc::Sender<Bytes>>,
}

impl Broadcaster {
    /// Buffer size 1 is tokio's closest equivalent to the unbuffered Go
    /// channel this mirrors: a publish blocks until the loop has taken the
    /// previous event off the channel.
    pub fn new() -> (Self, BroadcastLoop) {
        let (events_tx, events_rx) = mpsc::channel(1);
        let (add_client_tx, add_client_rx) = mpsc::channel(1);
        (
            Broadcaster { events_tx, add_client_tx },
            BroadcastLoop { events_rx, add_client_rx, clients: Vec::new() },
        )
    }

    pub async fn publish(&self, event: &BroadcastEvent) -> Result<(), BroadcastError> {
        let bytes = serde_json::to_vec(event)?;
        self.events_tx
            .send(Bytes::from(bytes))
            .await
            .map_err(|_| BroadcastError::LoopClosed)
    }

    /// Register a new subscriber and return its receiving half, which a
    /// handler streams out as SSE frames.
    pub async fn subscribe(&self) -> Result<mpsc::Receiver<Bytes>, BroadcastError> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
        self.add_client_tx.send(tx).await.map_err(|_| BroadcastError::LoopClosed)?;
        Ok(rx)
    }
}

impl BroadcastLoop {
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                maybe_client = self.add_client_rx.recv() => {
                    match maybe_client {
                        Some(client) => {
                            self.clients.push(client);
                            tracing::info!(subscriber_count = self.clients.len(), "added sse client");
                        }
                        None => break,
                    }
                }
                maybe_event = self.events_rx.recv() => {
                    match maybe_event {
                        Some(event) => self.dispatch(event),
                        None => break,
                    }
                }
            }
        }
    }

    /// Fan an event out to every subscriber, dropping any whose queue is
    /// full or whose receiver has gone away.
    fn dispatch(&mut self, event: Bytes) {
        let before = self.clients.len();
        self.clients.retain(|client| client.try_send(event.clone()).is_ok());
        let dropped = before - self.clients.len();
        if dropped > 0 {
            tracing::info!(dropped, remaining = self.clients.len(), "dropped lagging sse clients");
        }
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::job::Job;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let (broadcaster, loop_) = Broadcaster::new();
        tokio::spawn(loop_.run());

        let mut rx = broadcaster.subscribe().await.unwrap();
        // Give the loop a tick to register the subscriber before publishing.
        tokio::task::yield_now().await;

        let mut job = Job::default();
        job.details.id = "job_1_1".to_string();
        broadcaster
            .publish(&BroadcastEvent::JobUpdated { job: Box::new(job) })
            .await
            .unwrap();

        let received = rx.recv().await.expect("should receive the published event");
        let text = String::from_utf8(received.to_vec()).unwrap();
        assert!(text.contains("job_1_1"));
    }

    #[tokio::test]
    async fn a_full_subscriber_queue_is_dropped_not_blocking() {
        let (broadcaster, loop_) = Broadcaster::new();
        tokio::spawn(loop_.run());

        let mut slow_rx = broadcaster.subscribe().await.unwrap();
        tokio::task::yield_now().await;

        for i in 0..(SUBSCRIBER_CAPACITY + 5) {
            let mut job = Job::default();
            job.details.id = format!("job_1_{i}");
            broadcaster
                .publish(&BroadcastEvent::JobUpdated { job: Box::new(job) })
                .await
                .unwrap();
        }

        // The slow subscriber never drained; further publishes must not hang.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        drop(slow_rx.recv().await);
    }
}
