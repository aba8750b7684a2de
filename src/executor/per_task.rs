// src/executor/per_task.rs
use super::{Job, RejectedJob, ShutdownReport};
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, warn};

/// Spawns one tokio task per job. No queue, no ceiling.
#[derive(Debug)]
pub struct TaskPerConnection {
    tasks: JoinSet<()>,
    shut_down: bool,
}

impl TaskPerConnection {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
            shut_down: false,
        }
    }

    pub fn execute(&mut self, job: Job) -> Result<(), RejectedJob> {
        if self.shut_down {
            return Err(RejectedJob::ShutDown);
        }
        self.reap_finished();
        self.tasks.spawn(job);
        Ok(())
    }

    /// Tasks spawned and not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    pub async fn shutdown(&mut self, grace_period: Duration) -> ShutdownReport {
        self.shut_down = true;

        let drained = tokio::time::timeout(grace_period, async {
            while let Some(result) = self.tasks.join_next().await {
                log_join_result(result);
            }
        })
        .await;

        if drained.is_ok() {
            return ShutdownReport::default();
        }

        let cancelled = self.tasks.len();
        warn!(
            "{} connection tasks did not finish within {:?}, cancelling",
            cancelled, grace_period
        );
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}

        ShutdownReport {
            forced: true,
            cancelled,
        }
    }

    /// Drops bookkeeping for tasks that already finished, logging panics.
    pub fn reap_finished(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            log_join_result(result);
        }
    }
}

impl Default for TaskPerConnection {
    fn default() -> Self {
        Self::new()
    }
}

fn log_join_result(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            error!("Connection task panicked: {}", e);
        }
    }
}
