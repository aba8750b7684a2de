// src/executor/mod.rs
mod per_task;
mod pool;

pub use per_task::TaskPerConnection;
pub use pool::WorkerPool;

use crate::config::{ExecutionStrategy, WorkerPoolConfig};
use futures::future::BoxFuture;
use std::time::Duration;
use thiserror::Error;

/// One opaque unit of connection-handling work.
pub type Job = BoxFuture<'static, ()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectedJob {
    #[error("worker pool is saturated")]
    Saturated,

    #[error("executor has been shut down")]
    ShutDown,
}

/// Outcome of draining an execution resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// The grace period elapsed and remaining work was aborted.
    pub forced: bool,
    /// Jobs aborted or dropped from the queue.
    pub cancelled: usize,
}

/// Where accepted connections run. Owned by exactly one acceptor.
pub enum ExecutionResource {
    PerTask(TaskPerConnection),
    Pool(WorkerPool),
}

impl ExecutionResource {
    pub fn execute(&mut self, job: Job) -> Result<(), RejectedJob> {
        match self {
            ExecutionResource::PerTask(executor) => executor.execute(job),
            ExecutionResource::Pool(pool) => pool.execute(job),
        }
    }

    /// Collects finished per-task entries. Pool workers clean up after
    /// themselves, so this is a no-op there.
    pub fn reap_finished(&mut self) {
        if let ExecutionResource::PerTask(executor) = self {
            executor.reap_finished();
        }
    }

    pub async fn shutdown(&mut self, grace_period: Duration) -> ShutdownReport {
        match self {
            ExecutionResource::PerTask(executor) => executor.shutdown(grace_period).await,
            ExecutionResource::Pool(pool) => pool.shutdown(grace_period).await,
        }
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        match self {
            ExecutionResource::PerTask(_) => ExecutionStrategy::LightweightPerTask,
            ExecutionResource::Pool(_) => ExecutionStrategy::BoundedPool,
        }
    }
}

impl std::fmt::Debug for ExecutionResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionResource::PerTask(executor) => f
                .debug_struct("PerTask")
                .field("in_flight", &executor.in_flight())
                .finish(),
            ExecutionResource::Pool(pool) => f
                .debug_struct("Pool")
                .field("live_workers", &pool.live_workers())
                .field("queued", &pool.queued())
                .finish(),
        }
    }
}

/// Builds the execution resource for one server run. Pure construction: no
/// tasks are spawned until the first job arrives.
pub fn create_execution_resource(config: &WorkerPoolConfig) -> ExecutionResource {
    match config.execution_strategy() {
        ExecutionStrategy::LightweightPerTask => {
            if config.is_customized() {
                tracing::warn!(
                    "Lightweight per-task execution is enabled. Pool configuration \
                     (min_pool_size={}, max_pool_size={}, queue_size={}, keep_alive_secs={}) \
                     will be ignored. Set execution_strategy to bounded_pool to use it.",
                    config.min_pool_size(),
                    config.max_pool_size(),
                    config.queue_size(),
                    config.keep_alive().as_secs()
                );
            }
            ExecutionResource::PerTask(TaskPerConnection::new())
        }
        ExecutionStrategy::BoundedPool => ExecutionResource::Pool(WorkerPool::new(config)),
    }
}
