// src/executor/pool.rs
use super::{Job, RejectedJob, ShutdownReport};
use crate::config::WorkerPoolConfig;
use futures::FutureExt;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Fixed-size worker pool fed from a FIFO queue.
///
/// Submission policy:
/// 1. fewer than `min` workers alive: start a worker with the job;
/// 2. else queue the job if an idle worker can take it or the backlog has room;
/// 3. else start an extra worker while fewer than `max` are alive;
/// 4. else reject.
///
/// Workers beyond `min` retire after `keep_alive` without work.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: JoinSet<()>,
}

struct Shared {
    min: usize,
    max: usize,
    keep_alive: Duration,
    capacity: Option<usize>,
    queue: Mutex<VecDeque<Job>>,
    notify: Notify,
    live: AtomicUsize,
    idle: AtomicUsize,
    shutdown: AtomicBool,
}

impl Shared {
    fn queue(&self) -> MutexGuard<'_, VecDeque<Job>> {
        // Jobs never run under this lock, so a poisoned guard still holds a sound queue.
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_job(&self) -> Option<Job> {
        self.queue().pop_front()
    }

    /// Gives up this worker's slot if the pool is above its core size.
    fn try_retire(&self) -> bool {
        let mut live = self.live.load(Ordering::SeqCst);
        while live > self.min {
            match self
                .live
                .compare_exchange(live, live - 1, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return true,
                Err(current) => live = current,
            }
        }
        false
    }
}

impl WorkerPool {
    pub fn new(config: &WorkerPoolConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                min: config.min_pool_size(),
                max: config.max_pool_size(),
                keep_alive: config.keep_alive(),
                capacity: config.queue_capacity(),
                queue: Mutex::new(VecDeque::new()),
                notify: Notify::new(),
                live: AtomicUsize::new(0),
                idle: AtomicUsize::new(0),
                shutdown: AtomicBool::new(false),
            }),
            workers: JoinSet::new(),
        }
    }

    pub fn execute(&mut self, job: Job) -> Result<(), RejectedJob> {
        if self.shared.shutdown.load(Ordering::SeqCst) {
            return Err(RejectedJob::ShutDown);
        }
        self.reap_finished();

        if self.live_workers() < self.shared.min {
            self.spawn_worker(job);
            return Ok(());
        }

        let job = {
            let mut queue = self.shared.queue();
            let idle = self.shared.idle.load(Ordering::SeqCst);
            let has_room = match self.shared.capacity {
                None => true,
                Some(capacity) => queue.len() < capacity + idle,
            };
            if has_room {
                queue.push_back(job);
                None
            } else {
                Some(job)
            }
        };

        let Some(job) = job else {
            self.shared.notify.notify_one();
            return Ok(());
        };

        if self.live_workers() < self.shared.max {
            self.spawn_worker(job);
            return Ok(());
        }

        Err(RejectedJob::Saturated)
    }

    pub fn live_workers(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }

    pub fn idle_workers(&self) -> usize {
        self.shared.idle.load(Ordering::SeqCst)
    }

    pub fn queued(&self) -> usize {
        self.shared.queue().len()
    }

    /// Stops intake, lets workers finish running and queued jobs for up to
    /// `grace_period`, then aborts whatever is left.
    pub async fn shutdown(&mut self, grace_period: Duration) -> ShutdownReport {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        self.shared.notify.notify_waiters();

        let drained = tokio::time::timeout(grace_period, async {
            while let Some(result) = self.workers.join_next().await {
                if let Err(e) = result {
                    error!("Pool worker failed: {}", e);
                }
            }
        })
        .await;

        if drained.is_ok() {
            return ShutdownReport::default();
        }

        let busy = self
            .live_workers()
            .saturating_sub(self.idle_workers());
        let dropped = {
            let mut queue = self.shared.queue();
            let dropped = queue.len();
            queue.clear();
            dropped
        };
        self.workers.abort_all();
        while self.workers.join_next().await.is_some() {}

        warn!(
            "Workers didn't finish in {:?}, forcing shutdown ({} running, {} queued)",
            grace_period, busy, dropped
        );

        ShutdownReport {
            forced: true,
            cancelled: busy + dropped,
        }
    }

    fn spawn_worker(&mut self, first_job: Job) {
        self.shared.live.fetch_add(1, Ordering::SeqCst);
        let shared = self.shared.clone();
        self.workers.spawn(worker_loop(shared, first_job));
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.workers.try_join_next() {
            if let Err(e) = result {
                error!("Pool worker failed: {}", e);
            }
        }
    }
}

async fn worker_loop(shared: Arc<Shared>, first_job: Job) {
    let mut next = Some(first_job);

    loop {
        if let Some(job) = next.take() {
            run_job(job).await;
        }

        if let Some(job) = shared.take_job() {
            next = Some(job);
            continue;
        }
        if shared.shutdown.load(Ordering::SeqCst) {
            break;
        }

        // Register interest before the final re-check so a push or a
        // shutdown in between still wakes us.
        let notified = shared.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if let Some(job) = shared.take_job() {
            next = Some(job);
            continue;
        }
        if shared.shutdown.load(Ordering::SeqCst) {
            break;
        }

        shared.idle.fetch_add(1, Ordering::SeqCst);
        let woken = if shared.live.load(Ordering::SeqCst) > shared.min {
            tokio::time::timeout(shared.keep_alive, notified.as_mut())
                .await
                .is_ok()
        } else {
            notified.as_mut().await;
            true
        };
        shared.idle.fetch_sub(1, Ordering::SeqCst);

        if !woken {
            if let Some(job) = shared.take_job() {
                next = Some(job);
                continue;
            }
            if shared.try_retire() {
                debug!("Idle worker retired after {:?}", shared.keep_alive);
                return;
            }
        }
    }

    shared.live.fetch_sub(1, Ordering::SeqCst);
}

async fn run_job(job: Job) {
    if AssertUnwindSafe(job).catch_unwind().await.is_err() {
        error!("Connection job panicked; worker continues");
    }
}
