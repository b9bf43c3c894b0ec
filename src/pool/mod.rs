//! Persistent worker threads for encode+write jobs.
//!
//! `run` never blocks on capacity. A job goes, in order of preference, to a
//! one-off overflow thread when the pool is saturated, to an idle worker, to
//! any worker with an empty queue, or round-robin onto a busy worker's queue.
//! Every queue is unbounded, so no step waits on a slot.
//!
//! Bookkeeping lives behind one `parking_lot` mutex held only while choosing a
//! worker, never while a job runs. A finished job always decrements the
//! in-flight count, panics included.

use crate::internal;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, mpsc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Unit of work; owns everything it touches so it can move to any thread.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker count of [`WorkerPool::shared`] and of `PoolConfig::default()`.
pub const DEFAULT_POOL_SIZE: usize = 8;
/// Overflow threads allowed at once before jobs start queuing on workers.
pub const DEFAULT_MAX_OVERFLOW: usize = 64;

/// Sizing of a [`WorkerPool`]. Fixed once the pool is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Persistent workers; at least one is always started.
    pub size: usize,
    /// In-flight jobs above this count go to overflow threads.
    pub overflow_threshold: usize,
    /// Concurrent overflow threads; past this, jobs queue on workers.
    pub max_overflow: usize,
}

impl PoolConfig {
    /// `size` workers, overflowing once every worker has a job.
    #[must_use]
    pub const fn with_size(size: usize) -> Self {
        Self {
            size,
            overflow_threshold: size,
            max_overflow: DEFAULT_MAX_OVERFLOW,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::with_size(DEFAULT_POOL_SIZE)
    }
}

#[derive(Debug)]
struct PoolState {
    in_flight: usize,
    cursor: usize,
    /// Workers that went idle, oldest first. May hold stale entries.
    idle: VecDeque<usize>,
    /// Jobs handed to each worker and not yet finished.
    queued: Vec<usize>,
    overflow_active: usize,
    completed: u64,
}

#[derive(Debug)]
struct Shared {
    config: PoolConfig,
    state: Mutex<PoolState>,
    drained: Condvar,
}

impl Shared {
    fn finish(&self, state: &mut PoolState) {
        state.in_flight = state.in_flight.saturating_sub(1);
        state.completed += 1;
        if state.in_flight == 0 {
            self.drained.notify_all();
        }
    }
}

/// Fixed set of named worker threads plus bounded one-off overflow threads.
///
/// Jobs are never dropped: a job that cannot get a worker or an overflow
/// thread queues, and a job whose worker is gone runs on overflow.
pub struct WorkerPool {
    shared: Arc<Shared>,
    senders: Vec<mpsc::Sender<Job>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `config.size` workers (at least one) right away.
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        let size = config.size.max(1);
        let config = PoolConfig { size, ..config };
        let shared = Arc::new(Shared {
            config,
            state: Mutex::new(PoolState {
                in_flight: 0,
                cursor: 0,
                idle: (0..size).collect(),
                queued: vec![0; size],
                overflow_active: 0,
                completed: 0,
            }),
            drained: Condvar::new(),
        });

        let mut senders = Vec::with_capacity(size);
        let mut handles = Vec::with_capacity(size);
        for index in 0..size {
            let (sender, receiver) = mpsc::channel::<Job>();
            let worker_shared = Arc::clone(&shared);
            match thread::Builder::new()
                .name(format!("jlog-worker-{index}"))
                .spawn(move || worker_loop(index, &receiver, &worker_shared))
            {
                Ok(handle) => handles.push(handle),
                // The receiver is gone with the closure; sends to this slot
                // fail and are rerouted to overflow.
                Err(e) => internal::error("POOL", &format!("failed to spawn worker {index}: {e}")),
            }
            senders.push(sender);
        }
        internal::debug(
            "POOL",
            &format!(
                "started {} workers (overflow above {}, at most {})",
                handles.len(),
                config.overflow_threshold,
                config.max_overflow
            ),
        );

        Self {
            shared,
            senders,
            handles,
        }
    }

    /// Lazily created pool shared by every logger that does not bring its own.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<WorkerPool>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(Self::new(PoolConfig::default()))))
    }

    /// Schedules `job` and returns without waiting for capacity.
    pub fn run(&self, job: Job) {
        let config = self.shared.config;
        let mut state = self.shared.state.lock();
        state.in_flight += 1;

        if state.in_flight > config.overflow_threshold && state.overflow_active < config.max_overflow
        {
            state.overflow_active += 1;
            drop(state);
            self.spawn_overflow(job);
            return;
        }

        let index = pick_worker(&mut state);
        state.queued[index] += 1;
        if let Err(mpsc::SendError(job)) = self.senders[index].send(job) {
            state.queued[index] -= 1;
            state.overflow_active += 1;
            drop(state);
            internal::warn("POOL", &format!("worker {index} is gone, running job on overflow"));
            self.spawn_overflow(job);
        }
    }

    fn spawn_overflow(&self, job: Job) {
        let slot = Arc::new(Mutex::new(Some(job)));
        let thread_slot = Arc::clone(&slot);
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("jlog-overflow".into())
            .spawn(move || {
                let job = thread_slot.lock().take();
                if let Some(job) = job {
                    execute(job);
                }
                let mut state = shared.state.lock();
                state.overflow_active = state.overflow_active.saturating_sub(1);
                shared.finish(&mut state);
            });

        if let Err(e) = spawned {
            // Forward progress over isolation: run it here.
            internal::warn("POOL", &format!("overflow spawn failed, running inline: {e}"));
            let job = slot.lock().take();
            if let Some(job) = job {
                execute(job);
            }
            let mut state = self.shared.state.lock();
            state.overflow_active = state.overflow_active.saturating_sub(1);
            self.shared.finish(&mut state);
        }
    }

    /// Blocks until every submitted job has finished.
    ///
    /// Must not be called from inside a job of the same pool.
    pub fn wait_idle(&self) {
        let mut state = self.shared.state.lock();
        while state.in_flight > 0 {
            self.shared.drained.wait(&mut state);
        }
    }

    /// Like [`wait_idle`](Self::wait_idle), giving up after `timeout`.
    /// Returns whether the pool drained.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let mut state = self.shared.state.lock();
        while state.in_flight > 0 {
            if self.shared.drained.wait_for(&mut state, timeout).timed_out() {
                return state.in_flight == 0;
            }
        }
        true
    }

    /// Jobs submitted and not yet finished, queued ones included.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.shared.state.lock().in_flight
    }

    /// Jobs finished since the pool started, panicked ones included.
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.shared.state.lock().completed
    }

    /// Overflow threads currently running a job.
    #[must_use]
    pub fn overflow_active(&self) -> usize {
        self.shared.state.lock().overflow_active
    }

    /// Persistent worker count, after the minimum of one is applied.
    #[must_use]
    pub fn size(&self) -> usize {
        self.shared.config.size
    }

    /// Effective configuration, with `size` already clamped.
    #[must_use]
    pub fn config(&self) -> PoolConfig {
        self.shared.config
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("config", &self.shared.config)
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the queues ends each worker loop once its backlog is done.
        self.senders.clear();
        let current = thread::current().id();
        for handle in self.handles.drain(..) {
            // A job holding the last reference drops the pool on its own worker.
            if handle.thread().id() == current {
                continue;
            }
            let _ = handle.join();
        }
    }
}

/// Idle FIFO first, then any worker with an empty queue, then round-robin.
fn pick_worker(state: &mut PoolState) -> usize {
    while let Some(index) = state.idle.pop_front() {
        if state.queued[index] == 0 {
            return index;
        }
    }
    if let Some(index) = state.queued.iter().position(|queued| *queued == 0) {
        return index;
    }
    state.cursor = (state.cursor + 1) % state.queued.len();
    state.cursor
}

fn worker_loop(index: usize, jobs: &mpsc::Receiver<Job>, shared: &Shared) {
    while let Ok(job) = jobs.recv() {
        execute(job);
        let mut state = shared.state.lock();
        state.queued[index] = state.queued[index].saturating_sub(1);
        if state.queued[index] == 0 {
            state.idle.push_back(index);
        }
        shared.finish(&mut state);
    }
}

fn execute(job: Job) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        internal::error("POOL", &format!("job panicked: {reason}"));
    }
}
