//! Cancellable background work with a single result hand-off
//!
//! Jobs run on an [`Executor`]; their result travels back through a one-slot
//! channel owned by a [`TaskHandle`]. Dropping the handle cancels the job and
//! drops the receiving end, so a superseded job can never deliver anything.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, TryRecvError};
use log::debug;

/// Cooperative cancellation flag shared between a handle and its job
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs off the calling thread (or not, see [`InlineExecutor`])
pub trait Executor {
    fn execute(&self, job: Job);
}

/// Worker pool sized to the machine's cores
pub struct ThreadPoolExecutor {
    pool: rayon::ThreadPool,
}

impl ThreadPoolExecutor {
    pub fn new() -> Result<Self, rayon::ThreadPoolBuildError> {
        Self::with_threads(num_cpus::get())
    }

    pub fn with_threads(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("mapcluster-worker-{}", i))
            .build()?;
        Ok(Self { pool })
    }
}

impl Executor for ThreadPoolExecutor {
    fn execute(&self, job: Job) {
        self.pool.spawn(job);
    }
}

/// Runs every job to completion inside `execute`
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }
}

/// Outcome of checking a task for its result
#[derive(Debug)]
pub enum TaskPoll<R> {
    Ready(R),
    Pending,
    /// The job finished without a result (cancelled or dropped by the executor)
    Abandoned,
}

/// Owner's side of one background job
pub struct TaskHandle<R> {
    generation: u64,
    cancel: CancelToken,
    receiver: Receiver<R>,
}

impl<R: Send + 'static> TaskHandle<R> {
    /// Dispatches `work` on `executor`
    ///
    /// `work` gets the task's cancel token and returns `None` when it noticed
    /// cancellation.
    pub fn spawn<F>(executor: &dyn Executor, generation: u64, work: F) -> Self
    where
        F: FnOnce(&CancelToken) -> Option<R> + Send + 'static,
    {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        let cancel = CancelToken::new();
        let token = cancel.clone();
        executor.execute(Box::new(move || {
            if token.is_cancelled() {
                return;
            }
            if let Some(result) = work(&token) {
                if !token.is_cancelled() {
                    // The receiver may already be gone; that is a cancellation too.
                    let _ = sender.send(result);
                }
            }
        }));
        Self {
            generation,
            cancel,
            receiver,
        }
    }
}

impl<R> TaskHandle<R> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Non-blocking check for the job's result
    pub fn try_take(&self) -> TaskPoll<R> {
        match self.receiver.try_recv() {
            Ok(result) => TaskPoll::Ready(result),
            Err(TryRecvError::Empty) => TaskPoll::Pending,
            Err(TryRecvError::Disconnected) => TaskPoll::Abandoned,
        }
    }
}

impl<R> Drop for TaskHandle<R> {
    fn drop(&mut self) {
        if !self.cancel.is_cancelled() {
            debug!("releasing task #{}", self.generation);
        }
        self.cancel.cancel();
    }
}
