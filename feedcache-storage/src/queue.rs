//! Per-store operation queue.
//!
//! One worker task per store pulls jobs off an unbounded channel in
//! submission order. Reads are handed to the blocking pool and may overlap;
//! a write waits for every outstanding read, then runs alone before the
//! next job is looked at.

use feedcache_core::StoreOperationKind;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::traits::{StoreOperation, StoreResult};

/// How a job touches the underlying medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// May run alongside other reads.
    Read,
    /// Runs exclusively, after everything submitted before it.
    Write,
}

impl From<StoreOperationKind> for Access {
    fn from(operation: StoreOperationKind) -> Self {
        match operation {
            StoreOperationKind::Retrieve => Self::Read,
            StoreOperationKind::Insert | StoreOperationKind::Delete => Self::Write,
        }
    }
}

struct Job {
    access: Access,
    operation: StoreOperationKind,
    run: Box<dyn FnOnce() + Send + 'static>,
}

/// Serializes the operations of one store.
///
/// Dropping the queue closes the channel; jobs already accepted still run
/// and the worker exits once they are done.
#[derive(Debug)]
pub struct OperationQueue {
    sender: mpsc::UnboundedSender<Job>,
    name: &'static str,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("access", &self.access)
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

impl OperationQueue {
    /// Start the worker for a store named `name` on `runtime`.
    pub fn spawn(name: &'static str, runtime: &Handle) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        runtime.spawn(drive(name, receiver));
        Self { sender, name }
    }

    /// Enqueue `work` and return the operation that resolves with its result.
    ///
    /// The job is accepted before this returns. If the worker has already
    /// stopped (its runtime shut down), the operation resolves to
    /// `Interrupted`.
    pub fn submit<T, F>(&self, operation: StoreOperationKind, work: F) -> StoreOperation<T>
    where
        T: Send + 'static,
        F: FnOnce() -> StoreResult<T> + Send + 'static,
    {
        let (completion, pending) = StoreOperation::channel(operation);
        let job = Job {
            access: Access::from(operation),
            operation,
            run: Box::new(move || {
                completion.complete(work());
            }),
        };

        if self.sender.send(job).is_err() {
            tracing::warn!(
                store = self.name,
                %operation,
                "Store worker stopped; operation dropped"
            );
        }
        pending
    }
}

async fn drive(name: &'static str, mut receiver: mpsc::UnboundedReceiver<Job>) {
    let mut readers: JoinSet<()> = JoinSet::new();

    while let Some(job) = receiver.recv().await {
        while let Some(finished) = readers.try_join_next() {
            log_panic(name, StoreOperationKind::Retrieve, finished);
        }

        tracing::trace!(store = name, operation = %job.operation, "Running store operation");

        match job.access {
            Access::Read => {
                readers.spawn_blocking(job.run);
            }
            Access::Write => {
                while let Some(finished) = readers.join_next().await {
                    log_panic(name, StoreOperationKind::Retrieve, finished);
                }
                let finished = tokio::task::spawn_blocking(job.run).await;
                log_panic(name, job.operation, finished);
            }
        }
    }

    while let Some(finished) = readers.join_next().await {
        log_panic(name, StoreOperationKind::Retrieve, finished);
    }
    tracing::debug!(store = name, "Store worker stopped");
}

fn log_panic(
    name: &'static str,
    operation: StoreOperationKind,
    finished: Result<(), tokio::task::JoinError>,
) {
    if let Err(e) = finished {
        tracing::error!(store = name, %operation, error = %e, "Store operation panicked");
    }
}
