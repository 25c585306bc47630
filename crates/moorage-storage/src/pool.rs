use crate::StorageError;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

type Task = Box<dyn FnOnce() + Send + 'static>;

const WORKER_COUNT: usize = 4;

/// Fixed-size worker pool running best-effort storage cleanup tasks.
///
/// Tasks for different workspaces may run concurrently; tasks for the same
/// workspace are not mutually exclusive, no per-workspace lock is taken.
/// Shutdown stops intake, drains for a grace period, then sets the cancel
/// flag and abandons whatever is still in flight.
pub struct CleanupPool {
    sender: Mutex<Option<mpsc::Sender<Task>>>,
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
    cancel: Arc<AtomicBool>,
}

impl CleanupPool {
    pub fn new() -> Self {
        Self::with_workers(WORKER_COUNT)
    }

    pub fn with_workers(count: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Task>();
        let receiver = Arc::new(Mutex::new(receiver));
        let cancel = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(count);
        for index in 0..count {
            let receiver = Arc::clone(&receiver);
            let cancel = Arc::clone(&cancel);
            workers.push(
                thread::Builder::new()
                    .name(format!("storage-cleanup-{index}"))
                    .spawn(move || loop {
                        if cancel.load(Ordering::Relaxed) {
                            break;
                        }
                        let task = {
                            let guard = receiver.lock().expect("cleanup queue lock");
                            guard.recv()
                        };
                        match task {
                            Ok(task) => {
                                // A panicking task must not take the worker
                                // with it.
                                if std::panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                                    warn!("cleanup task panicked");
                                }
                            }
                            // Channel closed, intake has stopped.
                            Err(_) => break,
                        }
                    })
                    .expect("spawn cleanup worker"),
            );
        }

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            cancel,
        }
    }

    /// Shared flag set on forced shutdown; long-running tasks may poll it.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Submit a task; fails once the pool has shut down.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) -> Result<(), StorageError> {
        let guard = self.sender.lock().expect("cleanup sender lock");
        let sender = guard.as_ref().ok_or(StorageError::PoolShutDown)?;
        sender
            .send(Box::new(task))
            .map_err(|_| StorageError::PoolShutDown)
    }

    /// Stop intake, drain for up to `grace`, then force-cancel the rest.
    ///
    /// Forced cancellation may abandon an in-flight job pod watch without
    /// guaranteeing pod deletion.
    pub fn shutdown(&self, grace: Duration) {
        // Dropping the sender closes the channel; idle workers exit.
        self.sender.lock().expect("cleanup sender lock").take();

        let mut workers = self.workers.lock().expect("cleanup workers lock");
        let deadline = Instant::now() + grace;
        while workers.iter().any(|w| !w.is_finished()) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }

        if workers.iter().any(|w| !w.is_finished()) {
            warn!("cleanup pool drain exceeded grace period, cancelling remaining tasks");
            self.cancel.store(true, Ordering::Relaxed);
        }

        for worker in workers.drain(..) {
            if worker.is_finished() {
                let _ = worker.join();
            }
            // Unfinished workers are abandoned; their cancel flag is set.
        }
        debug!("cleanup pool shut down");
    }
}

impl Default for CleanupPool {
    fn default() -> Self {
        Self::new()
    }
}
