//! Fixed-size pool of worker threads with one result handle per task.

use crate::error::{Error, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::debug;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker threads taking tasks from a shared FIFO queue.
///
/// Dropping the pool stops it: queued tasks are still executed, then the
/// workers are joined.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `threads` workers, at least one.
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let (sender, receiver) = unbounded::<Job>();
        let workers = (0..threads)
            .map(|i| {
                let receiver = receiver.clone();
                thread::Builder::new()
                    .name(format!("fgb-worker-{i}"))
                    .spawn(move || worker_loop(i, receiver))
            })
            .collect::<std::io::Result<Vec<_>>>()?;
        debug!("Started {threads} worker threads");
        Ok(WorkerPool {
            sender: Some(sender),
            workers,
        })
    }

    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Queues `task` and returns the handle its result is delivered to.
    pub fn submit<F, T>(&self, task: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(Error::PoolStopped)?;
        let (result_tx, result_rx) = bounded(1);
        let job: Job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(task))
                .map_err(|payload| Error::TaskFailed(panic_message(payload.as_ref())));
            // the handle may have been dropped
            let _ = result_tx.send(result);
        });
        sender.send(job).map_err(|_| Error::PoolStopped)?;
        Ok(TaskHandle {
            receiver: result_rx,
        })
    }

    /// Rejects further submissions, waits for queued tasks and joins the workers.
    pub fn shutdown(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        for worker in self.workers.drain(..) {
            let name = worker.thread().name().map(str::to_string);
            if worker.join().is_err() {
                debug!("Worker {name:?} terminated abnormally");
            }
        }
        debug!("Worker pool stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.sender.is_none()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(id: usize, receiver: Receiver<Job>) {
    // recv keeps returning queued jobs after the sender is gone
    while let Ok(job) = receiver.recv() {
        job();
    }
    debug!("Worker {id} exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}

/// Receives the result of exactly one task.
pub struct TaskHandle<T> {
    receiver: Receiver<Result<T>>,
}

impl<T> TaskHandle<T> {
    /// Blocks until the task has run. A panicking task yields [`Error::TaskFailed`].
    pub fn wait(self) -> Result<T> {
        self.receiver
            .recv()
            .map_err(|_| Error::TaskFailed("task dropped without result".to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn results_follow_submission_order() {
        let pool = WorkerPool::new(4).unwrap();
        let handles = (0..32u64)
            .map(|i| {
                pool.submit(move || {
                    // early tasks finish last
                    thread::sleep(Duration::from_millis((32 - i) % 7));
                    i * 10
                })
                .unwrap()
            })
            .collect::<Vec<_>>();
        let results = handles
            .into_iter()
            .map(|handle| handle.wait().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(results, (0..32u64).map(|i| i * 10).collect::<Vec<_>>());
    }

    #[test]
    fn panic_fails_only_its_own_task() {
        let pool = WorkerPool::new(1).unwrap();
        let before = pool.submit(|| 1).unwrap();
        let failing = pool.submit(|| -> i32 { panic!("corrupt geometry") }).unwrap();
        let after = pool.submit(|| 3).unwrap();

        assert_eq!(before.wait().unwrap(), 1);
        match failing.wait() {
            Err(Error::TaskFailed(message)) => assert_eq!(message, "corrupt geometry"),
            other => panic!("unexpected result {other:?}"),
        }
        // the single worker survived the panic
        assert_eq!(after.wait().unwrap(), 3);
    }

    #[test]
    fn submit_after_shutdown_fails() {
        let mut pool = WorkerPool::new(2).unwrap();
        assert_eq!(pool.threads(), 2);
        pool.shutdown();
        assert!(pool.is_stopped());
        assert!(matches!(pool.submit(|| ()), Err(Error::PoolStopped)));
        // shutting down twice is harmless
        pool.shutdown();
    }

    #[test]
    fn shutdown_drains_queued_tasks() {
        let completed = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(2).unwrap();
        let handles = (0..20)
            .map(|_| {
                let completed = completed.clone();
                pool.submit(move || {
                    thread::sleep(Duration::from_millis(2));
                    completed.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap()
            })
            .collect::<Vec<_>>();
        pool.shutdown();
        assert_eq!(completed.load(Ordering::SeqCst), 20);
        assert!(handles.into_iter().all(|handle| handle.wait().is_ok()));
    }

    #[test]
    fn zero_threads_is_clamped() {
        let pool = WorkerPool::new(0).unwrap();
        assert_eq!(pool.threads(), 1);
        assert_eq!(pool.submit(|| "done").unwrap().wait().unwrap(), "done");
    }
}
