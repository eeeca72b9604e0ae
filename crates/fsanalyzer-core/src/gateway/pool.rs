/// Fixed-size worker pool with a two-phase shutdown.
///
/// Workers pull boxed jobs from one shared unbounded crossbeam channel, so
/// submission never blocks and idle workers pick up the next job. The pool
/// moves through `accepting → shutting down → closed`; the only mutable
/// shared state is the sender slot (taken on shutdown) and the cancel token.
///
/// # Shutdown
///
/// 1. The sender is dropped: new submissions fail, queued jobs still run.
/// 2. Wait up to the grace period for every worker to drain and exit. Each
///    worker holds a clone of an exit channel sender, so the channel
///    disconnects exactly when the last worker has returned.
/// 3. If the grace period expires, the shared [`CancelToken`] is tripped:
///    running listings and walks stop at their next poll and queued jobs
///    are discarded (their handles resolve as cancelled). Workers get
///    [`FORCED_STOP_TIMEOUT`] to return; any still busy after that (stuck
///    in a blocking syscall) are detached rather than joined.
use crate::error::GatewayClosedError;
use crate::scanner::CancelToken;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long a forced shutdown waits for cancelled workers to return.
pub const FORCED_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// A unit of work. Receives the pool's cancel token.
pub type Job = Box<dyn FnOnce(&CancelToken) + Send + 'static>;

/// How a call to [`WorkerPool::shutdown`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every queued and running job finished within the grace period.
    Graceful,
    /// The grace period expired and outstanding work was cancelled.
    Forced,
    /// The pool had already been shut down.
    AlreadyClosed,
}

pub struct WorkerPool {
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    exit_rx: Receiver<()>,
    cancel: CancelToken,
    size: usize,
}

impl WorkerPool {
    /// Spawn `size` named worker threads.
    pub fn new(size: usize) -> io::Result<Self> {
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
        let (exit_tx, exit_rx) = crossbeam_channel::bounded::<()>(0);
        let cancel = CancelToken::new();

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let jobs = job_rx.clone();
            let exit = exit_tx.clone();
            let token = cancel.clone();
            let handle = thread::Builder::new()
                .name(format!("fsanalyzer-worker-{id}"))
                .spawn(move || worker_loop(id, jobs, token, exit))?;
            workers.push(handle);
        }
        debug!("Worker pool started with {size} threads");

        Ok(Self {
            sender: Mutex::new(Some(job_tx)),
            workers: Mutex::new(workers),
            exit_rx,
            cancel,
            size,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Queue a job. Fails once shutdown has begun.
    pub fn submit(&self, job: Job) -> Result<(), GatewayClosedError> {
        match self.sender.lock().as_ref() {
            Some(tx) => tx.send(job).map_err(|_| GatewayClosedError),
            None => Err(GatewayClosedError),
        }
    }

    /// Stop accepting work, wait up to `grace` for it to drain, then cancel
    /// whatever is left. Safe to call more than once.
    pub fn shutdown(&self, grace: Duration) -> ShutdownOutcome {
        let Some(sender) = self.sender.lock().take() else {
            debug!("Worker pool already shut down");
            return ShutdownOutcome::AlreadyClosed;
        };
        drop(sender);
        info!("Shutting down worker pool ({} threads)", self.size);

        if self.wait_for_exit(Instant::now() + grace) {
            self.join_workers();
            info!("Worker pool stopped");
            return ShutdownOutcome::Graceful;
        }

        warn!(
            "Workers did not finish within {:?}, cancelling outstanding tasks",
            grace
        );
        self.cancel.cancel();

        if self.wait_for_exit(Instant::now() + FORCED_STOP_TIMEOUT) {
            self.join_workers();
            info!("Worker pool stopped after cancellation");
        } else {
            let stuck = self.workers.lock().drain(..).count();
            warn!("Detaching {stuck} worker threads that ignored cancellation");
        }
        ShutdownOutcome::Forced
    }

    /// `true` once every worker has returned, `false` if `deadline` passed first.
    fn wait_for_exit(&self, deadline: Instant) -> bool {
        loop {
            match self.exit_rx.recv_deadline(deadline) {
                Err(RecvTimeoutError::Disconnected) => return true,
                Err(RecvTimeoutError::Timeout) => return false,
                Ok(()) => continue,
            }
        }
    }

    fn join_workers(&self) {
        for handle in self.workers.lock().drain(..) {
            if handle.join().is_err() {
                warn!("A worker thread panicked during shutdown");
            }
        }
    }

    /// Stop accepting work and cancel everything without waiting.
    pub fn abort(&self) {
        if self.sender.lock().take().is_some() {
            debug!("Worker pool aborted");
        }
        self.cancel.cancel();
    }
}

fn worker_loop(id: usize, jobs: Receiver<Job>, cancel: CancelToken, _exit: Sender<()>) {
    debug!("Worker {id} started");
    // Ends once the sender is gone and the queue is empty.
    for job in jobs.iter() {
        if cancel.is_cancelled() {
            // Dropping the job drops its completer, which reports cancellation.
            drop(job);
            continue;
        }
        job(&cancel);
    }
    debug!("Worker {id} exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn runs_every_job_before_graceful_shutdown() {
        let pool = WorkerPool::new(3).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            let c = counter.clone();
            pool.submit(Box::new(move |_: &CancelToken| {
                c.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        }
        assert_eq!(pool.shutdown(Duration::from_secs(30)), ShutdownOutcome::Graceful);
        assert_eq!(counter.load(Ordering::SeqCst), 50);
    }

    #[test]
    fn submit_after_shutdown_fails() {
        let pool = WorkerPool::new(1).unwrap();
        pool.shutdown(Duration::from_secs(5));
        assert!(pool.is_closed());
        assert_eq!(pool.submit(Box::new(|_: &CancelToken| {})), Err(GatewayClosedError));
    }

    #[test]
    fn second_shutdown_is_a_no_op() {
        let pool = WorkerPool::new(2).unwrap();
        assert_eq!(pool.shutdown(Duration::from_secs(5)), ShutdownOutcome::Graceful);
        assert_eq!(pool.shutdown(Duration::from_secs(5)), ShutdownOutcome::AlreadyClosed);
    }

    #[test]
    fn expired_grace_period_cancels_running_job() {
        let pool = WorkerPool::new(1).unwrap();
        let (started_tx, started_rx) = crossbeam_channel::bounded(1);
        pool.submit(Box::new(move |cancel: &CancelToken| {
            started_tx.send(()).unwrap();
            while !cancel.is_cancelled() {
                thread::sleep(Duration::from_millis(5));
            }
        }))
        .unwrap();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        assert_eq!(pool.shutdown(Duration::from_millis(50)), ShutdownOutcome::Forced);
    }

    #[test]
    fn forced_shutdown_discards_queued_jobs() {
        let pool = WorkerPool::new(1).unwrap();
        let (started_tx, started_rx) = crossbeam_channel::bounded(1);
        let ran = Arc::new(AtomicUsize::new(0));

        pool.submit(Box::new(move |cancel: &CancelToken| {
            started_tx.send(()).unwrap();
            while !cancel.is_cancelled() {
                thread::sleep(Duration::from_millis(5));
            }
        }))
        .unwrap();
        for _ in 0..5 {
            let ran = ran.clone();
            pool.submit(Box::new(move |_: &CancelToken| {
                ran.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        }
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        assert_eq!(pool.shutdown(Duration::from_millis(50)), ShutdownOutcome::Forced);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    /// A job that never looks at the token cannot hold shutdown hostage.
    #[test]
    fn forced_shutdown_detaches_unresponsive_worker() {
        let pool = WorkerPool::new(1).unwrap();
        let (started_tx, started_rx) = crossbeam_channel::bounded(1);
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(1);
        pool.submit(Box::new(move |_: &CancelToken| {
            started_tx.send(()).unwrap();
            let _ = release_rx.recv_timeout(Duration::from_secs(60));
        }))
        .unwrap();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let start = Instant::now();
        assert_eq!(pool.shutdown(Duration::from_millis(50)), ShutdownOutcome::Forced);
        assert!(start.elapsed() < FORCED_STOP_TIMEOUT + Duration::from_secs(5));
        release_tx.send(()).unwrap();
    }
}
