/// Promise-style result slot shared between a worker and the caller.
///
/// The worker side holds a [`Completer`], the caller a [`TaskHandle`].
/// The handle can block on the result, poll it once per frame, attach a
/// continuation, or simply be dropped to abandon the result.
///
/// A `Completer` that is dropped without completing (the job was discarded
/// by a forced shutdown) resolves its handle with [`TaskError::Cancelled`],
/// so a waiter can never hang on a task that will not run.
use crate::error::TaskError;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

type Continuation<T> = Box<dyn FnOnce(Result<T, TaskError>) + Send + 'static>;

enum Slot<T> {
    /// Still running; holds the continuation if one was attached.
    Pending(Option<Continuation<T>>),
    Ready(Result<T, TaskError>),
    /// Result handed out, either to the caller or to a continuation.
    Taken,
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Shared<T> {
    fn complete(&self, result: Result<T, TaskError>) {
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Pending(Some(continuation)) => {
                // Run outside the lock so the continuation may touch the handle's peers.
                drop(slot);
                continuation(result);
            }
            Slot::Pending(None) => {
                *slot = Slot::Ready(result);
                self.ready.notify_all();
            }
            done => *slot = done,
        }
    }
}

/// Create a connected completer/handle pair.
pub fn task_pair<T>() -> (Completer<T>, TaskHandle<T>) {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot::Pending(None)),
        ready: Condvar::new(),
    });
    (
        Completer {
            shared: Some(shared.clone()),
        },
        TaskHandle { shared },
    )
}

/// Worker-side end of a task. Completes exactly once.
pub struct Completer<T> {
    shared: Option<Arc<Shared<T>>>,
}

impl<T> Completer<T> {
    pub fn complete(mut self, result: Result<T, TaskError>) {
        if let Some(shared) = self.shared.take() {
            shared.complete(result);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            shared.complete(Err(TaskError::Cancelled));
        }
    }
}

/// Caller-side end of a submitted task.
pub struct TaskHandle<T> {
    shared: Arc<Shared<T>>,
}

impl<T> TaskHandle<T> {
    /// `true` once a result is available (or has already been taken).
    pub fn is_finished(&self) -> bool {
        !matches!(*self.shared.slot.lock(), Slot::Pending(_))
    }

    /// Block until the task finishes.
    pub fn wait(self) -> Result<T, TaskError> {
        let mut slot = self.shared.slot.lock();
        while matches!(*slot, Slot::Pending(_)) {
            self.shared.ready.wait(&mut slot);
        }
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Ready(result) => result,
            _ => Err(TaskError::Cancelled),
        }
    }

    /// Block for at most `timeout`. Returns `None` if the task is still
    /// running or its result was already taken.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<Result<T, TaskError>> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.shared.slot.lock();
        while matches!(*slot, Slot::Pending(_)) {
            if self.shared.ready.wait_until(&mut slot, deadline).timed_out() {
                break;
            }
        }
        Self::take_ready(&mut slot)
    }

    /// Non-blocking poll. Yields the result once; `None` afterwards.
    pub fn try_take(&mut self) -> Option<Result<T, TaskError>> {
        let mut slot = self.shared.slot.lock();
        Self::take_ready(&mut slot)
    }

    /// Attach a continuation.
    ///
    /// Runs on the worker thread that completes the task, or right away on
    /// the calling thread if the result is already available.
    pub fn then<F>(self, f: F)
    where
        F: FnOnce(Result<T, TaskError>) + Send + 'static,
    {
        let mut slot = self.shared.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Ready(result) => {
                drop(slot);
                f(result);
            }
            Slot::Pending(_) => *slot = Slot::Pending(Some(Box::new(f))),
            Slot::Taken => {}
        }
    }

    fn take_ready(slot: &mut Slot<T>) -> Option<Result<T, TaskError>> {
        if !matches!(slot, Slot::Ready(_)) {
            return None;
        }
        match std::mem::replace(slot, Slot::Taken) {
            Slot::Ready(result) => Some(result),
            _ => None,
        }
    }
}
