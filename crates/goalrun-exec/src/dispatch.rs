//! Coordination-thread dispatch.
//!
//! Hosts commonly require scheduling calls to happen on one designated thread.
//! `Dispatcher` models that hand-off: `invoke_and_wait` returns only after the
//! closure has run on the coordination thread, so submission is a blocking
//! hand-off rather than fire-and-forget.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, JoinHandle, ThreadId};

use thiserror::Error;
use tracing::warn;

/// A closure marshaled onto the coordination thread.
pub type DispatchFn = Box<dyn FnOnce() + Send>;

/// Dispatch errors.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The coordination thread is no longer running.
    #[error("coordination thread is not running")]
    Stopped,

    /// The dispatched closure panicked. The coordination thread survives.
    #[error("dispatched closure panicked")]
    Panicked,
}

/// Marshals closures onto a designated coordination thread and waits for them.
pub trait Dispatcher: Send + Sync {
    /// Run `f` on the coordination thread, blocking until it has finished.
    fn invoke_and_wait(&self, f: DispatchFn) -> Result<(), DispatchError>;
}

/// Dispatcher that runs the closure directly on the calling thread.
///
/// For hosts without a single-thread scheduling requirement, and for tests.
#[derive(Debug, Default)]
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn invoke_and_wait(&self, f: DispatchFn) -> Result<(), DispatchError> {
        run_guarded(f)
    }
}

struct Dispatched {
    f: DispatchFn,
    done: mpsc::Sender<bool>,
}

/// A dedicated coordination thread draining a queue of closures.
///
/// Calls made from the coordination thread itself run inline instead of
/// deadlocking on their own queue. Dropping the dispatcher shuts the thread
/// down after the closures already queued have run.
pub struct CoordinationThread {
    tx: Option<mpsc::Sender<Dispatched>>,
    thread_id: ThreadId,
    handle: Option<JoinHandle<()>>,
}

impl CoordinationThread {
    /// Spawn the coordination thread.
    pub fn new() -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Dispatched>();

        let handle = thread::Builder::new()
            .name("goalrun-dispatch".to_owned())
            .spawn(move || {
                while let Ok(dispatched) = rx.recv() {
                    let ok = panic::catch_unwind(AssertUnwindSafe(dispatched.f)).is_ok();
                    // Receiver may have given up; nothing to do then.
                    let _ = dispatched.done.send(ok);
                }
            })?;

        Ok(Self {
            tx: Some(tx),
            thread_id: handle.thread().id(),
            handle: Some(handle),
        })
    }
}

impl Dispatcher for CoordinationThread {
    fn invoke_and_wait(&self, f: DispatchFn) -> Result<(), DispatchError> {
        // Re-entrant call: we are already on the coordination thread.
        if thread::current().id() == self.thread_id {
            return run_guarded(f);
        }

        let tx = self.tx.as_ref().ok_or(DispatchError::Stopped)?;
        let (done_tx, done_rx) = mpsc::channel();
        tx.send(Dispatched { f, done: done_tx })
            .map_err(|_| DispatchError::Stopped)?;

        match done_rx.recv() {
            Ok(true) => Ok(()),
            Ok(false) => Err(DispatchError::Panicked),
            Err(_) => Err(DispatchError::Stopped),
        }
    }
}

impl Drop for CoordinationThread {
    fn drop(&mut self) {
        // Closing the channel ends the drain loop.
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("coordination thread terminated abnormally");
            }
        }
    }
}

fn run_guarded(f: DispatchFn) -> Result<(), DispatchError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|_| DispatchError::Panicked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_inline_dispatch_runs_closure() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        InlineDispatcher
            .invoke_and_wait(Box::new(move || flag.store(true, Ordering::SeqCst)))
            .unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_coordination_runs_on_its_own_thread() {
        let dispatcher = CoordinationThread::new().unwrap();
        let caller = thread::current().id();
        let (tx, rx) = mpsc::channel();
        dispatcher
            .invoke_and_wait(Box::new(move || {
                tx.send(thread::current().id()).unwrap();
            }))
            .unwrap();
        assert_ne!(rx.recv().unwrap(), caller);
    }

    #[test]
    fn test_panicking_closure_reported_and_thread_survives() {
        let dispatcher = CoordinationThread::new().unwrap();
        let result = dispatcher.invoke_and_wait(Box::new(|| panic!("boom")));
        assert!(matches!(result, Err(DispatchError::Panicked)));

        // Thread must still be serving dispatches.
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        dispatcher
            .invoke_and_wait(Box::new(move || flag.store(true, Ordering::SeqCst)))
            .unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_reentrant_dispatch_does_not_deadlock() {
        let dispatcher = Arc::new(CoordinationThread::new().unwrap());
        let inner = dispatcher.clone();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        dispatcher
            .invoke_and_wait(Box::new(move || {
                inner
                    .invoke_and_wait(Box::new(move || flag.store(true, Ordering::SeqCst)))
                    .unwrap();
            }))
            .unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }
}
