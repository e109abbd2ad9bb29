//! The synchronous job runner.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use goalrun_core::{JobSpec, RunMode};

use crate::context::ExecutionContext;
use crate::dispatch::{DispatchFn, Dispatcher};
use crate::prefs::{JobContext, RunModePrefs};
use crate::queue::{JobQueue, QueuedJob};

/// Submits a job to the asynchronous queue and blocks until its outcome.
///
/// All collaborators are injected; the runner owns nothing but the wiring.
/// Nothing escapes `run` as a panic or an error: the boolean return is the
/// sole outcome channel.
pub struct SyncJobRunner {
    context: Arc<dyn ExecutionContext>,
    queue: Arc<dyn JobQueue>,
    dispatcher: Arc<dyn Dispatcher>,
    prefs: Arc<dyn RunModePrefs>,
}

impl SyncJobRunner {
    /// Create a new runner over the given collaborators.
    pub fn new(
        context: Arc<dyn ExecutionContext>,
        queue: Arc<dyn JobQueue>,
        dispatcher: Arc<dyn Dispatcher>,
        prefs: Arc<dyn RunModePrefs>,
    ) -> Self {
        Self {
            context,
            queue,
            dispatcher,
            prefs,
        }
    }

    /// Run `body` as a titled job and wait for its boolean outcome.
    ///
    /// Submission is marshaled onto the coordination thread and the hand-off
    /// is awaited; the calling thread then blocks on the job's one-shot
    /// completion signal. There is no timeout on that wait and no way to
    /// cancel a submitted job.
    ///
    /// If the execution context is gone by the time the hand-off runs, the
    /// job is skipped and the host default outcome (`true`) is returned.
    ///
    /// Must not be called from inside an async runtime.
    pub fn run<F>(&self, title: &str, mode: RunMode, body: F) -> bool
    where
        F: FnOnce(&JobContext) -> bool + Send + 'static,
    {
        let spec = match JobSpec::new(title, mode) {
            Ok(spec) => spec,
            Err(e) => {
                error!(error = %e, "rejecting job submission");
                return false;
            }
        };
        let job_id = spec.id.clone();

        let (done_tx, done_rx) = oneshot::channel();
        let job = QueuedJob::new(
            spec,
            JobContext::new(self.prefs.clone()),
            Box::new(body),
            done_tx,
        );

        let context = Arc::clone(&self.context);
        let queue = Arc::clone(&self.queue);
        let submit: DispatchFn = Box::new(move || {
            if !context.is_alive() {
                warn!(job_id = %job.spec().id, "execution context is gone, skipping job");
                job.skip();
                return;
            }
            queue.enqueue(job);
        });

        if let Err(e) = self.dispatcher.invoke_and_wait(submit) {
            error!(job_id = %job_id, error = %e, "failed to hand job off to the queue");
            return false;
        }

        match done_rx.blocking_recv() {
            Ok(outcome) => {
                debug!(job_id = %job_id, outcome = ?outcome, "job outcome received");
                outcome.succeeded()
            }
            Err(_) => {
                error!(job_id = %job_id, "job was dropped without reporting an outcome");
                false
            }
        }
    }
}
