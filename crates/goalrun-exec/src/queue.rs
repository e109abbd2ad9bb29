//! The asynchronous job queue and the unit of work handed to it.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tracing::{debug, error};

use goalrun_core::{JobSpec, Outcome};

use crate::prefs::JobContext;

/// The work a job performs, returning its boolean outcome.
pub type JobBody = Box<dyn FnOnce(&JobContext) -> bool + Send>;

/// A job ready to be executed on a worker thread.
///
/// The completion signal travels inside: `execute` releases it on every exit
/// path, and dropping an unexecuted job closes the channel, so a queue that
/// loses a job can never leave the submitting thread blocked forever.
pub struct QueuedJob {
    spec: JobSpec,
    ctx: JobContext,
    body: JobBody,
    done: oneshot::Sender<Outcome>,
}

impl QueuedJob {
    pub(crate) fn new(
        spec: JobSpec,
        ctx: JobContext,
        body: JobBody,
        done: oneshot::Sender<Outcome>,
    ) -> Self {
        Self {
            spec,
            ctx,
            body,
            done,
        }
    }

    /// The spec describing this job.
    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    /// Run the body, capture the outcome, and release the completion signal.
    ///
    /// A panicking body is captured as `Outcome::Faulted`; the signal is
    /// released regardless.
    pub fn execute(self) {
        let Self {
            spec,
            ctx,
            body,
            done,
        } = self;

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| body(&ctx))) {
            Ok(true) => Outcome::Succeeded,
            Ok(false) => Outcome::Failed,
            Err(payload) => {
                error!(
                    job_id = %spec.id,
                    title = %spec.title,
                    panic = panic_message(payload.as_ref()),
                    "job body panicked"
                );
                Outcome::Faulted
            }
        };

        debug!(job_id = %spec.id, outcome = ?outcome, "job finished");
        if done.send(outcome).is_err() {
            debug!(job_id = %spec.id, "outcome receiver dropped");
        }
    }

    /// Release the completion signal without running the body.
    ///
    /// Used when the host refuses the submission; the outcome stays at the
    /// host default.
    pub(crate) fn skip(self) {
        debug!(job_id = %self.spec.id, title = %self.spec.title, "job skipped");
        let _ = self.done.send(Outcome::Skipped);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

/// Asynchronous execution facility.
///
/// An implementation must eventually invoke `job.execute()` exactly once on a
/// worker thread, unless the process terminates first.
pub trait JobQueue: Send + Sync {
    /// Accept a job for execution.
    fn enqueue(&self, job: QueuedJob);
}

/// Default queue backed by a tokio multi-thread runtime.
///
/// Jobs run on the runtime's blocking pool. The caller must not be inside an
/// async context: the runner blocks the submitting thread while it waits.
pub struct BackgroundQueue {
    runtime: Runtime,
}

impl BackgroundQueue {
    /// Build the queue and its worker runtime.
    pub fn new() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("goalrun-worker")
            .build()?;
        Ok(Self { runtime })
    }
}

impl JobQueue for BackgroundQueue {
    fn enqueue(&self, job: QueuedJob) {
        debug!(
            job_id = %job.spec().id,
            title = %job.spec().title,
            mode = ?job.spec().mode,
            "queueing job"
        );
        self.runtime.spawn_blocking(move || job.execute());
    }
}
