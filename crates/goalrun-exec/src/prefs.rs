//! Run-mode preference collaborator and the per-job context handed to bodies.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

/// Host preference for whether jobs should run in the background.
///
/// Updated when a running job voluntarily moves itself to the background, so
/// the next submission can start there.
pub trait RunModePrefs: Send + Sync {
    /// Whether background execution is currently preferred.
    fn background_preferred(&self) -> bool;

    /// Record the preference.
    fn set_background_preferred(&self, preferred: bool);
}

/// Atomic-flag preference store.
#[derive(Debug, Default)]
pub struct InMemoryPrefs {
    background: AtomicBool,
}

impl InMemoryPrefs {
    /// Create a preference store with the given initial value.
    pub fn new(background: bool) -> Self {
        Self {
            background: AtomicBool::new(background),
        }
    }
}

impl RunModePrefs for InMemoryPrefs {
    fn background_preferred(&self) -> bool {
        self.background.load(Ordering::SeqCst)
    }

    fn set_background_preferred(&self, preferred: bool) {
        self.background.store(preferred, Ordering::SeqCst);
    }
}

/// Handle given to every job body while it runs.
///
/// The only thing a body can do with it is move the job to the background;
/// the preference collaborator is updated once per job no matter how many
/// times the body asks.
pub struct JobContext {
    prefs: Arc<dyn RunModePrefs>,
    backgrounded: AtomicBool,
}

impl JobContext {
    pub(crate) fn new(prefs: Arc<dyn RunModePrefs>) -> Self {
        Self {
            prefs,
            backgrounded: AtomicBool::new(false),
        }
    }

    /// Move the running job to the background.
    pub fn move_to_background(&self) {
        if !self.backgrounded.swap(true, Ordering::SeqCst) {
            debug!("job moved itself to the background");
            self.prefs.set_background_preferred(true);
        }
    }

    /// Whether this job has moved itself to the background.
    pub fn backgrounded(&self) -> bool {
        self.backgrounded.load(Ordering::SeqCst)
    }
}
