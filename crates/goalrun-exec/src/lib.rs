//! Goalrun Execution
//!
//! The synchronous job runner and the collaborator interfaces it is built
//! against. The runner submits a titled unit of work to an asynchronous,
//! background-capable job queue and blocks the calling thread until the queue
//! reports the job's boolean outcome.
//!
//! Every host-provided service is an explicit trait dependency here (execution
//! context, job queue, coordination dispatch, settings, notifications, run-mode
//! preferences), so the whole crate is testable with plain in-process doubles.

pub mod context;
pub mod dispatch;
pub mod goal;
pub mod notify;
pub mod prefs;
pub mod queue;
pub mod runner;
pub mod settings;

// Re-export commonly used types
pub use context::{ExecutionContext, StaticContext};
pub use dispatch::{CoordinationThread, DispatchError, Dispatcher, InlineDispatcher};
pub use goal::{GoalInvocation, GoalLauncher, GoalTask, ProcessLauncher};
pub use notify::{LogNotifier, Notification, NotificationAction, Notifier};
pub use prefs::{InMemoryPrefs, JobContext, RunModePrefs};
pub use queue::{BackgroundQueue, JobQueue, QueuedJob};
pub use runner::SyncJobRunner;
pub use settings::{InMemorySettings, SettingsStore};
