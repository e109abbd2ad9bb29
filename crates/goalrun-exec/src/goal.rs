//! Goal tasks: assembling a toolchain invocation and driving it through the
//! synchronous runner.

use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use tracing::{error, info, warn};

use goalrun_core::RunMode;

use crate::context::ExecutionContext;
use crate::notify::{Notification, Notifier};
use crate::runner::SyncJobRunner;
use crate::settings::SettingsStore;

/// Property controlling toolchain log verbosity.
pub const LOG_LEVEL_PROPERTY: &str = "build.log.level";
/// Property controlling toolchain stack-trace verbosity.
pub const STACKTRACE_LEVEL_PROPERTY: &str = "build.stacktrace.level";
/// Property selecting the build configuration.
pub const CONFIGURATION_PROPERTY: &str = "build.configuration";
/// Property enabling remote builds.
pub const REMOTE_BUILD_PROPERTY: &str = "build.remote";
/// Property selecting the target simulator device.
pub const SIMULATOR_UDID_PROPERTY: &str = "build.simulator.udid";

/// Settings target used in the short-circuit notification's action link.
pub const TOOLCHAIN_SETTINGS_TARGET: &str = "settings/toolchain";

/// A fully resolved goal invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalInvocation {
    /// Toolchain installation directory.
    pub toolchain_home: PathBuf,
    /// Directory the goal runs in.
    pub work_dir: PathBuf,
    /// Goal tokens plus `-D<key>=<value>` properties.
    pub args: Vec<String>,
}

/// Executes a resolved goal invocation, reporting its boolean outcome.
pub trait GoalLauncher: Send + Sync {
    fn launch(&self, invocation: &GoalInvocation) -> bool;
}

/// Launcher that spawns a toolchain program as a child process.
///
/// The program path is resolved relative to the toolchain home; the outcome
/// is the child's exit status. Stdio is inherited so the goal's own output
/// reaches the user.
pub struct ProcessLauncher {
    program: PathBuf,
}

impl ProcessLauncher {
    /// Create a launcher for the given program path, relative to the
    /// toolchain home.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl GoalLauncher for ProcessLauncher {
    fn launch(&self, invocation: &GoalInvocation) -> bool {
        let program = invocation.toolchain_home.join(&self.program);
        info!(
            program = %program.display(),
            work_dir = %invocation.work_dir.display(),
            args = ?invocation.args,
            "launching goal"
        );

        match Command::new(&program)
            .args(&invocation.args)
            .current_dir(&invocation.work_dir)
            .status()
        {
            Ok(status) => {
                if !status.success() {
                    warn!(status = %status, "goal exited with failure");
                }
                status.success()
            }
            Err(e) => {
                error!(program = %program.display(), error = %e, "failed to launch goal");
                false
            }
        }
    }
}

/// A build goal wired to its context, settings, and notification channel.
///
/// `run` resolves the toolchain home and working directory, assembles the
/// argument list, and drives the launch through the synchronous runner. If
/// either path is unresolved it notifies with a remediation hint and returns
/// `false` without submitting anything.
pub struct GoalTask {
    goal: String,
    title: String,
    mode: RunMode,
    properties: Vec<(String, String)>,
    context: Arc<dyn ExecutionContext>,
    settings: Arc<dyn SettingsStore>,
    notifier: Arc<dyn Notifier>,
}

impl GoalTask {
    /// Create a new GoalTask.
    pub fn new(
        goal: impl Into<String>,
        title: impl Into<String>,
        mode: RunMode,
        context: Arc<dyn ExecutionContext>,
        settings: Arc<dyn SettingsStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            goal: goal.into(),
            title: title.into(),
            mode,
            properties: Vec::new(),
            context,
            settings,
            notifier,
        }
    }

    /// Builder method to attach an explicit `-D` property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    /// The goal's argument list: goal tokens, then `-D` properties from the
    /// settings store, then explicitly attached properties.
    pub fn arguments(&self) -> Vec<String> {
        let mut args: Vec<String> = self.goal.split_whitespace().map(str::to_owned).collect();

        for key in [LOG_LEVEL_PROPERTY, STACKTRACE_LEVEL_PROPERTY] {
            if let Some(value) = self.settings.get_non_empty(key) {
                args.push(format!("-D{key}={value}"));
            }
        }

        for (key, value) in &self.properties {
            args.push(format!("-D{key}={value}"));
        }

        args
    }

    /// Resolve the invocation and run it synchronously through `runner`.
    pub fn run(&self, runner: &SyncJobRunner, launcher: Arc<dyn GoalLauncher>) -> bool {
        let Some(toolchain_home) = self.context.toolchain_home() else {
            self.notifier.notify_error(
                Notification::new(
                    "Failed to execute goal",
                    "No toolchain installation is configured for this project.",
                )
                .with_action("Open settings", TOOLCHAIN_SETTINGS_TARGET),
            );
            return false;
        };

        let Some(work_dir) = self.context.work_dir() else {
            self.notifier.notify_error(
                Notification::new(
                    "Failed to execute goal",
                    "The working directory for this goal could not be resolved.",
                )
                .with_action("Open settings", TOOLCHAIN_SETTINGS_TARGET),
            );
            return false;
        };

        let invocation = GoalInvocation {
            toolchain_home,
            work_dir,
            args: self.arguments(),
        };

        runner.run(&self.title, self.mode, move |_ctx| {
            launcher.launch(&invocation)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::context::StaticContext;
    use crate::dispatch::InlineDispatcher;
    use crate::prefs::InMemoryPrefs;
    use crate::queue::{JobQueue, QueuedJob};
    use crate::settings::InMemorySettings;

    struct CountingQueue {
        submissions: AtomicUsize,
    }

    impl JobQueue for CountingQueue {
        fn enqueue(&self, job: QueuedJob) {
            self.submissions.fetch_add(1, Ordering::SeqCst);
            job.execute();
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        notifications: Mutex<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify_error(&self, notification: Notification) {
            self.notifications.lock().unwrap().push(notification);
        }
    }

    struct RecordingLauncher {
        launches: Mutex<Vec<GoalInvocation>>,
        outcome: bool,
    }

    impl GoalLauncher for RecordingLauncher {
        fn launch(&self, invocation: &GoalInvocation) -> bool {
            self.launches.lock().unwrap().push(invocation.clone());
            self.outcome
        }
    }

    fn task_with(
        context: Arc<StaticContext>,
        settings: InMemorySettings,
        notifier: Arc<RecordingNotifier>,
    ) -> GoalTask {
        GoalTask::new(
            "compile",
            "Build",
            RunMode::Foreground,
            context,
            Arc::new(settings),
            notifier,
        )
    }

    fn runner_with(context: Arc<StaticContext>, queue: Arc<CountingQueue>) -> SyncJobRunner {
        SyncJobRunner::new(
            context,
            queue,
            Arc::new(InlineDispatcher),
            Arc::new(InMemoryPrefs::default()),
        )
    }

    #[test]
    fn test_arguments_include_settings_properties() {
        let settings = InMemorySettings::new()
            .with(LOG_LEVEL_PROPERTY, "debug")
            .with(STACKTRACE_LEVEL_PROPERTY, "");
        let task = task_with(
            Arc::new(StaticContext::new()),
            settings,
            Arc::new(RecordingNotifier::default()),
        )
        .with_property(CONFIGURATION_PROPERTY, "Release");

        assert_eq!(
            task.arguments(),
            vec![
                "compile".to_owned(),
                "-Dbuild.log.level=debug".to_owned(),
                "-Dbuild.configuration=Release".to_owned(),
            ]
        );
    }

    #[test]
    fn test_multi_token_goal_is_split() {
        let task = GoalTask::new(
            "clean compile",
            "Build",
            RunMode::Foreground,
            Arc::new(StaticContext::new()),
            Arc::new(InMemorySettings::new()),
            Arc::new(RecordingNotifier::default()),
        );
        assert_eq!(task.arguments(), vec!["clean", "compile"]);
    }

    #[test]
    fn test_unresolved_toolchain_short_circuits() {
        let context = Arc::new(StaticContext::new().with_work_dir("/tmp/project"));
        let notifier = Arc::new(RecordingNotifier::default());
        let queue = Arc::new(CountingQueue {
            submissions: AtomicUsize::new(0),
        });

        let task = task_with(context.clone(), InMemorySettings::new(), notifier.clone());
        let runner = runner_with(context, queue.clone());
        let launcher = Arc::new(RecordingLauncher {
            launches: Mutex::new(Vec::new()),
            outcome: true,
        });

        assert!(!task.run(&runner, launcher.clone()));

        // Nothing was submitted, nothing was launched.
        assert_eq!(queue.submissions.load(Ordering::SeqCst), 0);
        assert!(launcher.launches.lock().unwrap().is_empty());

        // One notification, with an actionable hint.
        let notifications = notifier.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        let action = notifications[0].action.as_ref().unwrap();
        assert_eq!(action.target, TOOLCHAIN_SETTINGS_TARGET);
    }

    #[test]
    fn test_resolved_goal_launches_and_reports_outcome() {
        let context = Arc::new(
            StaticContext::new()
                .with_work_dir("/tmp/project")
                .with_toolchain_home("/opt/toolchain"),
        );
        let notifier = Arc::new(RecordingNotifier::default());
        let queue = Arc::new(CountingQueue {
            submissions: AtomicUsize::new(0),
        });

        let task = task_with(context.clone(), InMemorySettings::new(), notifier.clone());
        let runner = runner_with(context, queue.clone());
        let launcher = Arc::new(RecordingLauncher {
            launches: Mutex::new(Vec::new()),
            outcome: true,
        });

        assert!(task.run(&runner, launcher.clone()));
        assert_eq!(queue.submissions.load(Ordering::SeqCst), 1);

        let launches = launcher.launches.lock().unwrap();
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].toolchain_home, PathBuf::from("/opt/toolchain"));
        assert_eq!(launches[0].work_dir, PathBuf::from("/tmp/project"));
        assert_eq!(launches[0].args, vec!["compile"]);
        assert!(notifier.notifications.lock().unwrap().is_empty());
    }
}
