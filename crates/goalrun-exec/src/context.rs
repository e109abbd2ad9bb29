//! Execution context provider.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Host-side execution context for a job.
///
/// Supplies the paths a goal needs and answers whether the session the job
/// belongs to is still usable. Either path may be unresolved, which sends the
/// goal layer down its short-circuit failure path.
pub trait ExecutionContext: Send + Sync {
    /// Whether the session/project this context belongs to is still alive.
    fn is_alive(&self) -> bool;

    /// Working directory for goal execution, if resolved.
    fn work_dir(&self) -> Option<PathBuf>;

    /// Resolved toolchain installation directory, if configured.
    fn toolchain_home(&self) -> Option<PathBuf>;
}

/// Execution context over fixed paths.
///
/// The liveness flag can be flipped from other threads, which is how tests
/// simulate a session being torn down between job creation and submission.
#[derive(Debug, Default)]
pub struct StaticContext {
    work_dir: Option<PathBuf>,
    toolchain_home: Option<PathBuf>,
    dead: AtomicBool,
}

impl StaticContext {
    /// Create a live context with no resolved paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the working directory.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Builder method to set the toolchain home.
    pub fn with_toolchain_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.toolchain_home = Some(home.into());
        self
    }

    /// Mark the context alive or torn down.
    pub fn set_alive(&self, alive: bool) {
        self.dead.store(!alive, Ordering::SeqCst);
    }
}

impl ExecutionContext for StaticContext {
    fn is_alive(&self) -> bool {
        !self.dead.load(Ordering::SeqCst)
    }

    fn work_dir(&self) -> Option<PathBuf> {
        self.work_dir.clone()
    }

    fn toolchain_home(&self) -> Option<PathBuf> {
        self.toolchain_home.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_context_starts_alive() {
        let ctx = StaticContext::new();
        assert!(ctx.is_alive());
        assert!(ctx.work_dir().is_none());
        assert!(ctx.toolchain_home().is_none());
    }

    #[test]
    fn test_static_context_paths_and_teardown() {
        let ctx = StaticContext::new()
            .with_work_dir("/tmp/project")
            .with_toolchain_home("/opt/toolchain");
        assert_eq!(ctx.work_dir(), Some(PathBuf::from("/tmp/project")));
        assert_eq!(ctx.toolchain_home(), Some(PathBuf::from("/opt/toolchain")));

        ctx.set_alive(false);
        assert!(!ctx.is_alive());
    }
}
