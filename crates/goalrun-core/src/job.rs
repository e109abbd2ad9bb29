//! Job specification and run mode.

use crate::{CoreError, JobId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a job should be presented while it runs.
///
/// `Background` marks the job as eligible to run without holding the
/// foreground; a running job may also move itself to the background
/// mid-flight, which is reported through the run-mode preference
/// collaborator rather than by mutating the spec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    /// Job runs in the foreground, holding the caller's attention.
    #[default]
    Foreground,
    /// Job is eligible to run in the background from the start.
    Background,
}

impl RunMode {
    /// Returns true if the job starts background-eligible.
    pub fn is_background(&self) -> bool {
        matches!(self, Self::Background)
    }
}

/// Immutable description of one job submission.
///
/// A spec is created per invocation, handed to the queue, and discarded once
/// the outcome has been read. It is never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Unique job identifier.
    pub id: JobId,

    /// Title used for progress UI and log labeling.
    pub title: String,

    /// Requested run mode.
    pub mode: RunMode,

    /// When the job was created.
    pub created_at: DateTime<Utc>,
}

impl JobSpec {
    /// Create a new JobSpec.
    ///
    /// The title is required to be non-empty; it is the only label the host
    /// has for the job while it runs.
    pub fn new(title: impl Into<String>, mode: RunMode) -> Result<Self, CoreError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CoreError::EmptyTitle);
        }
        Ok(Self {
            id: JobId::generate(),
            title,
            mode,
            created_at: Utc::now(),
        })
    }

    /// Builder method to set a specific ID (useful for testing).
    pub fn with_id(mut self, id: JobId) -> Self {
        self.id = id;
        self
    }
}
