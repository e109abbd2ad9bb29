//! Job execution outcomes.

use serde::{Deserialize, Serialize};

/// Outcome of one job execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// Body ran and reported success. Also the initial value of the outcome
    /// cell before the body runs.
    #[default]
    Succeeded,
    /// Body ran and reported failure.
    Failed,
    /// Body panicked; the panic was captured and never propagated.
    Faulted,
    /// The job was never run because the execution context was gone at
    /// submission time. The host treats this as the default outcome.
    Skipped,
}

impl Outcome {
    /// Collapse the outcome to the boolean the caller sees.
    ///
    /// `Skipped` reads as success: a job the host refused to run leaves the
    /// outcome cell at its default.
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Skipped)
    }

    /// Returns true if the body actually ran.
    pub fn ran(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}
