//! Core domain errors.

use thiserror::Error;

/// Core domain errors for Goalrun.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A job was created with an empty title.
    #[error("Job title must not be empty")]
    EmptyTitle,
}
