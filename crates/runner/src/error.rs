//! Error types for run lifecycle operations.

use tally_core::TallyError;
use thiserror::Error;
use types::WorkerId;

use crate::controller::RunState;

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunError>;

/// Failure while reading a worker's step stream.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Underlying reader failed.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    /// A trace line is not a valid step record.
    #[error("line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A step record could not be mapped (e.g. invalid energy).
    #[error("line {line}: {source}")]
    Mapping {
        line: usize,
        #[source]
        source: TallyError,
    },
}

/// Errors surfaced by the run controller.
///
/// Everything except [`RunError::InvalidTransition`] and
/// [`RunError::UnknownWorker`] aborts the run in progress.
#[derive(Debug, Error)]
pub enum RunError {
    /// Classification or accumulation failed on one worker.
    #[error("{worker}: {source}")]
    Tally {
        worker: WorkerId,
        #[source]
        source: TallyError,
    },

    /// Merge failed (overflow while combining worker snapshots).
    #[error("merge failed: {0}")]
    Merge(#[source] TallyError),

    /// End-of-run requested while workers were still running.
    #[error("end of run requested before all workers completed (pending: {pending:?})")]
    PrematureMerge { pending: Vec<WorkerId> },

    /// A worker's step stream failed.
    #[error("{worker} step source: {source}")]
    Source {
        worker: WorkerId,
        #[source]
        source: SourceError,
    },

    /// The requested action is not valid in the current state.
    #[error("cannot {action} while {from:?}")]
    InvalidTransition { from: RunState, action: &'static str },

    /// No such worker in the current run.
    #[error("unknown worker {0}")]
    UnknownWorker(WorkerId),
}

impl RunError {
    /// Whether the error is one of the classification/accumulation failures
    /// that indicate a defect in the event stream rather than misuse of the API.
    pub fn tally_error(&self) -> Option<&TallyError> {
        match self {
            RunError::Tally { source, .. } | RunError::Merge(source) => Some(source),
            _ => None,
        }
    }

    /// The worker whose stream or tally failed, if the error belongs to one.
    pub fn worker(&self) -> Option<WorkerId> {
        match self {
            RunError::Tally { worker, .. } | RunError::Source { worker, .. } => Some(*worker),
            _ => None,
        }
    }
}
