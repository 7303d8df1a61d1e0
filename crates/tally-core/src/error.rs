//! Error types for tally-core operations.

use thiserror::Error;
use types::{Counter, TrackId};

/// Result type for tally-core operations.
pub type Result<T> = std::result::Result<T, TallyError>;

/// Fatal conditions raised while classifying or accumulating.
///
/// Every variant aborts the current run. Observations that merely match no
/// rule are not errors; they are labelled `Unclassified`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TallyError {
    /// The engine produced a step for a track after it was terminated.
    /// Accepting it would double count that track.
    #[error("step observed for {track} after termination was requested")]
    DedupRegistryInconsistency { track: TrackId },

    /// A counter would exceed `u64::MAX`.
    #[error("counter `{counter}` overflowed")]
    CounterOverflow { counter: Counter },

    /// The accumulated energy would exceed its fixed-point range.
    #[error("accumulated energy overflowed")]
    EnergyOverflow,

    /// The engine reported a negative, non-finite, or out-of-range energy.
    #[error("invalid energy {value} eV reported for {track}")]
    InvalidEnergy { track: TrackId, value: f64 },
}
