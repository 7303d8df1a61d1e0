//! Identifier types for tracks, workers and runs.
//!
//! All identifiers are newtypes so a track id can never be passed where a
//! worker id is expected.

use derive_more::{From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one particle track, unique within one worker's run.
///
/// The transport engine restarts numbering every run, and two workers may
/// hand out the same number concurrently, so a `TrackId` is only meaningful
/// together with the worker context that observed it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    From,
    Into,
)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Track#{}", self.0)
    }
}

/// Index of a worker (one independent event stream) within a run.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    From,
    Into,
)]
pub struct WorkerId(pub u32);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Worker#{}", self.0)
    }
}

/// Sequence number of a run driven by one controller.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    From,
    Into,
)]
pub struct RunId(pub u64);

impl RunId {
    /// The id of the run that follows this one.
    #[inline]
    pub fn next(self) -> Self {
        RunId(self.0 + 1)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Run#{}", self.0)
    }
}
