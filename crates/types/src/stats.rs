//! Run statistics: the counters one worker accumulates during a run.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::energy::Energy;
use crate::step::BoundaryStatus;

// =============================================================================
// Counter Names
// =============================================================================

/// Names every integer counter in [`RunStatistics`].
///
/// Used for keyed increments and to say *which* counter overflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    Observations,
    Created,
    Absorbed,
    AbsorbedInTarget,
    Scattered,
    BoundaryEvents,
    Boundary(BoundaryStatus),
    Detected,
    EscapedExitFace,
    Unclassified,
    TerminationsRequested,
}

impl Counter {
    /// Every counter, including one per boundary status.
    pub fn all() -> impl Iterator<Item = Counter> {
        [
            Counter::Observations,
            Counter::Created,
            Counter::Absorbed,
            Counter::AbsorbedInTarget,
            Counter::Scattered,
            Counter::BoundaryEvents,
            Counter::Detected,
            Counter::EscapedExitFace,
            Counter::Unclassified,
            Counter::TerminationsRequested,
        ]
        .into_iter()
        .chain(BoundaryStatus::ALL.into_iter().map(Counter::Boundary))
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Counter::Observations => write!(f, "observations"),
            Counter::Created => write!(f, "created"),
            Counter::Absorbed => write!(f, "absorbed"),
            Counter::AbsorbedInTarget => write!(f, "absorbed_in_target"),
            Counter::Scattered => write!(f, "scattered"),
            Counter::BoundaryEvents => write!(f, "boundary_events"),
            Counter::Boundary(status) => write!(f, "boundary[{}]", status),
            Counter::Detected => write!(f, "detected"),
            Counter::EscapedExitFace => write!(f, "escaped_exit_face"),
            Counter::Unclassified => write!(f, "unclassified"),
            Counter::TerminationsRequested => write!(f, "terminations_requested"),
        }
    }
}

// =============================================================================
// Boundary Tally
// =============================================================================

/// Per-status boundary interaction counts.
///
/// Dense array indexed by [`BoundaryStatus::index`]; serializes as a map of
/// the non-zero entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryTally(pub [u64; BoundaryStatus::COUNT]);

impl BoundaryTally {
    pub const ZERO: BoundaryTally = BoundaryTally([0; BoundaryStatus::COUNT]);

    /// Count for one status.
    #[inline]
    pub fn get(&self, status: BoundaryStatus) -> u64 {
        self.0[status.index()]
    }

    /// Mutable slot for one status.
    #[inline]
    pub fn get_mut(&mut self, status: BoundaryStatus) -> &mut u64 {
        &mut self.0[status.index()]
    }

    /// Sum over all statuses, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.0.iter().copied().fold(0, u64::saturating_add)
    }

    /// Non-zero entries in declaration order.
    pub fn non_zero(&self) -> impl Iterator<Item = (BoundaryStatus, u64)> + '_ {
        BoundaryStatus::ALL
            .iter()
            .map(|s| (*s, self.get(*s)))
            .filter(|(_, n)| *n > 0)
    }
}

impl Default for BoundaryTally {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Serialize for BoundaryTally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<_> = self.non_zero().collect();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (status, count) in entries {
            map.serialize_entry(status.name(), &count)?;
        }
        map.end()
    }
}

// =============================================================================
// Run Statistics
// =============================================================================

/// Counters for one worker's run, or the merge of several.
///
/// All fields only ever grow during a run. A value handed to the merge step is
/// an owned snapshot; nothing mutates it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct RunStatistics {
    /// Observations fed to the classifier.
    pub observations: u64,
    /// Signal quanta created by a recognized process.
    pub created: u64,
    /// Bulk absorptions (anywhere).
    pub absorbed: u64,
    /// Bulk absorptions whose step started in the target.
    pub absorbed_in_target: u64,
    /// Bulk scatterings.
    pub scattered: u64,
    /// Boundary interactions of any status.
    pub boundary_events: u64,
    /// Boundary interactions by status.
    pub boundary: BoundaryTally,
    /// Signal quanta that entered the sensor.
    pub detected: u64,
    /// Tracks credited for reaching the exit face (at most once each).
    pub escaped_exit_face: u64,
    /// Observations that matched no rule.
    pub unclassified: u64,
    /// Termination requests sent back to the engine.
    pub terminations_requested: u64,
    /// Creation energy plus detected-step energy.
    pub energy: Energy,
}

impl RunStatistics {
    /// The merge identity: every counter zero.
    pub const ZERO: RunStatistics = RunStatistics {
        observations: 0,
        created: 0,
        absorbed: 0,
        absorbed_in_target: 0,
        scattered: 0,
        boundary_events: 0,
        boundary: BoundaryTally::ZERO,
        detected: 0,
        escaped_exit_face: 0,
        unclassified: 0,
        terminations_requested: 0,
        energy: Energy::ZERO,
    };

    /// Read a counter by name.
    pub fn counter(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Observations => self.observations,
            Counter::Created => self.created,
            Counter::Absorbed => self.absorbed,
            Counter::AbsorbedInTarget => self.absorbed_in_target,
            Counter::Scattered => self.scattered,
            Counter::BoundaryEvents => self.boundary_events,
            Counter::Boundary(status) => self.boundary.get(status),
            Counter::Detected => self.detected,
            Counter::EscapedExitFace => self.escaped_exit_face,
            Counter::Unclassified => self.unclassified,
            Counter::TerminationsRequested => self.terminations_requested,
        }
    }

    /// Mutable slot for a counter.
    pub fn counter_mut(&mut self, counter: Counter) -> &mut u64 {
        match counter {
            Counter::Observations => &mut self.observations,
            Counter::Created => &mut self.created,
            Counter::Absorbed => &mut self.absorbed,
            Counter::AbsorbedInTarget => &mut self.absorbed_in_target,
            Counter::Scattered => &mut self.scattered,
            Counter::BoundaryEvents => &mut self.boundary_events,
            Counter::Boundary(status) => self.boundary.get_mut(status),
            Counter::Detected => &mut self.detected,
            Counter::EscapedExitFace => &mut self.escaped_exit_face,
            Counter::Unclassified => &mut self.unclassified,
            Counter::TerminationsRequested => &mut self.terminations_requested,
        }
    }

    /// Number of observations that received a label.
    ///
    /// Each observation gets exactly one label, so this always equals
    /// `observations` for statistics produced by the accumulator. Saturates
    /// at `u64::MAX` for hand-built statistics.
    pub fn labelled(&self) -> u64 {
        [
            self.created,
            self.absorbed,
            self.scattered,
            self.boundary_events,
            self.detected,
            self.escaped_exit_face,
            self.unclassified,
        ]
        .into_iter()
        .fold(0, u64::saturating_add)
    }

    /// Detected / created, or 0.0 when nothing was created.
    pub fn detection_efficiency(&self) -> f64 {
        if self.created > 0 {
            self.detected as f64 / self.created as f64
        } else {
            0.0
        }
    }

    /// Check if no observation has been recorded.
    pub fn is_empty(&self) -> bool {
        *self == Self::ZERO
    }
}
