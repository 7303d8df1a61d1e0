//! Run accumulator: the per-worker counters for one run.
//!
//! Every increment is checked. Reaching `u64::MAX` is reported as
//! [`TallyError::CounterOverflow`] naming the counter; the value never wraps.

use types::{Counter, Energy, OutcomeLabel, RunStatistics};

use crate::classifier::Classification;
use crate::error::{Result, TallyError};

/// Mutable counters owned by one worker during a run.
#[derive(Debug, Default)]
pub struct RunAccumulator {
    stats: RunStatistics,
}

impl RunAccumulator {
    /// Create an accumulator with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment one counter by one.
    pub fn increment(&mut self, counter: Counter) -> Result<()> {
        let slot = self.stats.counter_mut(counter);
        *slot = slot
            .checked_add(1)
            .ok_or(TallyError::CounterOverflow { counter })?;
        Ok(())
    }

    /// Add to the accumulated energy sum.
    pub fn add_energy(&mut self, energy: Energy) -> Result<()> {
        self.stats.energy = self
            .stats
            .energy
            .checked_add(energy)
            .ok_or(TallyError::EnergyOverflow)?;
        Ok(())
    }

    /// Apply one classified observation.
    ///
    /// Always counts the observation itself, then the counters its label
    /// implies.
    pub fn record(&mut self, classification: &Classification) -> Result<()> {
        self.increment(Counter::Observations)?;

        match classification.label {
            OutcomeLabel::Detected => {
                self.increment(Counter::Detected)?;
            }
            OutcomeLabel::BoundaryEvent(status) => {
                self.increment(Counter::BoundaryEvents)?;
                self.increment(Counter::Boundary(status))?;
            }
            OutcomeLabel::ExitFace => {
                self.increment(Counter::EscapedExitFace)?;
            }
            OutcomeLabel::Absorbed { in_target } => {
                self.increment(Counter::Absorbed)?;
                if in_target {
                    self.increment(Counter::AbsorbedInTarget)?;
                }
            }
            OutcomeLabel::Scattered => {
                self.increment(Counter::Scattered)?;
            }
            OutcomeLabel::Created => {
                self.increment(Counter::Created)?;
            }
            OutcomeLabel::Unclassified => {
                self.increment(Counter::Unclassified)?;
            }
        }

        if classification.terminate {
            self.increment(Counter::TerminationsRequested)?;
        }
        if classification.energy != Energy::ZERO {
            self.add_energy(classification.energy)?;
        }
        Ok(())
    }

    /// Current counters, by reference.
    pub fn stats(&self) -> &RunStatistics {
        &self.stats
    }

    /// Owned copy of the current counters for merging.
    pub fn snapshot(&self) -> RunStatistics {
        self.stats
    }

    /// Return every counter to zero.
    pub fn reset(&mut self) {
        self.stats = RunStatistics::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{BoundaryStatus, TrackId};

    fn classified(label: OutcomeLabel) -> Classification {
        Classification {
            label,
            track: TrackId(1),
            energy: Energy::ZERO,
            terminate: false,
        }
    }

    #[test]
    fn test_record_labels() {
        let mut acc = RunAccumulator::new();
        acc.record(&classified(OutcomeLabel::Absorbed { in_target: true }))
            .unwrap();
        acc.record(&classified(OutcomeLabel::Absorbed { in_target: false }))
            .unwrap();
        acc.record(&classified(OutcomeLabel::BoundaryEvent(
            BoundaryStatus::FresnelReflection,
        )))
        .unwrap();
        acc.record(&classified(OutcomeLabel::Unclassified)).unwrap();

        let stats = acc.snapshot();
        assert_eq!(stats.observations, 4);
        assert_eq!(stats.absorbed, 2);
        assert_eq!(stats.absorbed_in_target, 1);
        assert_eq!(stats.boundary_events, 1);
        assert_eq!(stats.boundary.get(BoundaryStatus::FresnelReflection), 1);
        assert_eq!(stats.unclassified, 1);
        assert_eq!(stats.labelled(), stats.observations);
    }

    #[test]
    fn test_record_detection_energy_and_termination() {
        let mut acc = RunAccumulator::new();
        let c = Classification {
            label: OutcomeLabel::Detected,
            track: TrackId(1),
            energy: Energy(1_500_000),
            terminate: true,
        };
        acc.record(&c).unwrap();

        assert_eq!(acc.stats().detected, 1);
        assert_eq!(acc.stats().terminations_requested, 1);
        assert_eq!(acc.stats().energy, Energy(1_500_000));
    }

    #[test]
    fn test_overflow_is_reported_not_wrapped() {
        let mut acc = RunAccumulator::new();
        acc.stats.detected = u64::MAX;

        let err = acc.increment(Counter::Detected).unwrap_err();
        assert_eq!(
            err,
            TallyError::CounterOverflow {
                counter: Counter::Detected
            }
        );
        assert_eq!(acc.stats().detected, u64::MAX);
    }

    #[test]
    fn test_energy_overflow() {
        let mut acc = RunAccumulator::new();
        acc.add_energy(Energy(u64::MAX)).unwrap();
        assert_eq!(acc.add_energy(Energy(1)), Err(TallyError::EnergyOverflow));
    }

    #[test]
    fn test_reset() {
        let mut acc = RunAccumulator::new();
        acc.record(&classified(OutcomeLabel::Created)).unwrap();
        acc.add_energy(Energy(5)).unwrap();
        assert!(!acc.stats().is_empty());

        acc.reset();

        assert!(acc.stats().is_empty());
    }
}
