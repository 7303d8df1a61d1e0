//! Per-worker run state.
//!
//! A [`WorkerContext`] owns everything one worker mutates during a run: its
//! dedup registry and its accumulator. Contexts are never shared; the
//! controller moves them onto worker threads and back.

use tally_core::{Classification, Classifier, DedupRegistry, RunAccumulator, TallyError};
use tracing::{debug, trace};
use types::{OutcomeLabel, RunStatistics, StepObservation, WorkerId};

use crate::error::{Result, RunError};
use crate::source::StepSource;

/// One worker's registry, accumulator and classifier.
#[derive(Debug)]
pub struct WorkerContext {
    id: WorkerId,
    classifier: Classifier,
    registry: DedupRegistry,
    accumulator: RunAccumulator,
    completed: bool,
    detections_logged: u64,
    detection_log_limit: u64,
}

impl WorkerContext {
    pub fn new(id: WorkerId, classifier: Classifier, detection_log_limit: u64) -> Self {
        Self {
            id,
            classifier,
            registry: DedupRegistry::new(),
            accumulator: RunAccumulator::new(),
            completed: false,
            detections_logged: 0,
            detection_log_limit,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Whether this worker has signalled completion for the current run.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Counters accumulated so far in this run.
    pub fn stats(&self) -> &RunStatistics {
        self.accumulator.stats()
    }

    /// Owned snapshot for the merge step.
    pub fn snapshot(&self) -> RunStatistics {
        self.accumulator.snapshot()
    }

    /// Number of tracks credited at the exit face this run.
    pub fn credited_tracks(&self) -> usize {
        self.registry.credited_count()
    }

    /// Return to the begin-of-run state: zero counters, empty registry.
    pub fn reset(&mut self) {
        self.accumulator.reset();
        self.registry.clear();
        self.completed = false;
        self.detections_logged = 0;
    }

    /// Classify and record one observation.
    pub fn feed(&mut self, obs: &StepObservation) -> Result<Classification> {
        let classification = self
            .classifier
            .classify(obs, &mut self.registry)
            .map_err(|source| self.fail(source))?;
        self.accumulator
            .record(&classification)
            .map_err(|source| self.fail(source))?;

        if classification.label == OutcomeLabel::Detected {
            self.log_detection(obs);
        }
        Ok(classification)
    }

    /// Feed every observation of `source`, forwarding termination requests.
    ///
    /// Marks the worker completed when the source is exhausted.
    pub fn drain<S: StepSource + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        loop {
            let obs = match source.next_step() {
                Ok(Some(obs)) => obs,
                Ok(None) => break,
                Err(err) => {
                    return Err(RunError::Source {
                        worker: self.id,
                        source: err,
                    });
                }
            };

            let classification = self.feed(&obs)?;
            if classification.terminate {
                source.terminate(classification.track);
            }
        }

        self.complete();
        Ok(())
    }

    /// Signal that this worker has observed its last step.
    pub fn complete(&mut self) {
        if !self.completed {
            trace!(worker = %self.id, observations = self.stats().observations, "worker completed");
        }
        self.completed = true;
    }

    fn fail(&self, source: TallyError) -> RunError {
        RunError::Tally {
            worker: self.id,
            source,
        }
    }

    fn log_detection(&mut self, obs: &StepObservation) {
        if self.detections_logged >= self.detection_log_limit {
            return;
        }
        self.detections_logged += 1;
        debug!(
            worker = %self.id,
            track = %obs.track,
            energy = %obs.energy,
            x = obs.position.x,
            y = obs.position.y,
            z = obs.position.z,
            "detection {}/{}",
            self.detections_logged,
            self.detection_log_limit
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ReplaySource;
    use tally_core::TallyConfig;
    use types::{
        BoundaryStatus, CreationProcess, Energy, Species, StepProcess, TrackId, Volume,
    };

    fn worker() -> WorkerContext {
        WorkerContext::new(WorkerId(0), Classifier::new(&TallyConfig::default()), 10)
    }

    fn detection(track: u64) -> StepObservation {
        StepObservation::new(TrackId(track), Species::SignalQuantum, Volume::Target)
            .crossing(Volume::Target, Volume::Sensor)
            .on_boundary()
            .with_process(StepProcess::Boundary(BoundaryStatus::FresnelRefraction))
    }

    #[test]
    fn test_drain_forwards_termination() {
        // Track 1 is detected; its trailing step must never reach the classifier.
        let steps = vec![
            detection(1),
            StepObservation::new(TrackId(1), Species::SignalQuantum, Volume::Sensor)
                .with_process(StepProcess::Absorption),
        ];
        let mut source = ReplaySource::new(steps);
        let mut w = worker();

        w.drain(&mut source).unwrap();

        assert!(w.is_completed());
        assert_eq!(w.stats().detected, 1);
        assert_eq!(w.stats().observations, 1);
        assert_eq!(w.stats().terminations_requested, 1);
    }

    #[test]
    fn test_feed_after_termination_is_inconsistency() {
        let mut w = worker();
        w.feed(&detection(5)).unwrap();

        let err = w.feed(&detection(5)).unwrap_err();
        assert!(matches!(
            err,
            RunError::Tally {
                worker: WorkerId(0),
                source: TallyError::DedupRegistryInconsistency { track: TrackId(5) },
            }
        ));
    }

    #[test]
    fn test_reset_clears_counters_and_registry() {
        let mut w = worker();
        let created = StepObservation::creation(
            TrackId(1),
            Species::SignalQuantum,
            CreationProcess::Scintillation,
            Energy::from_ev(2.0).unwrap(),
        );
        w.feed(&created).unwrap();
        w.feed(&detection(1)).unwrap();
        w.complete();

        w.reset();

        assert!(w.stats().is_empty());
        assert_eq!(w.credited_tracks(), 0);
        assert!(!w.is_completed());
        // Track 1 was terminated last run; a fresh run accepts it again.
        w.feed(&detection(1)).unwrap();
    }

    #[test]
    fn test_detection_log_limit() {
        let config = TallyConfig::default().with_detection_log_limit(2);
        let mut w = WorkerContext::new(
            WorkerId(1),
            Classifier::new(&config),
            config.detection_log_limit,
        );

        for track in 1..=3 {
            w.feed(&detection(track)).unwrap();
        }
        assert_eq!(w.stats().detected, 3);
        assert_eq!(w.detections_logged, 2);

        w.reset();
        assert_eq!(w.detections_logged, 0);
        w.feed(&detection(1)).unwrap();
        assert_eq!(w.detections_logged, 1);
    }
}
