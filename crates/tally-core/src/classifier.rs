//! Event classifier: one label per step observation.
//!
//! # Rules
//!
//! Evaluated in order, first match wins:
//!
//! ```text
//! ┌───┬───────────────────────────────────────────────────┬───────────────┐
//! │ # │ Predicate                                         │ Label         │
//! ├───┼───────────────────────────────────────────────────┼───────────────┤
//! │ 1 │ target → sensor, on boundary                      │ Detected      │
//! │ 2 │ on boundary, boundary process                     │ BoundaryEvent │
//! │ 3 │ target → elsewhere, at exit face, not credited    │ ExitFace      │
//! │ 4 │ absorption process                                │ Absorbed      │
//! │ 5 │ scattering process                                │ Scattered     │
//! │ 6 │ creation by a recognized process                  │ Created       │
//! │ 7 │ anything else                                     │ Unclassified  │
//! └───┴───────────────────────────────────────────────────┴───────────────┘
//! ```
//!
//! Rules 1–5 describe the transport of signal quanta and only apply to that
//! species. Detected dominates because it terminates the track, and that
//! decision must not depend on which looser predicate also matched.
//!
//! Classification is a pure function of the observation except for the
//! [`DedupRegistry`], which supplies exit-face credit, termination, and
//! surface-hit state.

use tracing::trace;
use types::{
    CreationProcess, Energy, OutcomeLabel, Species, StepObservation, StepProcess, TrackId, Volume,
};

use crate::config::{ExitFace, TallyConfig};
use crate::dedup::DedupRegistry;
use crate::error::{Result, TallyError};

/// Outcome of classifying one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The label.
    pub label: OutcomeLabel,
    /// Track the observation belongs to.
    pub track: TrackId,
    /// Energy to add to the accumulated sum (zero unless Detected/Created).
    pub energy: Energy,
    /// Ask the engine to stop this track now.
    pub terminate: bool,
}

impl Classification {
    fn new(label: OutcomeLabel, obs: &StepObservation) -> Self {
        Self {
            label,
            track: obs.track,
            energy: Energy::ZERO,
            terminate: false,
        }
    }

    fn with_energy(mut self, energy: Energy) -> Self {
        self.energy = energy;
        self
    }

    fn terminating(mut self) -> Self {
        self.terminate = true;
        self
    }
}

/// Stateless rule set; all mutable state lives in the caller's registry.
#[derive(Debug, Clone)]
pub struct Classifier {
    exit_face: ExitFace,
    recognized_creators: Vec<CreationProcess>,
    kill_on_second_surface: bool,
}

impl Classifier {
    /// Build the rule set from the classification config.
    pub fn new(config: &TallyConfig) -> Self {
        Self {
            exit_face: config.exit_face,
            recognized_creators: config.recognized_creators.clone(),
            kill_on_second_surface: config.kill_on_second_surface,
        }
    }

    /// Classify one observation.
    ///
    /// # Errors
    ///
    /// [`TallyError::DedupRegistryInconsistency`] if the observation belongs
    /// to a track whose termination was already requested.
    pub fn classify(
        &self,
        obs: &StepObservation,
        registry: &mut DedupRegistry,
    ) -> Result<Classification> {
        if registry.is_terminated(obs.track) {
            return Err(TallyError::DedupRegistryInconsistency { track: obs.track });
        }

        let classification = match obs.species {
            Species::SignalQuantum => self
                .classify_transport(obs, registry)
                .unwrap_or_else(|| self.classify_creation(obs)),
            Species::Carrier => self.classify_creation(obs),
        };

        if classification.terminate {
            registry.mark_terminated(obs.track);
        }
        if classification.label == OutcomeLabel::Unclassified {
            trace!(track = %obs.track, ?obs, "unclassified observation");
        }
        Ok(classification)
    }

    /// Rules 1–5.
    fn classify_transport(
        &self,
        obs: &StepObservation,
        registry: &mut DedupRegistry,
    ) -> Option<Classification> {
        // 1. Detected
        if obs.boundary_crossing
            && obs.pre_volume == Volume::Target
            && obs.post_volume == Volume::Sensor
        {
            return Some(
                Classification::new(OutcomeLabel::Detected, obs)
                    .with_energy(obs.energy)
                    .terminating(),
            );
        }

        // 2. Boundary interaction
        if obs.boundary_crossing {
            if let Some(StepProcess::Boundary(status)) = obs.process {
                let hits = registry.record_surface_hit(obs.track);
                let c = Classification::new(OutcomeLabel::BoundaryEvent(status), obs);
                return Some(if self.kill_on_second_surface && hits >= 2 {
                    c.terminating()
                } else {
                    c
                });
            }
        }

        // 3. Exit face, first arrival only
        if obs.pre_volume == Volume::Target
            && obs.post_volume != Volume::Target
            && self.exit_face.contains(&obs.position)
            && registry.credit(obs.track)
        {
            return Some(Classification::new(OutcomeLabel::ExitFace, obs));
        }

        // 4–5. Bulk processes
        match obs.process {
            Some(StepProcess::Absorption) => Some(Classification::new(
                OutcomeLabel::Absorbed {
                    in_target: obs.pre_volume == Volume::Target,
                },
                obs,
            )),
            Some(StepProcess::Scattering) => {
                Some(Classification::new(OutcomeLabel::Scattered, obs))
            }
            _ => None,
        }
    }

    /// Rules 6–7.
    fn classify_creation(&self, obs: &StepObservation) -> Classification {
        match obs.creation {
            Some(process)
                if obs.species == Species::SignalQuantum
                    && self.recognized_creators.contains(&process) =>
            {
                Classification::new(OutcomeLabel::Created, obs).with_energy(obs.energy)
            }
            _ => Classification::new(OutcomeLabel::Unclassified, obs),
        }
    }
}
