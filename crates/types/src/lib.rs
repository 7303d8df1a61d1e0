//! Core types for optical step classification.
//!
//! This crate provides the data model shared by the classifier, the run
//! controller and the CLI: identifiers, fixed-point energy, step records,
//! outcome labels, and run statistics.

pub mod energy;
pub mod ids;
pub mod stats;
pub mod step;

pub use energy::{ENERGY_SCALE, Energy};
pub use ids::{RunId, TrackId, WorkerId};
pub use stats::{BoundaryTally, Counter, RunStatistics};
pub use step::{
    Axis, BoundaryStatus, CreationProcess, OutcomeLabel, Position, RawStep, Species,
    StepObservation, StepProcess, Volume,
};
