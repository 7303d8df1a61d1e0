//! Classification and statistics core.
//!
//! Turns the transport engine's per-step records into run statistics:
//!
//! ```text
//! RawStep ──► StepMapper ──► StepObservation ──► Classifier ──► Classification
//!                                                   ▲   │
//!                                     DedupRegistry ┘   ▼
//!                                                   RunAccumulator ──► snapshot
//!                                                                        │
//!                             merge / merge_all (order independent) ◄────┘
//! ```
//!
//! Each worker owns one [`DedupRegistry`] and one [`RunAccumulator`]. Nothing
//! here is shared between workers; snapshots are combined only by
//! [`merge`]/[`merge_all`] after every worker has finished.

pub mod accumulator;
pub mod classifier;
pub mod config;
pub mod dedup;
pub mod error;
pub mod mapper;
pub mod merge;

pub use accumulator::RunAccumulator;
pub use classifier::{Classification, Classifier};
pub use config::{ExitFace, ProcessNames, TallyConfig};
pub use dedup::DedupRegistry;
pub use error::{Result, TallyError};
pub use mapper::StepMapper;
pub use merge::{merge, merge_all};
