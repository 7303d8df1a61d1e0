//! Run lifecycle for optical step tallies.
//!
//! [`RunController`] owns one [`WorkerContext`] per event stream. A run is
//! either driven step by step (`begin_run`, `feed`, `complete_worker`,
//! `end_run`) or in one call with [`RunController::run`], which drains every
//! worker's [`StepSource`] concurrently and merges at the join.
//!
//! # Example
//!
//! ```ignore
//! use runner::{ReplaySource, RunConfig, RunController};
//!
//! let mut controller = RunController::new(RunConfig::default());
//! let report = controller.run(vec![ReplaySource::new(worker_a), ReplaySource::new(worker_b)])?;
//! println!("{report}");
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod hooks;
pub mod report;
pub mod source;
pub mod worker;

pub use config::{DEFAULT_QUANTUM_EFFICIENCY, ParallelizationConfig, RunConfig};
pub use controller::{RunController, RunState};
pub use error::{Result, RunError, SourceError};
pub use hooks::{HookRunner, ReportLog, RunHook, TracingHook};
pub use report::RunReport;
pub use source::{ReplaySource, StepSource, TraceSource};
pub use worker::WorkerContext;
