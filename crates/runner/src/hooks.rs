//! Run hooks for observing lifecycle events.
//!
//! Hooks are **observers**: they receive owned or shared-immutable data at
//! run start, abort and report time and cannot influence the run.
//!
//! ```text
//! begin_run ──► on_run_start(run, workers)
//!     │
//!     ├── abort / fatal error ──► on_run_aborted(run, reason)
//!     ▼
//! end_run ────► on_report(&RunReport)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use runner::{ReportLog, RunController};
//! use std::sync::Arc;
//!
//! let log = Arc::new(ReportLog::new());
//! let mut controller = RunController::new(config);
//! controller.add_hook(log.clone());
//! // ... runs ...
//! for report in log.reports() { println!("{report}"); }
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};
use types::RunId;

use crate::report::RunReport;

// ─────────────────────────────────────────────────────────────────────────────
// RunHook Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for run observers.
///
/// Hooks must be `Send + Sync`; use interior mutability for hook-owned state.
pub trait RunHook: Send + Sync {
    /// Human-readable name for logging and debugging.
    fn name(&self) -> &str;

    /// Called after every worker context has been reset for a new run.
    #[allow(unused_variables)]
    fn on_run_start(&self, run: RunId, workers: usize) {}

    /// Called when a run is discarded without a report.
    #[allow(unused_variables)]
    fn on_run_aborted(&self, run: RunId, reason: &str) {}

    /// Called once per completed run with the merged report.
    #[allow(unused_variables)]
    fn on_report(&self, report: &RunReport) {}
}

// ─────────────────────────────────────────────────────────────────────────────
// HookRunner
// ─────────────────────────────────────────────────────────────────────────────

/// Manages hook registration and sequential invocation.
///
/// Hooks are called in registration order.
#[derive(Default)]
pub struct HookRunner {
    hooks: Vec<Arc<dyn RunHook>>,
}

impl HookRunner {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Register a hook. Hooks are called in registration order.
    pub fn add(&mut self, hook: Arc<dyn RunHook>) {
        self.hooks.push(hook);
    }

    pub fn on_run_start(&self, run: RunId, workers: usize) {
        for hook in &self.hooks {
            hook.on_run_start(run, workers);
        }
    }

    pub fn on_run_aborted(&self, run: RunId, reason: &str) {
        for hook in &self.hooks {
            hook.on_run_aborted(run, reason);
        }
    }

    pub fn on_report(&self, report: &RunReport) {
        for hook in &self.hooks {
            hook.on_report(report);
        }
    }
}

impl std::fmt::Debug for HookRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.hooks.iter().map(|h| h.name()).collect();
        f.debug_struct("HookRunner").field("hooks", &names).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Built-in Hooks
// ─────────────────────────────────────────────────────────────────────────────

/// Logs lifecycle events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingHook;

impl RunHook for TracingHook {
    fn name(&self) -> &str {
        "Tracing"
    }

    fn on_run_start(&self, run: RunId, workers: usize) {
        info!(%run, workers, "run started");
    }

    fn on_run_aborted(&self, run: RunId, reason: &str) {
        warn!(%run, reason, "run aborted, partial statistics discarded");
    }

    fn on_report(&self, report: &RunReport) {
        info!(
            run = %report.run_id,
            created = report.stats.created,
            detected = report.stats.detected,
            exit_face = report.stats.escaped_exit_face,
            estimated_carriers = report.estimated_carriers,
            "run reported"
        );
    }
}

/// Keeps every report (and every abort) for later inspection.
#[derive(Debug, Default)]
pub struct ReportLog {
    reports: Mutex<Vec<RunReport>>,
    aborted: Mutex<Vec<RunId>>,
}

impl ReportLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports received so far, oldest first.
    pub fn reports(&self) -> Vec<RunReport> {
        self.reports.lock().clone()
    }

    /// Most recent report.
    pub fn last(&self) -> Option<RunReport> {
        self.reports.lock().last().cloned()
    }

    /// Runs that were aborted, oldest first.
    pub fn aborted(&self) -> Vec<RunId> {
        self.aborted.lock().clone()
    }
}

impl RunHook for ReportLog {
    fn name(&self) -> &str {
        "ReportLog"
    }

    fn on_run_aborted(&self, run: RunId, _reason: &str) {
        self.aborted.lock().push(run);
    }

    fn on_report(&self, report: &RunReport) {
        self.reports.lock().push(report.clone());
    }
}
