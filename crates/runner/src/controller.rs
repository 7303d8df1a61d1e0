//! Run lifecycle controller.
//!
//! # State machine
//!
//! ```text
//!            begin_run                end_run (barrier)
//!   Idle ───────────────► RunInProgress ───────────► Merging ──► Reported
//!    ▲                        │   │                     │           │
//!    │   abort / fatal error  │   │ feed, complete      │ overflow  │
//!    └────────────────────────┘   └──► (self)           │           │
//!    ▲                                                  │           │
//!    └──────────────────────────────────────────────────┘           │
//!    ▲                       begin_run (next run)                   │
//!    └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Worker contexts are owned by the controller and lent to worker threads for
//! the duration of [`RunController::run`]. Nothing is shared between workers
//! while a run is in progress; the merged statistics are produced once, after
//! every worker has completed.

use std::sync::Arc;

use serde::Serialize;
use tally_core::{Classification, Classifier};
use tracing::debug;
use types::{RunId, RunStatistics, StepObservation, WorkerId};

use crate::config::RunConfig;
use crate::error::{Result, RunError};
use crate::hooks::{HookRunner, RunHook};
use crate::report::RunReport;
use crate::source::StepSource;
use crate::worker::WorkerContext;

/// Lifecycle state of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RunState {
    Idle,
    RunInProgress,
    Merging,
    Reported,
}

/// Drives runs: reset, per-worker feeding, barrier, merge, report.
pub struct RunController {
    config: RunConfig,
    classifier: Classifier,
    state: RunState,
    run_id: RunId,
    workers: Vec<WorkerContext>,
    hooks: HookRunner,
    report: Option<RunReport>,
}

impl RunController {
    pub fn new(config: RunConfig) -> Self {
        let classifier = Classifier::new(&config.tally);
        Self {
            config,
            classifier,
            state: RunState::Idle,
            run_id: RunId(0),
            workers: Vec::new(),
            hooks: HookRunner::new(),
            report: None,
        }
    }

    /// Register a lifecycle observer.
    pub fn add_hook(&mut self, hook: Arc<dyn RunHook>) {
        self.hooks.add(hook);
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Id of the current run, or of the last one if none is in progress.
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Read-only view of one worker's context.
    pub fn worker(&self, worker: WorkerId) -> Option<&WorkerContext> {
        self.workers.get(worker.0 as usize)
    }

    /// Report of the last completed run, until the next run begins.
    pub fn report(&self) -> Option<&RunReport> {
        self.report.as_ref()
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Start a run with `workers` worker contexts.
    ///
    /// Existing contexts are reset in place; every accumulator is zero and
    /// every registry empty before the first observation.
    pub fn begin_run(&mut self, workers: usize) -> Result<RunId> {
        match self.state {
            RunState::Idle => {}
            RunState::Reported => {
                self.report = None;
                self.transition(RunState::Idle);
            }
            from => {
                return Err(RunError::InvalidTransition {
                    from,
                    action: "begin run",
                });
            }
        }

        self.workers.truncate(workers);
        for worker in &mut self.workers {
            worker.reset();
        }
        let limit = self.config.tally.detection_log_limit;
        for id in self.workers.len()..workers {
            self.workers.push(WorkerContext::new(
                WorkerId(id as u32),
                self.classifier.clone(),
                limit,
            ));
        }

        self.run_id = self.run_id.next();
        self.transition(RunState::RunInProgress);
        self.hooks.on_run_start(self.run_id, workers);
        Ok(self.run_id)
    }

    /// Feed one observation to one worker.
    ///
    /// A classification or accumulation failure aborts the run.
    pub fn feed(&mut self, worker: WorkerId, obs: &StepObservation) -> Result<Classification> {
        let context = self.in_progress_worker(worker, "feed")?;
        if context.is_completed() {
            return Err(RunError::InvalidTransition {
                from: RunState::RunInProgress,
                action: "feed a completed worker",
            });
        }

        match context.feed(obs) {
            Ok(classification) => Ok(classification),
            Err(err) => {
                self.discard(&err);
                Err(err)
            }
        }
    }

    /// Signal that `worker` has observed its last step of this run.
    pub fn complete_worker(&mut self, worker: WorkerId) -> Result<()> {
        self.in_progress_worker(worker, "complete worker")?.complete();
        Ok(())
    }

    /// Barrier, merge and report.
    ///
    /// Fails with [`RunError::PrematureMerge`] (and aborts the run) if any
    /// worker has not completed.
    pub fn end_run(&mut self) -> Result<RunReport> {
        self.expect_state(RunState::RunInProgress, "end run")?;

        let pending: Vec<WorkerId> = self
            .workers
            .iter()
            .filter(|w| !w.is_completed())
            .map(WorkerContext::id)
            .collect();
        if !pending.is_empty() {
            let err = RunError::PrematureMerge { pending };
            self.discard(&err);
            return Err(err);
        }

        self.transition(RunState::Merging);
        let snapshots: Vec<RunStatistics> = self.workers.iter().map(|w| w.snapshot()).collect();
        let merged = parallel::try_reduce_vec(
            snapshots,
            || RunStatistics::ZERO,
            |a, b| tally_core::merge(&a, &b),
            self.config.parallelization.force_sequential,
        );
        let stats = match merged {
            Ok(stats) => stats,
            Err(source) => {
                let err = RunError::Merge(source);
                self.discard(&err);
                return Err(err);
            }
        };

        let report = RunReport::new(
            self.run_id,
            self.workers.len(),
            stats,
            self.config.quantum_efficiency,
        );
        self.transition(RunState::Reported);
        self.hooks.on_report(&report);
        self.report = Some(report.clone());
        Ok(report)
    }

    /// Discard the run in progress and return to `Idle`.
    pub fn abort(&mut self) -> Result<()> {
        self.expect_state(RunState::RunInProgress, "abort")?;
        self.discard(&"aborted by caller");
        Ok(())
    }

    /// Drive a whole run: one worker per source, drained concurrently.
    ///
    /// On the first worker failure (lowest worker id) the run is aborted and
    /// that error returned.
    pub fn run<S>(&mut self, sources: Vec<S>) -> Result<RunReport>
    where
        S: StepSource + Send,
    {
        self.begin_run(sources.len())?;

        let jobs: Vec<(WorkerContext, S)> = std::mem::take(&mut self.workers)
            .into_iter()
            .zip(sources)
            .collect();
        let finished = parallel::map_vec(
            jobs,
            |(mut worker, mut source)| {
                let result = worker.drain(&mut source);
                (worker, result)
            },
            self.config.parallelization.force_sequential,
        );

        let mut first_error = None;
        for (worker, result) in finished {
            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
            self.workers.push(worker);
        }
        if let Some(err) = first_error {
            self.discard(&err);
            return Err(err);
        }

        self.end_run()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn transition(&mut self, to: RunState) {
        debug!(run = %self.run_id, from = ?self.state, ?to, "run state transition");
        self.state = to;
    }

    fn expect_state(&self, expected: RunState, action: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RunError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }

    fn in_progress_worker(
        &mut self,
        worker: WorkerId,
        action: &'static str,
    ) -> Result<&mut WorkerContext> {
        self.expect_state(RunState::RunInProgress, action)?;
        self.workers
            .get_mut(worker.0 as usize)
            .ok_or(RunError::UnknownWorker(worker))
    }

    /// Throw away every worker's partial state.
    fn discard(&mut self, reason: &dyn std::fmt::Display) {
        for worker in &mut self.workers {
            worker.reset();
        }
        self.transition(RunState::Idle);
        self.hooks.on_run_aborted(self.run_id, &reason.to_string());
    }
}

impl std::fmt::Debug for RunController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunController")
            .field("state", &self.state)
            .field("run_id", &self.run_id)
            .field("workers", &self.workers.len())
            .field("hooks", &self.hooks)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Species, TrackId, Volume};

    fn step(track: u64) -> StepObservation {
        StepObservation::new(TrackId(track), Species::SignalQuantum, Volume::Target)
    }

    #[test]
    fn test_transitions_from_idle() {
        let mut controller = RunController::new(RunConfig::default());
        assert_eq!(controller.state(), RunState::Idle);

        assert!(matches!(
            controller.end_run(),
            Err(RunError::InvalidTransition { from: RunState::Idle, .. })
        ));
        assert!(matches!(
            controller.feed(WorkerId(0), &step(1)),
            Err(RunError::InvalidTransition { from: RunState::Idle, .. })
        ));
        assert!(controller.abort().is_err());
    }

    #[test]
    fn test_begin_run_twice_is_rejected() {
        let mut controller = RunController::new(RunConfig::default());
        assert_eq!(controller.begin_run(1).unwrap(), RunId(1));
        assert!(matches!(
            controller.begin_run(1),
            Err(RunError::InvalidTransition {
                from: RunState::RunInProgress,
                action: "begin run",
            })
        ));
    }

    #[test]
    fn test_unknown_worker() {
        let mut controller = RunController::new(RunConfig::default());
        controller.begin_run(2).unwrap();
        assert!(matches!(
            controller.feed(WorkerId(2), &step(1)),
            Err(RunError::UnknownWorker(WorkerId(2)))
        ));
        assert_eq!(controller.state(), RunState::RunInProgress);
    }

    #[test]
    fn test_feed_after_complete_is_rejected() {
        let mut controller = RunController::new(RunConfig::default());
        controller.begin_run(1).unwrap();
        controller.complete_worker(WorkerId(0)).unwrap();
        assert!(controller.feed(WorkerId(0), &step(1)).is_err());
    }

    #[test]
    fn test_worker_pool_resizes_between_runs() {
        let mut controller = RunController::new(RunConfig::default());
        controller.begin_run(3).unwrap();
        for id in 0..3 {
            controller.complete_worker(WorkerId(id)).unwrap();
        }
        controller.end_run().unwrap();

        controller.begin_run(1).unwrap();
        assert_eq!(controller.worker_count(), 1);
        assert!(controller.report().is_none());
        assert_eq!(controller.run_id(), RunId(2));
    }

    #[test]
    fn test_empty_run_reports_identity() {
        let mut controller = RunController::new(RunConfig::default());
        controller.begin_run(0).unwrap();
        let report = controller.end_run().unwrap();
        assert!(report.stats.is_empty());
        assert_eq!(controller.state(), RunState::Reported);
    }
}
