//! End-of-run report.

use std::fmt;

use serde::Serialize;
use types::{RunId, RunStatistics};

/// Merged statistics for one run plus the derived figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    /// Number of workers whose snapshots were merged.
    pub workers: usize,
    pub stats: RunStatistics,
    pub quantum_efficiency: f64,
    /// `detected × quantum_efficiency`.
    pub estimated_carriers: f64,
    /// `detected / created`, 0 when nothing was created.
    pub detection_efficiency: f64,
}

impl RunReport {
    pub fn new(run_id: RunId, workers: usize, stats: RunStatistics, quantum_efficiency: f64) -> Self {
        Self {
            run_id,
            workers,
            stats,
            quantum_efficiency,
            estimated_carriers: stats.detected as f64 * quantum_efficiency,
            detection_efficiency: stats.detection_efficiency(),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        writeln!(f, "========== {} ({} workers) ==========", self.run_id, self.workers)?;
        writeln!(f, "Total scintillation photons created: {}", s.created)?;
        writeln!(f, "Photons exiting target exit face:    {}", s.escaped_exit_face)?;
        writeln!(f, "Photons detected at sensor:          {}", s.detected)?;
        writeln!(
            f,
            "Photons absorbed:                    {} ({} in target)",
            s.absorbed, s.absorbed_in_target
        )?;
        writeln!(f, "Photons scattered:                   {}", s.scattered)?;
        writeln!(
            f,
            "Estimated electrons:                 {:.1} (QE {:.2})",
            self.estimated_carriers, self.quantum_efficiency
        )?;
        writeln!(
            f,
            "Detection efficiency:                {:.4}",
            self.detection_efficiency
        )?;
        writeln!(f, "Accumulated energy:                  {}", s.energy)?;
        if s.unclassified > 0 {
            writeln!(f, "Unclassified observations:           {}", s.unclassified)?;
        }
        if s.boundary_events > 0 {
            writeln!(f, "Boundary interactions:               {}", s.boundary_events)?;
            for (status, count) in s.boundary.non_zero() {
                writeln!(f, "  {:<32} {}", status.name(), count)?;
            }
        }
        Ok(())
    }
}
