//! Run configuration options.

use serde::{Deserialize, Serialize};
use tally_core::TallyConfig;

/// Quantum efficiency of the reference photodiode.
pub const DEFAULT_QUANTUM_EFFICIENCY: f64 = 0.9;

/// Runtime switches for parallel execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelizationConfig {
    /// Drain workers one after another on the calling thread, even when the
    /// `parallel` feature is enabled.
    pub force_sequential: bool,
}

/// Configuration for the run controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Detector names, process tables and classification options.
    pub tally: TallyConfig,

    /// Converts a detected count into an estimated carrier count.
    pub quantum_efficiency: f64,

    /// Parallel execution switches.
    pub parallelization: ParallelizationConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tally: TallyConfig::default(),
            quantum_efficiency: DEFAULT_QUANTUM_EFFICIENCY,
            parallelization: ParallelizationConfig::default(),
        }
    }
}

impl RunConfig {
    /// Set the classification configuration.
    pub fn with_tally(mut self, tally: TallyConfig) -> Self {
        self.tally = tally;
        self
    }

    /// Set the quantum efficiency.
    pub fn with_quantum_efficiency(mut self, qe: f64) -> Self {
        self.quantum_efficiency = qe;
        self
    }

    /// Force sequential worker execution.
    pub fn with_force_sequential(mut self, force: bool) -> Self {
        self.parallelization.force_sequential = force;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.quantum_efficiency, 0.9);
        assert!(!config.parallelization.force_sequential);
        assert_eq!(config.tally.target_volume, "Tank");
    }

    #[test]
    fn test_from_partial_json() {
        let json = r#"{"quantum_efficiency":0.75,"tally":{"sensor_volume":"SiPM"}}"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.quantum_efficiency, 0.75);
        assert_eq!(config.tally.sensor_volume, "SiPM");
        assert_eq!(config.tally.target_volume, "Tank");
    }
}
