//! Classification configuration.
//!
//! Defaults describe the reference detector: a CsI(Tl) scintillator volume
//! named `Tank` (half-thickness 0.2 mm along z) read out through a
//! `Photodiode` glued to its +z face.

use serde::{Deserialize, Serialize};
use types::{Axis, CreationProcess, Position};

/// Engine process names, grouped by what they mean for classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessNames {
    /// The optical boundary process.
    pub boundary: String,
    /// Bulk absorption processes.
    pub absorption: Vec<String>,
    /// Bulk scattering processes.
    pub scattering: Vec<String>,
    /// Creator names that mean scintillation.
    pub scintillation: Vec<String>,
    /// Creator names that mean Cerenkov emission.
    pub cerenkov: Vec<String>,
}

impl Default for ProcessNames {
    fn default() -> Self {
        Self {
            boundary: "OpBoundary".to_string(),
            absorption: vec!["OpAbsorption".to_string()],
            scattering: vec!["OpRayleigh".to_string(), "OpMieHG".to_string()],
            scintillation: vec!["Scintillation".to_string()],
            cerenkov: vec!["Cerenkov".to_string()],
        }
    }
}

/// Plane through which signal quanta leave the target towards the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitFace {
    /// Axis normal to the face.
    pub axis: Axis,
    /// Coordinate of the face along `axis` (mm).
    pub plane_mm: f64,
    /// Half-width of the acceptance band around the plane (mm).
    pub tolerance_mm: f64,
}

impl ExitFace {
    /// Whether `position` lies strictly within tolerance of the face.
    #[inline]
    pub fn contains(&self, position: &Position) -> bool {
        (position.along(self.axis) - self.plane_mm).abs() < self.tolerance_mm
    }
}

impl Default for ExitFace {
    fn default() -> Self {
        Self {
            axis: Axis::Z,
            plane_mm: 0.2,
            tolerance_mm: 0.1,
        }
    }
}

/// Everything the mapper and classifier need to know about the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Name of the scintillating target volume.
    pub target_volume: String,
    /// Name of the sensor volume.
    pub sensor_volume: String,
    /// Process name tables.
    pub processes: ProcessNames,
    /// Exit face of the target.
    pub exit_face: ExitFace,
    /// Creation processes whose products are counted as `Created`.
    pub recognized_creators: Vec<CreationProcess>,
    /// Also terminate a track on its second boundary interaction.
    pub kill_on_second_surface: bool,
    /// How many detections per worker to log individually.
    pub detection_log_limit: u64,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            target_volume: "Tank".to_string(),
            sensor_volume: "Photodiode".to_string(),
            processes: ProcessNames::default(),
            exit_face: ExitFace::default(),
            recognized_creators: vec![CreationProcess::Scintillation],
            kill_on_second_surface: false,
            detection_log_limit: 10,
        }
    }
}

impl TallyConfig {
    /// Set the target and sensor volume names.
    pub fn with_volumes(mut self, target: impl Into<String>, sensor: impl Into<String>) -> Self {
        self.target_volume = target.into();
        self.sensor_volume = sensor.into();
        self
    }

    /// Set the exit face.
    pub fn with_exit_face(mut self, exit_face: ExitFace) -> Self {
        self.exit_face = exit_face;
        self
    }

    /// Set which creation processes count as `Created`.
    pub fn with_recognized_creators(mut self, creators: Vec<CreationProcess>) -> Self {
        self.recognized_creators = creators;
        self
    }

    /// Enable or disable kill-on-second-surface.
    pub fn with_kill_on_second_surface(mut self, enabled: bool) -> Self {
        self.kill_on_second_surface = enabled;
        self
    }

    /// Set the per-worker detection log limit.
    pub fn with_detection_log_limit(mut self, limit: u64) -> Self {
        self.detection_log_limit = limit;
        self
    }
}
