//! Step records and outcome labels.
//!
//! Two representations of a transport step exist:
//!
//! - [`RawStep`]: what the transport engine reports, with volume and process
//!   *names*. Serializable so traces can be recorded and replayed.
//! - [`StepObservation`]: the same step after every name has been mapped to a
//!   closed enum. Classification only ever sees this form.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::energy::Energy;
use crate::ids::TrackId;

// =============================================================================
// Track Attributes
// =============================================================================

/// Particle species, as far as classification is concerned.
///
/// Decoding never fails: any particle name other than the optical photon's
/// (`"e-"`, `"gamma"`, ...) is a [`Species::Carrier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Species {
    /// Any particle other than the signal quantum (electrons, gammas, ...).
    Carrier,
    /// Optical photon; the particle whose fate is being tallied.
    SignalQuantum,
}

impl Species {
    /// Map the engine's particle name.
    pub fn from_engine_name(name: &str) -> Self {
        match name {
            "signal_quantum" | "optical_photon" | "opticalphoton" => Species::SignalQuantum,
            _ => Species::Carrier,
        }
    }
}

impl From<String> for Species {
    fn from(name: String) -> Self {
        Self::from_engine_name(&name)
    }
}

/// Process that produced a secondary track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationProcess {
    Scintillation,
    Cerenkov,
    /// Any creator name not present in the process tables.
    Other,
}

// =============================================================================
// Geometry
// =============================================================================

/// Volume a step point lies in, relative to the detector layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Volume {
    /// The scintillating volume whose output is measured.
    Target,
    /// The photosensor attached to the target's exit face.
    Sensor,
    /// World, wrapping, or any unnamed volume (including "outside the world").
    Other,
}

/// Cartesian axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Post-step position in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Coordinate along `axis`.
    #[inline]
    pub fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

impl From<[f64; 3]> for Position {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

// =============================================================================
// Boundary Status
// =============================================================================

/// Status reported by the engine's optical boundary process.
///
/// Mirrors the engine's status enumeration. Names the engine may add later
/// land in [`BoundaryStatus::Other`] rather than failing the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BoundaryStatus {
    Undefined,
    Transmission,
    FresnelRefraction,
    FresnelReflection,
    TotalInternalReflection,
    LambertianReflection,
    LobeReflection,
    SpikeReflection,
    BackScattering,
    Absorption,
    Detection,
    NotAtBoundary,
    SameMaterial,
    StepTooSmall,
    NoRINDEX,
    Other,
}

impl BoundaryStatus {
    /// Number of distinct statuses.
    pub const COUNT: usize = 16;

    /// Every status, in declaration order (matches [`BoundaryStatus::index`]).
    pub const ALL: [BoundaryStatus; Self::COUNT] = [
        BoundaryStatus::Undefined,
        BoundaryStatus::Transmission,
        BoundaryStatus::FresnelRefraction,
        BoundaryStatus::FresnelReflection,
        BoundaryStatus::TotalInternalReflection,
        BoundaryStatus::LambertianReflection,
        BoundaryStatus::LobeReflection,
        BoundaryStatus::SpikeReflection,
        BoundaryStatus::BackScattering,
        BoundaryStatus::Absorption,
        BoundaryStatus::Detection,
        BoundaryStatus::NotAtBoundary,
        BoundaryStatus::SameMaterial,
        BoundaryStatus::StepTooSmall,
        BoundaryStatus::NoRINDEX,
        BoundaryStatus::Other,
    ];

    /// Dense index for table storage.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Map the engine's status name. Unknown names map to `Other`.
    pub fn from_engine_name(name: &str) -> Self {
        match name {
            "Undefined" => BoundaryStatus::Undefined,
            "Transmission" => BoundaryStatus::Transmission,
            "FresnelRefraction" => BoundaryStatus::FresnelRefraction,
            "FresnelReflection" => BoundaryStatus::FresnelReflection,
            "TotalInternalReflection" => BoundaryStatus::TotalInternalReflection,
            "LambertianReflection" => BoundaryStatus::LambertianReflection,
            "LobeReflection" => BoundaryStatus::LobeReflection,
            "SpikeReflection" => BoundaryStatus::SpikeReflection,
            "BackScattering" => BoundaryStatus::BackScattering,
            "Absorption" => BoundaryStatus::Absorption,
            "Detection" => BoundaryStatus::Detection,
            "NotAtBoundary" => BoundaryStatus::NotAtBoundary,
            "SameMaterial" => BoundaryStatus::SameMaterial,
            "StepTooSmall" => BoundaryStatus::StepTooSmall,
            "NoRINDEX" => BoundaryStatus::NoRINDEX,
            _ => BoundaryStatus::Other,
        }
    }

    /// Short name used in reports.
    pub fn name(self) -> &'static str {
        match self {
            BoundaryStatus::Undefined => "Undefined",
            BoundaryStatus::Transmission => "Transmission",
            BoundaryStatus::FresnelRefraction => "FresnelRefraction",
            BoundaryStatus::FresnelReflection => "FresnelReflection",
            BoundaryStatus::TotalInternalReflection => "TotalInternalReflection",
            BoundaryStatus::LambertianReflection => "LambertianReflection",
            BoundaryStatus::LobeReflection => "LobeReflection",
            BoundaryStatus::SpikeReflection => "SpikeReflection",
            BoundaryStatus::BackScattering => "BackScattering",
            BoundaryStatus::Absorption => "Absorption",
            BoundaryStatus::Detection => "Detection",
            BoundaryStatus::NotAtBoundary => "NotAtBoundary",
            BoundaryStatus::SameMaterial => "SameMaterial",
            BoundaryStatus::StepTooSmall => "StepTooSmall",
            BoundaryStatus::NoRINDEX => "NoRINDEX",
            BoundaryStatus::Other => "Other",
        }
    }
}

impl fmt::Display for BoundaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Step Process
// =============================================================================

/// Process that limited a step, mapped from the engine's process name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepProcess {
    /// The optical boundary process, with the status it reported.
    Boundary(BoundaryStatus),
    /// Bulk absorption.
    Absorption,
    /// Bulk scattering (Rayleigh, Mie).
    Scattering,
    /// Transportation, or any process the tables do not name.
    Other,
}

// =============================================================================
// Step Observation
// =============================================================================

/// One immutable step record, with all names resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepObservation {
    /// Identity of the owning track.
    pub track: TrackId,
    /// Species of the owning track.
    pub species: Species,
    /// Volume of the pre-step point.
    pub pre_volume: Volume,
    /// Volume of the post-step point.
    pub post_volume: Volume,
    /// Whether the post-step point lies on a geometric boundary.
    pub boundary_crossing: bool,
    /// Process that defined the step, if the engine reported one.
    pub process: Option<StepProcess>,
    /// Post-step position (mm).
    pub position: Position,
    /// Kinetic energy at the post-step point (for creation records: the
    /// created track's initial energy).
    pub energy: Energy,
    /// Set when this record announces the creation of `track`.
    pub creation: Option<CreationProcess>,
}

impl StepObservation {
    /// A plain transport step inside `volume` with no process and zero energy.
    ///
    /// Builder methods below fill in the rest; mostly useful for tests and
    /// for synthetic traces.
    pub fn new(track: TrackId, species: Species, volume: Volume) -> Self {
        Self {
            track,
            species,
            pre_volume: volume,
            post_volume: volume,
            boundary_crossing: false,
            process: None,
            position: Position::ORIGIN,
            energy: Energy::ZERO,
            creation: None,
        }
    }

    /// A creation record for a freshly produced track.
    pub fn creation(
        track: TrackId,
        species: Species,
        process: CreationProcess,
        energy: Energy,
    ) -> Self {
        Self {
            creation: Some(process),
            energy,
            ..Self::new(track, species, Volume::Target)
        }
    }

    /// Set pre/post volumes.
    pub fn crossing(mut self, pre: Volume, post: Volume) -> Self {
        self.pre_volume = pre;
        self.post_volume = post;
        self
    }

    /// Mark the post-step point as lying on a boundary.
    pub fn on_boundary(mut self) -> Self {
        self.boundary_crossing = true;
        self
    }

    /// Set the step-defining process.
    pub fn with_process(mut self, process: StepProcess) -> Self {
        self.process = Some(process);
        self
    }

    /// Set the post-step position.
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Set the kinetic energy.
    pub fn with_energy(mut self, energy: Energy) -> Self {
        self.energy = energy;
        self
    }
}

/// A step as recorded from the transport engine, before name mapping.
///
/// This is the line format of replay traces (one JSON object per line).
///
/// ```text
/// {"track_id":1,"species":"signal_quantum","pre_volume":"Tank","post_volume":"Photodiode",
///  "boundary":true,"process":"OpBoundary","boundary_status":"FresnelRefraction",
///  "position":[0.0,0.0,0.2],"energy_ev":2.9}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStep {
    pub track_id: u64,
    pub species: Species,
    #[serde(default)]
    pub pre_volume: Option<String>,
    #[serde(default)]
    pub post_volume: Option<String>,
    #[serde(default)]
    pub boundary: bool,
    #[serde(default)]
    pub process: Option<String>,
    #[serde(default)]
    pub boundary_status: Option<String>,
    #[serde(default)]
    pub position: [f64; 3],
    #[serde(default)]
    pub energy_ev: f64,
    /// Creator process name; present only on creation records.
    #[serde(default)]
    pub creator: Option<String>,
}

// =============================================================================
// Outcome Label
// =============================================================================

/// What happened on one step. Exactly one label per observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeLabel {
    /// Entered the sensor from the target; the track is terminated.
    Detected,
    /// Interaction at an optical surface.
    BoundaryEvent(BoundaryStatus),
    /// First arrival of a track at the target's exit face.
    ExitFace,
    /// Bulk absorption; `in_target` when the step started in the target.
    Absorbed { in_target: bool },
    /// Bulk scattering.
    Scattered,
    /// A new signal quantum was produced.
    Created,
    /// Matched no rule.
    Unclassified,
}

impl fmt::Display for OutcomeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeLabel::Detected => write!(f, "detected"),
            OutcomeLabel::BoundaryEvent(status) => write!(f, "boundary({})", status),
            OutcomeLabel::ExitFace => write!(f, "exit-face"),
            OutcomeLabel::Absorbed { in_target: true } => write!(f, "absorbed(target)"),
            OutcomeLabel::Absorbed { in_target: false } => write!(f, "absorbed"),
            OutcomeLabel::Scattered => write!(f, "scattered"),
            OutcomeLabel::Created => write!(f, "created"),
            OutcomeLabel::Unclassified => write!(f, "unclassified"),
        }
    }
}
