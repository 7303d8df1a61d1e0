//! Translation of engine step records into classifier input.
//!
//! Volume and process names are compared here and nowhere else. Everything
//! downstream works on the closed enums in `types`.

use types::{
    BoundaryStatus, CreationProcess, Energy, RawStep, StepObservation, StepProcess, TrackId, Volume,
};

use crate::config::{ProcessNames, TallyConfig};
use crate::error::{Result, TallyError};

/// Maps [`RawStep`] records to [`StepObservation`]s using the configured names.
#[derive(Debug, Clone)]
pub struct StepMapper {
    target_volume: String,
    sensor_volume: String,
    processes: ProcessNames,
}

impl StepMapper {
    /// Build a mapper from the classification config.
    pub fn new(config: &TallyConfig) -> Self {
        Self {
            target_volume: config.target_volume.clone(),
            sensor_volume: config.sensor_volume.clone(),
            processes: config.processes.clone(),
        }
    }

    /// Resolve all names in `raw`.
    ///
    /// Fails only on an energy that cannot be represented; unknown names map
    /// to the `Other` variants.
    pub fn map(&self, raw: &RawStep) -> Result<StepObservation> {
        let track = TrackId(raw.track_id);
        let energy = Energy::from_ev(raw.energy_ev).ok_or(TallyError::InvalidEnergy {
            track,
            value: raw.energy_ev,
        })?;

        Ok(StepObservation {
            track,
            species: raw.species,
            pre_volume: self.volume(raw.pre_volume.as_deref()),
            post_volume: self.volume(raw.post_volume.as_deref()),
            boundary_crossing: raw.boundary,
            process: raw
                .process
                .as_deref()
                .map(|name| self.process(name, raw.boundary_status.as_deref())),
            position: raw.position.into(),
            energy,
            creation: raw.creator.as_deref().map(|name| self.creator(name)),
        })
    }

    fn volume(&self, name: Option<&str>) -> Volume {
        match name {
            Some(n) if n == self.target_volume => Volume::Target,
            Some(n) if n == self.sensor_volume => Volume::Sensor,
            _ => Volume::Other,
        }
    }

    fn process(&self, name: &str, status: Option<&str>) -> StepProcess {
        if name == self.processes.boundary {
            let status = status
                .map(BoundaryStatus::from_engine_name)
                .unwrap_or(BoundaryStatus::Undefined);
            StepProcess::Boundary(status)
        } else if contains(&self.processes.absorption, name) {
            StepProcess::Absorption
        } else if contains(&self.processes.scattering, name) {
            StepProcess::Scattering
        } else {
            StepProcess::Other
        }
    }

    fn creator(&self, name: &str) -> CreationProcess {
        if contains(&self.processes.scintillation, name) {
            CreationProcess::Scintillation
        } else if contains(&self.processes.cerenkov, name) {
            CreationProcess::Cerenkov
        } else {
            CreationProcess::Other
        }
    }
}

fn contains(names: &[String], name: &str) -> bool {
    names.iter().any(|n| n == name)
}
