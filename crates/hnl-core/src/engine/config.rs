use nalgebra::{Unit, Vector3};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use super::error::EngineError;
use crate::core::detector::model::DetectorModel;
use crate::core::flux::TabulatedFlux;
use crate::core::models::event::SelectionIndex;
use crate::core::models::model::ModelPoint;
use crate::core::models::particle::ParticleType;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FluxSource {
    pub experiment: String,
    pub species: String,
    /// Upper edge of the injection spectrum in GeV; the lower edge is the lepton mass.
    pub energy_max: f64,
}

impl Default for FluxSource {
    fn default() -> Self {
        Self {
            experiment: "T2K_NEAR".to_string(),
            species: "PLUS_numu".to_string(),
            energy_max: 20.0,
        }
    }
}

/// Bounds on how far upstream of the detector production vertices are injected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayWindow {
    /// Injection range in units of the decay length.
    pub multiplier: f64,
    /// Hard cap on the injection range in meters.
    pub max_distance: f64,
}

impl Default for DecayWindow {
    fn default() -> Self {
        Self {
            multiplier: 3.0,
            max_distance: 284.9,
        }
    }
}

/// Transverse and longitudinal extent of the injection cylinder, in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSettings {
    pub radius: f64,
    pub endcap_length: f64,
}

impl Default for RangeSettings {
    fn default() -> Self {
        Self {
            radius: 5.0,
            endcap_length: 9.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionConfig {
    pub index: SelectionIndex,
    pub signal_particle: ParticleType,
    pub pot: f64,
    pub efficiency: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            index: SelectionIndex::DECAY_PHOTON,
            signal_particle: ParticleType::GAMMA,
            pot: 1e21,
            efficiency: 6e-4,
        }
    }
}

/// Location of pre-computed cross-section tables.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSettings {
    pub root: PathBuf,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub experiment: String,
    pub events_to_inject: usize,
    pub resource_dir: PathBuf,
    pub output_dir: PathBuf,
    pub flux: FluxSource,
    pub beam_direction: Unit<Vector3<f64>>,
    pub range: RangeSettings,
    pub decay_window: DecayWindow,
    pub selection: SelectionConfig,
    pub seed: u64,
    pub tables: Option<TableSettings>,
}

impl PipelineConfig {
    /// `<output-dir>/<experiment>_<model tag>_example.json`
    pub fn output_path(&self, model: &ModelPoint) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}_example.json",
            self.experiment,
            model.model_tag()
        ))
    }
}

#[derive(Default)]
pub struct PipelineConfigBuilder {
    experiment: Option<String>,
    events_to_inject: Option<usize>,
    resource_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    flux: Option<FluxSource>,
    beam_direction: Option<[f64; 3]>,
    range: Option<RangeSettings>,
    decay_window: Option<DecayWindow>,
    selection: Option<SelectionConfig>,
    seed: Option<u64>,
    tables: Option<TableSettings>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn experiment(mut self, name: impl Into<String>) -> Self {
        self.experiment = Some(name.into());
        self
    }
    pub fn events_to_inject(mut self, n: usize) -> Self {
        self.events_to_inject = Some(n);
        self
    }
    pub fn resource_dir(mut self, path: PathBuf) -> Self {
        self.resource_dir = Some(path);
        self
    }
    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }
    pub fn flux(mut self, flux: FluxSource) -> Self {
        self.flux = Some(flux);
        self
    }
    pub fn beam_direction(mut self, direction: [f64; 3]) -> Self {
        self.beam_direction = Some(direction);
        self
    }
    pub fn range(mut self, range: RangeSettings) -> Self {
        self.range = Some(range);
        self
    }
    pub fn decay_window(mut self, window: DecayWindow) -> Self {
        self.decay_window = Some(window);
        self
    }
    pub fn selection(mut self, selection: SelectionConfig) -> Self {
        self.selection = Some(selection);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn tables(mut self, tables: TableSettings) -> Self {
        self.tables = Some(tables);
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let events_to_inject = self
            .events_to_inject
            .ok_or(ConfigError::MissingParameter("events_to_inject"))?;
        if events_to_inject == 0 {
            return Err(invalid("events_to_inject", "must be at least 1"));
        }

        let direction = self.beam_direction.unwrap_or([0.0, 0.0, 1.0]);
        let beam_direction = Unit::try_new(Vector3::from(direction), f64::EPSILON)
            .ok_or_else(|| invalid("beam_direction", "must be a non-zero vector"))?;

        let flux = self.flux.unwrap_or_default();
        if !(flux.energy_max.is_finite() && flux.energy_max > 0.0) {
            return Err(invalid("flux.energy_max", "must be positive"));
        }

        let range = self.range.unwrap_or_default();
        if !(range.radius > 0.0 && range.endcap_length > 0.0) {
            return Err(invalid("range", "radius and endcap length must be positive"));
        }

        let decay_window = self.decay_window.unwrap_or_default();
        if !(decay_window.multiplier > 0.0 && decay_window.max_distance > 0.0) {
            return Err(invalid(
                "decay_window",
                "multiplier and maximum distance must be positive",
            ));
        }

        let selection = self.selection.unwrap_or_default();
        if !(selection.pot.is_finite() && selection.pot >= 0.0) {
            return Err(invalid("selection.pot", "must be finite and non-negative"));
        }
        if !(selection.efficiency.is_finite() && selection.efficiency >= 0.0) {
            return Err(invalid(
                "selection.efficiency",
                "must be finite and non-negative",
            ));
        }

        Ok(PipelineConfig {
            experiment: self
                .experiment
                .ok_or(ConfigError::MissingParameter("experiment"))?,
            events_to_inject,
            resource_dir: self
                .resource_dir
                .ok_or(ConfigError::MissingParameter("resource_dir"))?,
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
            flux,
            beam_direction,
            range,
            decay_window,
            selection,
            seed: self.seed.unwrap_or(1),
            tables: self.tables,
        })
    }
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        reason: reason.to_string(),
    }
}

/// The experiment a pipeline runs against: its detector and its neutrino flux.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    pub name: String,
    pub events_to_inject: usize,
    pub detector: DetectorModel,
    pub flux: Arc<TabulatedFlux>,
}

impl ExperimentConfig {
    pub fn load(config: &PipelineConfig) -> Result<Self, EngineError> {
        let detector_path = DetectorModel::resource_path(&config.resource_dir, &config.experiment);
        let detector = DetectorModel::load(&detector_path)?;
        let flux_path = TabulatedFlux::resource_path(
            &config.resource_dir,
            &config.flux.experiment,
            &config.flux.species,
        );
        let flux = TabulatedFlux::load(&flux_path)?;
        Ok(Self {
            name: config.experiment.clone(),
            events_to_inject: config.events_to_inject,
            detector,
            flux: Arc::new(flux),
        })
    }

    pub fn from_parts(
        name: impl Into<String>,
        events_to_inject: usize,
        detector: DetectorModel,
        flux: TabulatedFlux,
    ) -> Self {
        Self {
            name: name.into(),
            events_to_inject,
            detector,
            flux: Arc::new(flux),
        }
    }
}

/// Builder pre-filled for the bundled ND280 upgrade setup.
pub fn nd280_builder(resource_dir: &Path, output_dir: &Path) -> PipelineConfigBuilder {
    PipelineConfigBuilder::new()
        .experiment("ND280UPGRD")
        .events_to_inject(1000)
        .resource_dir(resource_dir.to_path_buf())
        .output_dir(output_dir.to_path_buf())
}
