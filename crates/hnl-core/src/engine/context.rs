use nalgebra::{Unit, Vector3};

use super::config::{ExperimentConfig, PipelineConfig};
use super::progress::ProgressReporter;
use crate::core::detector::model::DetectorModel;
use crate::core::models::model::ModelPoint;

/// Everything one pipeline invocation reads, borrowed for the duration of the run.
#[derive(Clone, Copy)]
pub struct SimulationContext<'a> {
    pub model: &'a ModelPoint,
    pub experiment: &'a ExperimentConfig,
    pub config: &'a PipelineConfig,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> SimulationContext<'a> {
    pub fn new(
        model: &'a ModelPoint,
        experiment: &'a ExperimentConfig,
        config: &'a PipelineConfig,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            model,
            experiment,
            config,
            reporter,
        }
    }

    pub fn detector(&self) -> &'a DetectorModel {
        &self.experiment.detector
    }

    pub fn beam_direction(&self) -> Unit<Vector3<f64>> {
        self.config.beam_direction
    }
}
