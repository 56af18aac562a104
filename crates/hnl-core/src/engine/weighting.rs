use super::distributions::{DistributionSet, PrimarySample};
use super::error::EngineError;
use crate::core::detector::model::DetectorModel;

/// Multiplicative factors making up one event's weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightComponents {
    /// Physical over injection energy density (flux per unit injection probability).
    pub energy: f64,
    pub direction: f64,
    pub position: f64,
    /// Interaction density `sum_i n_i sigma_i` over the injection vertex density.
    pub interaction: f64,
    /// Probability that every simulated decay happened where it was placed.
    pub decay: f64,
    pub branching: f64,
}

impl WeightComponents {
    pub fn total(&self) -> f64 {
        self.energy * self.direction * self.position * self.interaction * self.decay * self.branching
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Converts sampled primaries into weights relative to the physical distributions.
pub struct EventWeighter<'a> {
    distributions: &'a DistributionSet,
    detector: &'a DetectorModel,
}

impl<'a> EventWeighter<'a> {
    pub fn new(distributions: &'a DistributionSet, detector: &'a DetectorModel) -> Self {
        Self {
            distributions,
            detector,
        }
    }

    /// `interaction_density` is `sum_i n_i sigma_i(E)` at the vertex in 1/m; `decay` and
    /// `branching` are the accumulated products over the simulated decays.
    pub fn weigh(
        &self,
        primary: &PrimarySample,
        interaction_density: f64,
        decay: f64,
        branching: f64,
    ) -> Result<WeightComponents, EngineError> {
        let missing = |what: &str| EngineError::Internal(format!("{} distribution missing", what));
        let set = self.distributions;

        let energy = ratio(
            set.physical_energy()
                .ok_or_else(|| missing("physical energy"))?
                .density(primary.energy),
            set.injection_energy()
                .ok_or_else(|| missing("injection energy"))?
                .density(primary.energy),
        );
        let direction = ratio(
            set.physical_direction()
                .ok_or_else(|| missing("physical direction"))?
                .density(&primary.direction),
            set.injection_direction()
                .ok_or_else(|| missing("injection direction"))?
                .density(&primary.direction),
        );

        let injection_position = set
            .injection_position()
            .ok_or_else(|| missing("injection position"))?
            .density(self.detector, primary.energy, &primary.direction, &primary.vertex);
        let physical_position = set
            .physical_position()
            .ok_or_else(|| missing("physical position"))?
            .density(self.detector, primary.energy, &primary.direction, &primary.vertex);

        Ok(WeightComponents {
            energy,
            direction,
            position: ratio(physical_position, injection_position),
            interaction: ratio(interaction_density, injection_position),
            decay,
            branching,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::model::ModelPoint;
    use crate::engine::config::{ExperimentConfig, nd280_builder};
    use crate::engine::context::SimulationContext;
    use crate::engine::distributions::assemble;
    use crate::engine::progress::ProgressReporter;
    use nalgebra::{Point3, Unit, Vector3};
    use std::path::Path;

    #[test]
    fn total_is_the_product_of_components() {
        let components = WeightComponents {
            energy: 2.0,
            direction: 1.0,
            position: 1.0,
            interaction: 3.0,
            decay: 0.5,
            branching: 1.0,
        };
        assert_eq!(components.total(), 3.0);
    }

    #[test]
    fn shared_distributions_have_unit_ratios() {
        let config = nd280_builder(Path::new(crate::BUNDLED_RESOURCE_DIR), Path::new("out"))
            .build()
            .unwrap();
        let experiment = ExperimentConfig::load(&config).unwrap();
        let model = ModelPoint::new(0.05, 1e-6).unwrap();
        let reporter = ProgressReporter::new();
        let context = SimulationContext::new(&model, &experiment, &config, &reporter);
        let set = assemble(&context).unwrap();
        let weighter = EventWeighter::new(&set, &experiment.detector);

        let primary = PrimarySample {
            energy: 1.0,
            direction: Unit::new_normalize(Vector3::z()),
            vertex: Point3::new(0.5, 0.5, -1.0),
        };
        let components = weighter.weigh(&primary, 1e-20, 0.25, 1.0).unwrap();
        assert_eq!(components.direction, 1.0);
        assert!((components.position - 1.0).abs() < 1e-12);
        assert!(components.energy > 0.0);
        assert!(components.interaction > 0.0);
        assert_eq!(components.decay, 0.25);

        let flux = experiment.flux.value_at(1.0);
        let pdf = set.injection_energy().unwrap().density(1.0);
        assert!((components.energy - flux / pdf).abs() / components.energy < 1e-12);
    }

    #[test]
    fn vertices_outside_injection_volume_get_zero_weight() {
        let config = nd280_builder(Path::new(crate::BUNDLED_RESOURCE_DIR), Path::new("out"))
            .build()
            .unwrap();
        let experiment = ExperimentConfig::load(&config).unwrap();
        let model = ModelPoint::new(0.05, 1e-6).unwrap();
        let reporter = ProgressReporter::new();
        let context = SimulationContext::new(&model, &experiment, &config, &reporter);
        let set = assemble(&context).unwrap();
        let weighter = EventWeighter::new(&set, &experiment.detector);

        let primary = PrimarySample {
            energy: 1.0,
            direction: Unit::new_normalize(Vector3::z()),
            vertex: Point3::new(7.0, 0.0, 0.0),
        };
        let components = weighter.weigh(&primary, 1e-20, 1.0, 1.0).unwrap();
        assert_eq!(components.total(), 0.0);
    }
}
