use rand::{Rng, RngCore};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use super::context::SimulationContext;
use super::distributions::{DistributionSet, PrimarySample};
use super::error::EngineError;
use super::process::ProcessRegistration;
use super::progress::Progress;
use super::state::InjectorState;
use super::stopping::{ContinueThroughParticle, StoppingCondition};
use super::utils::sampling::{
    exponential_probability_within, sample_truncated_exponential, weighted_choice,
};
use super::weighting::{EventWeighter, WeightComponents};
use crate::core::io::event_table::EventTable;
use crate::core::models::event::{EventRecord, InteractionDatum, InteractionSummary};
use crate::core::models::particle::ParticleType;
use crate::core::physics::kinematics::FourMomentum;

/// Attempts allowed per requested event before generation is abandoned.
const MAX_ATTEMPTS_PER_EVENT: u64 = 10_000;

/// Generates weighted events for one model point.
///
/// Events are buffered in memory and only reach disk through [`Injector::save_events`] once
/// generation has completed.
pub struct Injector<'a> {
    context: SimulationContext<'a>,
    processes: ProcessRegistration,
    distributions: DistributionSet,
    stopping: Box<dyn StoppingCondition>,
    state: InjectorState,
    events: Vec<EventRecord>,
    attempts: u64,
    min_threshold: f64,
}

struct GeneratedEvent {
    data: Vec<InteractionDatum>,
    components: WeightComponents,
}

impl<'a> Injector<'a> {
    pub fn new(
        context: SimulationContext<'a>,
        processes: ProcessRegistration,
        distributions: DistributionSet,
    ) -> Self {
        Self {
            context,
            processes,
            distributions,
            stopping: Box::new(ContinueThroughParticle::default()),
            state: InjectorState::Configured,
            events: Vec::new(),
            attempts: 0,
            min_threshold: f64::INFINITY,
        }
    }

    pub fn state(&self) -> InjectorState {
        self.state
    }

    pub fn set_stopping_condition(&mut self, condition: Box<dyn StoppingCondition>) {
        self.stopping = condition;
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    /// Attempts made by the last run, including rejected draws.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    fn require(&self, operation: &'static str, expected: InjectorState) -> Result<(), EngineError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(EngineError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn fail(&mut self, error: EngineError) -> EngineError {
        self.state = InjectorState::Failed;
        self.events.clear();
        error
    }

    #[instrument(skip_all, name = "injector_initialize")]
    pub fn initialize(&mut self) -> Result<(), EngineError> {
        self.require("initialize", InjectorState::Configured)?;
        match self.validate() {
            Ok(threshold) => {
                self.min_threshold = threshold;
                self.state = InjectorState::Initialized;
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Returns the lowest production threshold over the supported targets.
    fn validate(&self) -> Result<f64, EngineError> {
        let init = |msg: String| EngineError::Initialization(msg);
        self.distributions
            .validate()
            .map_err(|e| init(e.to_string()))?;

        for channel in self.processes.decays() {
            if !(channel.total_width.is_finite() && channel.total_width > 0.0) {
                return Err(EngineError::DegenerateDecayWidth {
                    width: channel.total_width,
                    model: self.context.model.to_string(),
                });
            }
        }

        let position = self
            .distributions
            .injection_position()
            .ok_or_else(|| init("no injection position distribution".to_string()))?;
        let targets = position.target_types();
        if targets.is_empty() {
            return Err(init("the detector provides no target nuclei".to_string()));
        }
        let cross_section = self.processes.cross_section();
        let mut min_threshold = f64::INFINITY;
        for &target in targets {
            let mass = target.mass().filter(|_| cross_section.supports(target));
            let Some(mass) = mass else {
                return Err(init(format!(
                    "target {} is not supported by the up-scattering cross-section",
                    target
                )));
            };
            min_threshold = min_threshold.min(cross_section.threshold(mass));
        }

        let injection = self
            .distributions
            .injection_energy()
            .ok_or_else(|| init("no injection energy distribution".to_string()))?;
        let physical = self
            .distributions
            .physical_energy()
            .ok_or_else(|| init("no physical energy distribution".to_string()))?;
        let (inj_lo, inj_hi) = injection.support();
        if inj_hi <= inj_lo {
            return Err(init(format!(
                "injection energy range [{}, {}] GeV is empty",
                inj_lo, inj_hi
            )));
        }
        let fraction = injection.fraction_above(min_threshold);
        if fraction <= 0.0 {
            return Err(init(format!(
                "no injection probability above the production threshold {:.4} GeV",
                min_threshold
            )));
        }
        let (phys_lo, phys_hi) = physical.support();
        if (phys_lo < inj_lo && inj_lo > min_threshold) || phys_hi > inj_hi {
            return Err(init(format!(
                "physical energy support [{}, {}] exceeds injection support [{}, {}] above threshold",
                phys_lo, phys_hi, inj_lo, inj_hi
            )));
        }

        info!(
            threshold = min_threshold,
            fraction_above_threshold = fraction,
            "Injector initialized."
        );
        Ok(min_threshold)
    }

    #[instrument(skip_all, name = "generate_events", fields(events = self.context.experiment.events_to_inject))]
    pub fn generate_events<R: Rng>(&mut self, rng: &mut R) -> Result<&[EventRecord], EngineError> {
        self.require("generate_events", InjectorState::Initialized)?;
        self.state = InjectorState::Running;
        self.events.clear();
        self.attempts = 0;

        match self.run(rng) {
            Ok(()) => {
                self.state = InjectorState::Completed;
                Ok(&self.events)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn run<R: Rng>(&mut self, rng: &mut R) -> Result<(), EngineError> {
        let rng: &mut dyn RngCore = rng;
        let requested = self.context.experiment.events_to_inject;
        let max_attempts = (requested as u64).saturating_mul(MAX_ATTEMPTS_PER_EVENT);
        let reporter = self.context.reporter;
        let detector = self.context.detector();

        reporter.report(Progress::TaskStart {
            total_steps: requested as u64,
        });
        let mut accepted = Vec::with_capacity(requested);
        while accepted.len() < requested {
            if self.attempts >= max_attempts {
                return Err(EngineError::AttemptLimit {
                    attempts: self.attempts,
                    accepted: accepted.len(),
                });
            }
            self.attempts += 1;
            if let Some(event) = self.generate_one(rng)? {
                accepted.push(event);
                reporter.report(Progress::TaskIncrement);
            }
        }
        reporter.report(Progress::TaskFinish);

        let attempts = self.attempts as f64;
        self.events = accepted
            .into_iter()
            .map(|event| EventRecord {
                event_weight: event.components.total() / attempts,
                interactions: event
                    .data
                    .iter()
                    .map(|d| InteractionSummary::from_datum(d, detector.is_in_fiducial(&d.vertex)))
                    .collect(),
            })
            .collect();

        let rejected = self.attempts - requested as u64;
        if rejected > 0 {
            debug!(rejected, "Resampled draws without a kinematically allowed target.");
        }
        info!(
            accepted = self.events.len(),
            attempts = self.attempts,
            "Event generation finished."
        );
        Ok(())
    }

    /// One draw of the primary. `None` when no target is kinematically allowed at the sampled
    /// energy and vertex; such draws still count as attempts.
    fn generate_one(&self, rng: &mut dyn RngCore) -> Result<Option<GeneratedEvent>, EngineError> {
        let set = &self.distributions;
        let internal = |what: &str| EngineError::Internal(format!("{} distribution missing", what));
        let detector = self.context.detector();
        let cross_section = self.processes.cross_section();

        let energy = set
            .injection_energy()
            .ok_or_else(|| internal("injection energy"))?
            .sample(rng);
        if energy < self.min_threshold {
            return Ok(None);
        }
        let direction = set
            .injection_direction()
            .ok_or_else(|| internal("injection direction"))?
            .sample(rng);
        let position = set
            .injection_position()
            .ok_or_else(|| internal("injection position"))?;
        let Some(vertex) = position.sample(detector, energy, &direction, rng) else {
            return Ok(None);
        };

        let candidates: Vec<(ParticleType, f64)> = detector
            .number_densities_at(&vertex)
            .into_iter()
            .filter(|(target, _)| position.target_types().contains(target))
            .map(|(target, n)| (target, n * cross_section.total(energy, target)))
            .collect();
        let interaction_density: f64 = candidates.iter().map(|(_, w)| w).sum();
        if interaction_density <= 0.0 {
            return Ok(None);
        }
        let weights: Vec<f64> = candidates.iter().map(|(_, w)| *w).collect();
        let chosen = weighted_choice(&weights, rng)
            .map_err(|e| EngineError::Internal(format!("target selection failed: {}", e)))?;
        let target = candidates[chosen].0;
        let target_mass = target
            .mass()
            .ok_or_else(|| EngineError::Internal(format!("target {} has no mass", target)))?;

        let Some(final_state) = cross_section.sample_final_state(energy, &direction, target_mass, rng)
        else {
            return Ok(None);
        };

        let primary = InteractionDatum {
            primary_type: self.processes.primary_type(),
            primary_momentum: FourMomentum::new(energy, direction.as_ref() * energy),
            target_type: Some(target),
            vertex,
            secondary_types: vec![self.processes.produced_type(), target],
            secondary_momenta: vec![final_state.lepton, final_state.recoil],
            parent_index: None,
        };
        let (data, decay, branching) = self.expand(primary, rng);

        let sample = PrimarySample {
            energy,
            direction,
            vertex,
        };
        let components = EventWeighter::new(set, detector).weigh(
            &sample,
            interaction_density,
            decay,
            branching,
        )?;
        if !components.total().is_finite() {
            warn!(?components, "Non-finite event weight.");
            return Err(EngineError::Internal(
                "event weight is not finite".to_string(),
            ));
        }
        Ok(Some(GeneratedEvent { data, components }))
    }

    /// Breadth-first expansion of the interaction tree below `primary`.
    ///
    /// Returns the tree and the accumulated decay-placement probability and branching ratio.
    fn expand(
        &self,
        primary: InteractionDatum,
        rng: &mut dyn RngCore,
    ) -> (Vec<InteractionDatum>, f64, f64) {
        let bounds = self.context.detector().outer_bounds();
        let mut data = vec![primary];
        let mut decay_probability = 1.0;
        let mut branching = 1.0;
        let mut index = 0;

        while index < data.len() {
            let mut children = Vec::new();
            let datum = &data[index];
            for secondary in 0..datum.secondary_types.len() {
                if self.stopping.should_stop(datum, secondary) {
                    continue;
                }
                let Some((particle, momentum)) = datum.secondary(secondary) else {
                    continue;
                };
                let Some(channel) = self.processes.decay_for(particle) else {
                    continue;
                };

                let (decay_vertex, probability) = match momentum.direction() {
                    Some(heading) => {
                        let scale = channel.decay_length(momentum.energy);
                        let reach = bounds.exit_distance(&datum.vertex, &heading);
                        let distance = sample_truncated_exponential(scale, reach, rng);
                        (
                            datum.vertex + heading.as_ref() * distance,
                            exponential_probability_within(scale, reach),
                        )
                    }
                    None => (datum.vertex, 1.0),
                };
                decay_probability *= probability;
                branching *= channel.branching_ratio;

                children.push(InteractionDatum {
                    primary_type: particle,
                    primary_momentum: *momentum,
                    target_type: None,
                    vertex: decay_vertex,
                    secondary_types: channel.products().to_vec(),
                    secondary_momenta: channel.sample_daughters(momentum, rng),
                    parent_index: Some(index),
                });
            }
            data.extend(children);
            index += 1;
        }
        (data, decay_probability, branching)
    }

    /// Writes the buffered events as one table, atomically.
    #[instrument(skip_all, name = "save_events", fields(path = %path.display()))]
    pub fn save_events(&self, path: &Path) -> Result<(), EngineError> {
        self.require("save_events", InjectorState::Completed)?;
        EventTable::from_records(&self.events).write_atomic(path)?;
        info!(events = self.events.len(), "Event table written.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::model::ModelPoint;
    use crate::engine::config::{ExperimentConfig, PipelineConfig, nd280_builder};
    use crate::engine::distributions::direction::FixedDirection;
    use crate::engine::distributions::{PrimaryDistribution, assemble};
    use crate::engine::progress::ProgressReporter;
    use nalgebra::{Unit, Vector3};
    use std::sync::Arc;
    use crate::engine::stopping::StopAll;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::path::Path;
    use tempfile::tempdir;

    fn setup(events: usize, output: &Path) -> (PipelineConfig, ExperimentConfig) {
        let config = nd280_builder(Path::new(crate::BUNDLED_RESOURCE_DIR), output)
            .events_to_inject(events)
            .build()
            .unwrap();
        let experiment = ExperimentConfig::load(&config).unwrap();
        (config, experiment)
    }

    fn generate(
        model: &ModelPoint,
        experiment: &ExperimentConfig,
        config: &PipelineConfig,
        stopping: Option<Box<dyn StoppingCondition>>,
        seed: u64,
    ) -> Result<Vec<EventRecord>, EngineError> {
        let reporter = ProgressReporter::new();
        let context = SimulationContext::new(model, experiment, config, &reporter);
        let distributions = assemble(&context)?;
        let mut injector = Injector::new(context, ProcessRegistration::dipole(model), distributions);
        if let Some(condition) = stopping {
            injector.set_stopping_condition(condition);
        }
        injector.initialize()?;
        let mut rng = StdRng::seed_from_u64(seed);
        Ok(injector.generate_events(&mut rng)?.to_vec())
    }

    #[test]
    fn default_stopping_simulates_only_the_heavy_lepton_decay() {
        let (config, experiment) = setup(25, Path::new("unused"));
        let model = ModelPoint::new(0.1, 1e-6).unwrap();
        let events = generate(&model, &experiment, &config, None, 7).unwrap();

        assert_eq!(events.len(), 25);
        for event in &events {
            assert_eq!(event.interactions.len(), 2);
            let upscatter = &event.interactions[0];
            assert_eq!(upscatter.primary_type, ParticleType::NU_MU);
            assert_eq!(upscatter.parent_index, None);
            assert_eq!(upscatter.secondary_types[0], ParticleType::N4);

            let decay = &event.interactions[1];
            assert_eq!(decay.primary_type, ParticleType::N4);
            assert_eq!(decay.parent_index, Some(0));
            assert_eq!(decay.secondary_types, vec![ParticleType::NU_MU, ParticleType::GAMMA]);
            assert!(event.event_weight.is_finite() && event.event_weight >= 0.0);
        }
    }

    #[test]
    fn stopping_every_secondary_leaves_only_the_primary_interaction() {
        let (config, experiment) = setup(10, Path::new("unused"));
        let model = ModelPoint::new(0.1, 1e-6).unwrap();
        let events = generate(&model, &experiment, &config, Some(Box::new(StopAll)), 3).unwrap();
        assert!(events.iter().all(|e| e.interactions.len() == 1));
    }

    #[test]
    fn same_seed_reproduces_the_same_events() {
        let (config, experiment) = setup(15, Path::new("unused"));
        let model = ModelPoint::new(0.02, 5e-8).unwrap();
        let first = generate(&model, &experiment, &config, None, 11).unwrap();
        let second = generate(&model, &experiment, &config, None, 11).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn initialize_fails_beyond_the_flux_table() {
        let (config, experiment) = setup(5, Path::new("unused"));
        let model = ModelPoint::new(19.99, 5e-8).unwrap();
        let result = generate(&model, &experiment, &config, None, 1);
        assert!(matches!(result, Err(EngineError::Initialization(_))));
    }

    #[test]
    fn inconsistent_distribution_set_fails_initialization() {
        let (config, experiment) = setup(5, Path::new("unused"));
        let model = ModelPoint::new(0.1, 1e-6).unwrap();
        let reporter = ProgressReporter::new();
        let context = SimulationContext::new(&model, &experiment, &config, &reporter);
        let mut distributions = assemble(&context).unwrap();
        distributions.insert_injection(PrimaryDistribution::Direction(Arc::new(
            FixedDirection::new(Unit::new_normalize(Vector3::x())),
        )));
        let mut injector = Injector::new(context, ProcessRegistration::dipole(&model), distributions);

        let result = injector.initialize();
        assert!(
            matches!(result, Err(EngineError::Initialization(ref msg)) if msg.contains("direction"))
        );
        assert_eq!(injector.state(), InjectorState::Failed);
    }

    #[test]
    fn operations_out_of_order_are_rejected() {
        let dir = tempdir().unwrap();
        let (config, experiment) = setup(5, dir.path());
        let model = ModelPoint::new(0.1, 1e-6).unwrap();
        let reporter = ProgressReporter::new();
        let context = SimulationContext::new(&model, &experiment, &config, &reporter);
        let distributions = assemble(&context).unwrap();
        let mut injector = Injector::new(context, ProcessRegistration::dipole(&model), distributions);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(matches!(
            injector.generate_events(&mut rng),
            Err(EngineError::InvalidState {
                state: InjectorState::Configured,
                ..
            })
        ));
        let path = dir.path().join("events.json");
        injector.initialize().unwrap();
        assert!(matches!(
            injector.save_events(&path),
            Err(EngineError::InvalidState { .. })
        ));
        assert!(!path.exists());

        injector.generate_events(&mut rng).unwrap();
        assert_eq!(injector.state(), InjectorState::Completed);
        assert!(injector.attempts() >= 5);
        injector.save_events(&path).unwrap();
        assert_eq!(EventTable::read(&path).unwrap().len(), 5);
    }
}
