use std::fmt::Debug;

use crate::core::models::event::InteractionDatum;
use crate::core::models::particle::ParticleType;

/// Decides which secondaries the injector expands further.
///
/// Returning `true` stops the tree at `datum.secondary_types[secondary_index]`: no decay or
/// interaction is simulated for it. Implementations must be pure.
pub trait StoppingCondition: Debug + Send + Sync {
    fn should_stop(&self, datum: &InteractionDatum, secondary_index: usize) -> bool;
}

/// Expands only secondaries of one designated type, stopping everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinueThroughParticle {
    pub particle: ParticleType,
}

impl ContinueThroughParticle {
    pub fn new(particle: ParticleType) -> Self {
        Self { particle }
    }
}

impl Default for ContinueThroughParticle {
    fn default() -> Self {
        Self::new(ParticleType::N4)
    }
}

impl StoppingCondition for ContinueThroughParticle {
    fn should_stop(&self, datum: &InteractionDatum, secondary_index: usize) -> bool {
        datum
            .secondary_types
            .get(secondary_index)
            .is_none_or(|&ty| ty != self.particle)
    }
}

/// Never expands anything; only the primary interaction is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopAll;

impl StoppingCondition for StopAll {
    fn should_stop(&self, _datum: &InteractionDatum, _secondary_index: usize) -> bool {
        true
    }
}
