//! Injection and physical distributions of the primary neutrino.
//!
//! Events are drawn from the injection distributions and reweighted to the physical ones.
//! Both sets are keyed by [`DistributionKind`] and must cover the same kinds.

pub mod direction;
pub mod energy;
pub mod position;

use nalgebra::{Point3, Unit, Vector3};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

use self::direction::{DirectionDistribution, FixedDirection, same_direction};
use self::energy::{EnergyDistribution, TabulatedFluxDistribution};
use self::position::{DecayRangeFunction, DecayRangePositionDistribution, VertexDistribution};
use super::context::SimulationContext;
use super::error::EngineError;
use crate::core::physics::dipole::DipoleModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DistributionKind {
    Energy,
    Direction,
    Position,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DistributionSetError {
    #[error("injection distributions {injection:?} do not match physical distributions {physical:?}")]
    KindMismatch {
        injection: Vec<DistributionKind>,
        physical: Vec<DistributionKind>,
    },
    #[error("no {0} distribution configured")]
    Missing(DistributionKind),
    #[error("physical direction is fixed but the injection direction differs")]
    DirectionMismatch,
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Energy => "energy",
            Self::Direction => "direction",
            Self::Position => "position",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub enum PrimaryDistribution {
    Energy(Arc<dyn EnergyDistribution>),
    Direction(Arc<dyn DirectionDistribution>),
    Position(Arc<dyn VertexDistribution>),
}

impl PrimaryDistribution {
    pub fn kind(&self) -> DistributionKind {
        match self {
            Self::Energy(_) => DistributionKind::Energy,
            Self::Direction(_) => DistributionKind::Direction,
            Self::Position(_) => DistributionKind::Position,
        }
    }
}

/// Sampled kinematics of a primary before it interacts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimarySample {
    pub energy: f64,
    pub direction: Unit<Vector3<f64>>,
    pub vertex: Point3<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct DistributionSet {
    injection: BTreeMap<DistributionKind, PrimaryDistribution>,
    physical: BTreeMap<DistributionKind, PrimaryDistribution>,
}

macro_rules! typed_getter {
    ($name:ident, $map:ident, $variant:ident, $ty:ty) => {
        pub fn $name(&self) -> Option<&Arc<$ty>> {
            match self.$map.get(&DistributionKind::$variant) {
                Some(PrimaryDistribution::$variant(d)) => Some(d),
                _ => None,
            }
        }
    };
}

impl DistributionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any injection distribution of the same kind.
    pub fn insert_injection(&mut self, distribution: PrimaryDistribution) {
        self.injection.insert(distribution.kind(), distribution);
    }

    /// Replaces any physical distribution of the same kind.
    pub fn insert_physical(&mut self, distribution: PrimaryDistribution) {
        self.physical.insert(distribution.kind(), distribution);
    }

    pub fn injection_kinds(&self) -> impl Iterator<Item = DistributionKind> + '_ {
        self.injection.keys().copied()
    }

    pub fn physical_kinds(&self) -> impl Iterator<Item = DistributionKind> + '_ {
        self.physical.keys().copied()
    }

    typed_getter!(injection_energy, injection, Energy, dyn EnergyDistribution);
    typed_getter!(physical_energy, physical, Energy, dyn EnergyDistribution);
    typed_getter!(injection_direction, injection, Direction, dyn DirectionDistribution);
    typed_getter!(physical_direction, physical, Direction, dyn DirectionDistribution);
    typed_getter!(injection_position, injection, Position, dyn VertexDistribution);
    typed_getter!(physical_position, physical, Position, dyn VertexDistribution);

    /// Checks that both mappings cover the same kinds and that degenerate direction
    /// distributions agree.
    pub fn validate(&self) -> Result<(), DistributionSetError> {
        let injection: Vec<_> = self.injection_kinds().collect();
        let physical: Vec<_> = self.physical_kinds().collect();
        if injection != physical {
            return Err(DistributionSetError::KindMismatch {
                injection,
                physical,
            });
        }
        for kind in [
            DistributionKind::Energy,
            DistributionKind::Direction,
            DistributionKind::Position,
        ] {
            if !self.injection.contains_key(&kind) {
                return Err(DistributionSetError::Missing(kind));
            }
        }
        if let (Some(inj), Some(phys)) = (self.injection_direction(), self.physical_direction()) {
            if let Some(expected) = phys.fixed_direction() {
                let matches = inj
                    .fixed_direction()
                    .is_some_and(|actual| same_direction(&actual, &expected));
                if !matches {
                    return Err(DistributionSetError::DirectionMismatch);
                }
            }
        }
        Ok(())
    }
}

/// Builds the distributions for the context's model point and experiment.
///
/// The injection energy spectrum is the experiment flux truncated to `[m4, energy_max]`;
/// the physical one is the whole flux table. Direction and position use the same object in
/// both mappings.
#[instrument(skip_all, name = "assemble_distributions")]
pub fn assemble(context: &SimulationContext) -> Result<DistributionSet, EngineError> {
    let model = context.model;
    let config = context.config;
    let detector = context.detector();

    let width = DipoleModel::new(model).min_decay_width();
    if !(width.is_finite() && width > 0.0) {
        return Err(EngineError::DegenerateDecayWidth {
            width,
            model: model.to_string(),
        });
    }

    let table = Arc::clone(&context.experiment.flux);
    let injection_energy = TabulatedFluxDistribution::new(
        Arc::clone(&table),
        model.mass(),
        config.flux.energy_max,
        true,
    );
    let physical_energy = TabulatedFluxDistribution::physical(table);
    debug!(
        support = ?injection_energy.support(),
        "Injection energy spectrum assembled."
    );

    let direction: Arc<dyn DirectionDistribution> =
        Arc::new(FixedDirection::new(context.beam_direction()));

    let range_function = DecayRangeFunction::new(
        model.mass(),
        width,
        config.decay_window.multiplier,
        config.decay_window.max_distance,
    );
    let position: Arc<dyn VertexDistribution> = Arc::new(DecayRangePositionDistribution::new(
        config.range.radius,
        config.range.endcap_length,
        range_function,
        detector.target_types(),
    ));

    let mut set = DistributionSet::new();
    set.insert_injection(PrimaryDistribution::Energy(Arc::new(injection_energy)));
    set.insert_physical(PrimaryDistribution::Energy(Arc::new(physical_energy)));
    set.insert_injection(PrimaryDistribution::Direction(Arc::clone(&direction)));
    set.insert_physical(PrimaryDistribution::Direction(direction));
    set.insert_injection(PrimaryDistribution::Position(Arc::clone(&position)));
    set.insert_physical(PrimaryDistribution::Position(position));
    Ok(set)
}
