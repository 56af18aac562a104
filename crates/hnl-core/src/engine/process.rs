use rand::RngCore;
use std::collections::HashMap;

use crate::core::models::model::ModelPoint;
use crate::core::models::particle::ParticleType;
use crate::core::physics::constants::HBAR_C_GEV_M;
use crate::core::physics::dipole::{DipoleCrossSection, DipoleDecay, DipoleModel};
use crate::core::physics::kinematics::{FourMomentum, beta_gamma};

/// A decay mode the injector may simulate for an unstable secondary.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayChannel {
    pub parent: ParticleType,
    pub parent_mass: f64,
    pub total_width: f64,
    pub branching_ratio: f64,
    decay: DipoleDecay,
}

impl DecayChannel {
    pub fn products(&self) -> &'static [ParticleType] {
        &DipoleDecay::PRODUCTS
    }

    /// Mean lab-frame decay length in meters at total energy `energy`.
    pub fn decay_length(&self, energy: f64) -> f64 {
        HBAR_C_GEV_M * beta_gamma(self.parent_mass, energy) / self.total_width
    }

    pub fn sample_daughters(&self, parent: &FourMomentum, rng: &mut dyn RngCore) -> Vec<FourMomentum> {
        self.decay.sample_daughters(parent, rng).to_vec()
    }
}

/// The processes a run can simulate: the primary's up-scattering and secondary decays.
#[derive(Debug, Clone)]
pub struct ProcessRegistration {
    primary_type: ParticleType,
    produced_type: ParticleType,
    cross_section: DipoleCrossSection,
    decays: HashMap<ParticleType, DecayChannel>,
}

impl ProcessRegistration {
    /// `nu_mu + A -> N4 + A` followed by `N4 -> nu_mu gamma`.
    pub fn dipole(model: &ModelPoint) -> Self {
        let widths = DipoleModel::new(model);
        let channel = DecayChannel {
            parent: ParticleType::N4,
            parent_mass: model.mass(),
            total_width: widths.total_width(),
            branching_ratio: widths.radiative_width() / widths.total_width(),
            decay: DipoleDecay::new(model),
        };
        Self {
            primary_type: ParticleType::NU_MU,
            produced_type: ParticleType::N4,
            cross_section: DipoleCrossSection::new(model),
            decays: HashMap::from([(ParticleType::N4, channel)]),
        }
    }

    pub fn primary_type(&self) -> ParticleType {
        self.primary_type
    }

    /// The particle the primary scattering produces alongside the recoiling target.
    pub fn produced_type(&self) -> ParticleType {
        self.produced_type
    }

    pub fn cross_section(&self) -> &DipoleCrossSection {
        &self.cross_section
    }

    pub fn decay_for(&self, particle: ParticleType) -> Option<&DecayChannel> {
        self.decays.get(&particle)
    }

    pub fn decays(&self) -> impl Iterator<Item = &DecayChannel> {
        self.decays.values()
    }
}
