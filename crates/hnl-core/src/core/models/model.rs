use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::core::utils::format::format_scientific;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid model parameter '{name}': {value} (must be finite and positive)")]
    InvalidParameter { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HnlNature {
    Dirac,
    Majorana,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecayProduct {
    Photon,
}

/// Couplings of the heavy lepton other than the transition magnetic moment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PortalCouplings {
    /// Mixing with the dark-sector neutrino.
    pub u_d4: f64,
    /// Mixing with the muon neutrino.
    pub u_mu4: f64,
    /// Kinetic mixing.
    pub epsilon: f64,
    /// Dark gauge coupling.
    pub g_d: f64,
}

/// One point of the dipole-portal parameter space.
///
/// Only the mass and the dipole coupling are free; all mixings vanish, the lepton is a Dirac
/// fermion decaying radiatively, and helicity conservation is not imposed on up-scattering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPoint {
    mass: f64,
    coupling: f64,
    nature: HnlNature,
    decay_product: DecayProduct,
    no_helicity_conservation: bool,
    portals: PortalCouplings,
}

impl ModelPoint {
    /// `mass` in GeV, `coupling` (transition magnetic moment) in GeV^-1.
    pub fn new(mass: f64, coupling: f64) -> Result<Self, ModelError> {
        validate("mass", mass)?;
        validate("coupling", coupling)?;
        Ok(Self {
            mass,
            coupling,
            nature: HnlNature::Dirac,
            decay_product: DecayProduct::Photon,
            no_helicity_conservation: true,
            portals: PortalCouplings::default(),
        })
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn coupling(&self) -> f64 {
        self.coupling
    }

    pub fn nature(&self) -> HnlNature {
        self.nature
    }

    pub fn decay_product(&self) -> DecayProduct {
        self.decay_product
    }

    pub fn no_helicity_conservation(&self) -> bool {
        self.no_helicity_conservation
    }

    pub fn portals(&self) -> &PortalCouplings {
        &self.portals
    }

    /// Stable identifier used for output file names and table directories, for example
    /// `Dipole_M2.00e-02_mu5.00e-08`.
    pub fn model_tag(&self) -> String {
        format!(
            "Dipole_M{}_mu{}",
            format_scientific(self.mass, 2),
            format_scientific(self.coupling, 2)
        )
    }
}

impl fmt::Display for ModelPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m4 = {} GeV, mu = {} GeV^-1",
            format_scientific(self.mass, 3),
            format_scientific(self.coupling, 3)
        )
    }
}

fn validate(name: &'static str, value: f64) -> Result<(), ModelError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidParameter { name, value })
    }
}
