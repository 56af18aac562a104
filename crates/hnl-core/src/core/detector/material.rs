use serde::Deserialize;

use crate::core::models::particle::ParticleType;
use crate::core::physics::constants::ATOMIC_MASS_UNIT_KG;

/// One nuclear species of a material, by mass fraction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Component {
    pub z: i32,
    pub a: i32,
    pub mass_fraction: f64,
}

impl Component {
    pub fn nucleus(&self) -> ParticleType {
        ParticleType::nucleus(self.z, self.a)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Material {
    /// Mass density in kg / m^3.
    pub density: f64,
    pub components: Vec<Component>,
}

impl Material {
    /// Number of nuclei per m^3 for each component.
    pub fn number_densities(&self) -> Vec<(ParticleType, f64)> {
        self.components
            .iter()
            .map(|c| {
                let per_nucleus_kg = f64::from(c.a) * ATOMIC_MASS_UNIT_KG;
                (c.nucleus(), self.density * c.mass_fraction / per_nucleus_kg)
            })
            .collect()
    }

    pub fn mass_fraction_total(&self) -> f64 {
        self.components.iter().map(|c| c.mass_fraction).sum()
    }
}
