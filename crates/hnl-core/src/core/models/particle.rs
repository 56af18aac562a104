use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::physics::constants::{ATOMIC_MASS_UNIT_GEV, PROTON_MASS_GEV};

const NUCLEUS_CODE_BASE: i32 = 1_000_000_000;

/// A particle species identified by its PDG Monte-Carlo code.
///
/// Nuclei follow the PDG ion convention `10LZZZAAAI`; the heavy neutral lepton uses the
/// code `5914` that the DarkNews tables assign to `N4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticleType(i32);

impl ParticleType {
    pub const GAMMA: Self = Self(22);
    pub const NU_E: Self = Self(12);
    pub const NU_MU: Self = Self(14);
    pub const NU_MU_BAR: Self = Self(-14);
    pub const N4: Self = Self(5914);
    pub const N4_BAR: Self = Self(-5914);
    pub const H_NUCLEUS: Self = Self::nucleus(1, 1);
    pub const C12_NUCLEUS: Self = Self::nucleus(6, 12);
    pub const N14_NUCLEUS: Self = Self::nucleus(7, 14);
    pub const O16_NUCLEUS: Self = Self::nucleus(8, 16);
    pub const SI28_NUCLEUS: Self = Self::nucleus(14, 28);
    pub const AR40_NUCLEUS: Self = Self::nucleus(18, 40);
    pub const FE56_NUCLEUS: Self = Self::nucleus(26, 56);

    pub const fn from_code(code: i32) -> Self {
        Self(code)
    }

    pub const fn nucleus(protons: i32, mass_number: i32) -> Self {
        Self(NUCLEUS_CODE_BASE + protons * 10_000 + mass_number * 10)
    }

    pub const fn code(self) -> i32 {
        self.0
    }

    pub fn is_nucleus(self) -> bool {
        self.0 >= NUCLEUS_CODE_BASE
    }

    /// Number of protons `Z` of a nucleus, `None` for non-nuclear species.
    pub fn proton_count(self) -> Option<u32> {
        self.is_nucleus()
            .then(|| ((self.0 - NUCLEUS_CODE_BASE) / 10_000 % 1_000) as u32)
    }

    /// Mass number `A` of a nucleus, `None` for non-nuclear species.
    pub fn mass_number(self) -> Option<u32> {
        self.is_nucleus().then(|| ((self.0 / 10) % 1_000) as u32)
    }

    /// Rest mass in GeV for species with a fixed mass.
    ///
    /// Nuclear masses use `A * u` except for the bare proton. The heavy neutral lepton has a
    /// model-dependent mass and returns `None`.
    pub fn mass(self) -> Option<f64> {
        match self {
            Self::GAMMA | Self::NU_E | Self::NU_MU | Self::NU_MU_BAR => Some(0.0),
            Self::H_NUCLEUS => Some(PROTON_MASS_GEV),
            _ => self
                .mass_number()
                .map(|a| f64::from(a) * ATOMIC_MASS_UNIT_GEV),
        }
    }

    pub fn name(self) -> String {
        match self {
            Self::GAMMA => "Gamma".to_string(),
            Self::NU_E => "NuE".to_string(),
            Self::NU_MU => "NuMu".to_string(),
            Self::NU_MU_BAR => "NuMuBar".to_string(),
            Self::N4 => "N4".to_string(),
            Self::N4_BAR => "N4Bar".to_string(),
            Self::H_NUCLEUS => "HNucleus".to_string(),
            other => match (other.proton_count(), other.mass_number()) {
                (Some(z), Some(a)) => format!("Nucleus(Z={}, A={})", z, a),
                _ => format!("Particle({})", other.0),
            },
        }
    }
}

impl From<ParticleType> for i32 {
    fn from(particle: ParticleType) -> Self {
        particle.code()
    }
}

impl fmt::Display for ParticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nucleus_codes_follow_pdg_ion_convention() {
        assert_eq!(ParticleType::O16_NUCLEUS.code(), 1000080160);
        assert_eq!(ParticleType::AR40_NUCLEUS.code(), 1000180400);
        assert_eq!(ParticleType::H_NUCLEUS.code(), 1000010010);
    }

    #[test]
    fn proton_count_and_mass_number_are_decoded_from_code() {
        let si = ParticleType::SI28_NUCLEUS;
        assert_eq!(si.proton_count(), Some(14));
        assert_eq!(si.mass_number(), Some(28));
        assert!(si.is_nucleus());
    }

    #[test]
    fn non_nuclear_species_have_no_nuclear_numbers() {
        assert_eq!(ParticleType::GAMMA.proton_count(), None);
        assert_eq!(ParticleType::N4.mass_number(), None);
        assert!(!ParticleType::NU_MU.is_nucleus());
    }

    #[test]
    fn masses_are_known_except_for_the_heavy_lepton() {
        assert_eq!(ParticleType::GAMMA.mass(), Some(0.0));
        assert_eq!(ParticleType::N4.mass(), None);
        let oxygen = ParticleType::O16_NUCLEUS.mass().unwrap();
        assert!((oxygen - 16.0 * ATOMIC_MASS_UNIT_GEV).abs() < 1e-12);
        assert_eq!(ParticleType::H_NUCLEUS.mass(), Some(PROTON_MASS_GEV));
    }

    #[test]
    fn serializes_as_bare_code() {
        let json = serde_json::to_string(&vec![ParticleType::N4, ParticleType::GAMMA]).unwrap();
        assert_eq!(json, "[5914,22]");
        let back: Vec<ParticleType> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![ParticleType::N4, ParticleType::GAMMA]);
    }

    #[test]
    fn display_uses_readable_names() {
        assert_eq!(ParticleType::GAMMA.to_string(), "Gamma");
        assert_eq!(
            ParticleType::C12_NUCLEUS.to_string(),
            "Nucleus(Z=6, A=12)"
        );
    }
}
