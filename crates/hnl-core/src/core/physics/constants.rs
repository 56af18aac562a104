//! Physical constants in natural units (GeV) with SI conversions.

/// Reduced Planck constant times the speed of light, in GeV * m.
pub const HBAR_C_GEV_M: f64 = 1.973_269_804e-16;

/// Fine-structure constant at low momentum transfer.
pub const ALPHA_EM: f64 = 1.0 / 137.035_999_084;

/// One inverse GeV squared expressed in square meters.
pub const INV_GEV2_TO_M2: f64 = 3.893_793_721e-32;

/// Unified atomic mass unit in GeV.
pub const ATOMIC_MASS_UNIT_GEV: f64 = 0.931_494_102_42;

/// Unified atomic mass unit in kilograms.
pub const ATOMIC_MASS_UNIT_KG: f64 = 1.660_539_066_60e-27;

/// Proton rest mass in GeV.
pub const PROTON_MASS_GEV: f64 = 0.938_272_088_16;
