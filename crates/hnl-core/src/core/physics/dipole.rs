use nalgebra::{Unit, Vector3};
use rand::Rng;
use std::f64::consts::PI;

use super::constants::{ALPHA_EM, INV_GEV2_TO_M2, PROTON_MASS_GEV};
use super::kinematics::FourMomentum;
use crate::core::models::model::ModelPoint;
use crate::core::models::particle::ParticleType;
use crate::core::utils::geometry::direction_about_axis;

/// Width bookkeeping for a dipole-coupled heavy neutral lepton.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipoleModel {
    mass: f64,
    coupling: f64,
}

impl DipoleModel {
    pub fn new(point: &ModelPoint) -> Self {
        Self {
            mass: point.mass(),
            coupling: point.coupling(),
        }
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Rest-frame width of `N4 -> nu gamma` in GeV.
    pub fn radiative_width(&self) -> f64 {
        self.coupling * self.coupling * self.mass.powi(3) / (4.0 * PI)
    }

    /// Smallest width among the enabled decay channels.
    ///
    /// Only the radiative channel is open for a pure dipole coupling, so this equals
    /// [`DipoleModel::radiative_width`]; it is the width the decay-range function uses to
    /// bound the longest plausible decay length.
    pub fn min_decay_width(&self) -> f64 {
        self.radiative_width()
    }

    pub fn total_width(&self) -> f64 {
        self.radiative_width()
    }
}

/// Kinematic outcome of one up-scattering `nu + A -> N4 + A`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpscatterFinalState {
    pub lepton: FourMomentum,
    pub recoil: FourMomentum,
    pub inelasticity: f64,
}

/// Coherent plus incoherent dipole up-scattering on nuclei.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipoleCrossSection {
    mass: f64,
    coupling: f64,
}

impl DipoleCrossSection {
    pub fn new(point: &ModelPoint) -> Self {
        Self {
            mass: point.mass(),
            coupling: point.coupling(),
        }
    }

    pub fn supports(&self, target: ParticleType) -> bool {
        target.is_nucleus() && target.mass().is_some()
    }

    /// Lowest primary energy for which `N4` can be produced on a target at rest.
    pub fn threshold(&self, target_mass: f64) -> f64 {
        self.mass + self.mass * self.mass / (2.0 * target_mass)
    }

    /// Total cross-section in m^2 on one nucleus of type `target`.
    pub fn total(&self, energy: f64, target: ParticleType) -> f64 {
        let (Some(target_mass), Some(z)) = (target.mass(), target.proton_count()) else {
            return 0.0;
        };
        let z = f64::from(z);
        let coherent = z * z * log_enhancement(energy / self.threshold(target_mass));
        // Hydrogen is already a single proton; its coherent term is the whole answer.
        let incoherent = if target == ParticleType::H_NUCLEUS {
            0.0
        } else {
            z * log_enhancement(energy / self.threshold(PROTON_MASS_GEV))
        };
        ALPHA_EM * self.coupling * self.coupling * (coherent + incoherent) * INV_GEV2_TO_M2
    }

    /// Allowed inelasticity interval `y = 1 - E_N / E` at primary energy `energy`.
    ///
    /// On a target at rest `y = Q^2 / (2 M E)`, so the interval is the momentum-transfer range
    /// rescaled.
    pub fn y_range(&self, energy: f64, target_mass: f64) -> Option<(f64, f64)> {
        let frame = self.cm_frame(energy, target_mass)?;
        let (q2_min, q2_max) = frame.q2_bounds();
        let scale = 2.0 * target_mass * energy;
        Some((q2_min / scale, q2_max / scale))
    }

    /// Samples `[N4, recoil]` from the leading-log differential `dsigma/dy ~ 1/y - y_min/y^2`.
    ///
    /// Integrated over [`DipoleCrossSection::y_range`] this gives the `ln x - 1 + 1/x` shape of
    /// [`DipoleCrossSection::total`]. Small momentum transfers dominate, so the lepton keeps
    /// most of the primary energy and leaves close to the incoming direction.
    pub fn sample_final_state<R: Rng + ?Sized>(
        &self,
        energy: f64,
        direction: &Unit<Vector3<f64>>,
        target_mass: f64,
        rng: &mut R,
    ) -> Option<UpscatterFinalState> {
        let frame = self.cm_frame(energy, target_mass)?;
        let (q2_min, q2_max) = frame.q2_bounds();
        if !(q2_min > 0.0 && q2_max > q2_min) {
            return None;
        }
        let q2 = sample_log_enhanced(q2_min, q2_max, rng)?;
        // t is linear in the CM angle: Q^2 = Q^2_min + 2 p_in p_out (1 - cos).
        let cos_theta =
            (1.0 - (q2 - q2_min) / (2.0 * frame.p_in * frame.p_out)).clamp(-1.0, 1.0);
        let phi = rng.gen_range(0.0..2.0 * PI);

        let cm_direction = direction_about_axis(direction, cos_theta, phi);
        let lepton_cm = FourMomentum::new(frame.lepton_energy_cm, cm_direction.as_ref() * frame.p_out);
        let recoil_cm = FourMomentum::new(
            frame.recoil_energy_cm,
            -cm_direction.as_ref() * frame.p_out,
        );
        let beta = direction.as_ref() * frame.beta;
        let lepton = lepton_cm.boost(&beta);
        let recoil = recoil_cm.boost(&beta);
        Some(UpscatterFinalState {
            lepton,
            recoil,
            inelasticity: q2 / (2.0 * target_mass * energy),
        })
    }

    fn cm_frame(&self, energy: f64, target_mass: f64) -> Option<CmFrame> {
        if energy < self.threshold(target_mass) {
            return None;
        }
        let m2 = self.mass * self.mass;
        let big_m2 = target_mass * target_mass;
        let s = big_m2 + 2.0 * target_mass * energy;
        let sqrt_s = s.sqrt();
        let kallen = (s - (self.mass + target_mass).powi(2)) * (s - (self.mass - target_mass).powi(2));
        Some(CmFrame {
            s,
            lepton_mass: self.mass,
            target_mass,
            p_in: (s - big_m2) / (2.0 * sqrt_s),
            lepton_energy_cm: (s + m2 - big_m2) / (2.0 * sqrt_s),
            recoil_energy_cm: (s + big_m2 - m2) / (2.0 * sqrt_s),
            p_out: kallen.max(0.0).sqrt() / (2.0 * sqrt_s),
            beta: energy / (energy + target_mass),
        })
    }
}

struct CmFrame {
    s: f64,
    lepton_mass: f64,
    target_mass: f64,
    p_in: f64,
    lepton_energy_cm: f64,
    recoil_energy_cm: f64,
    p_out: f64,
    beta: f64,
}

impl CmFrame {
    /// `(Q^2_min, Q^2_max)` for forward and backward emission.
    ///
    /// `Q^2_min` is far below the beam energy scale on heavy targets, so it is built from the
    /// momentum and energy gaps in closed form instead of subtracting nearly equal numbers.
    fn q2_bounds(&self) -> (f64, f64) {
        let m2 = self.lepton_mass * self.lepton_mass;
        let big_m2 = self.target_mass * self.target_mass;
        // p_in - p_out and p_in - E_cm of the lepton
        let momentum_gap =
            m2 * (2.0 * self.s + 2.0 * big_m2 - m2) / (4.0 * self.s * (self.p_in + self.p_out));
        let energy_gap = -m2 / (2.0 * self.s.sqrt());
        let q2_min = (m2 * (momentum_gap + energy_gap) / (self.lepton_energy_cm + self.p_out)).max(0.0);
        (q2_min, q2_min + 4.0 * self.p_in * self.p_out)
    }
}

const MAX_TRANSFER_PROPOSALS: usize = 1_000;

/// Draws `q` on `[lo, hi]` with density proportional to `1/q - lo/q^2`.
///
/// Proposals are log-uniform and accepted with `(1 - lo/q) / (1 - lo/hi)`, which keeps the
/// acceptance above one half even right at threshold.
fn sample_log_enhanced<R: Rng + ?Sized>(lo: f64, hi: f64, rng: &mut R) -> Option<f64> {
    let (log_lo, log_hi) = (lo.ln(), hi.ln());
    let envelope = 1.0 - lo / hi;
    for _ in 0..MAX_TRANSFER_PROPOSALS {
        let q = rng.gen_range(log_lo..=log_hi).exp().clamp(lo, hi);
        if rng.r#gen::<f64>() * envelope <= 1.0 - lo / q {
            return Some(q);
        }
    }
    None
}

/// `ln x - 1 + 1/x` above threshold, zero below.
fn log_enhancement(x: f64) -> f64 {
    if x > 1.0 { x.ln() - 1.0 + 1.0 / x } else { 0.0 }
}

/// Two-body radiative decay `N4 -> nu_mu gamma`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipoleDecay {
    mass: f64,
}

impl DipoleDecay {
    pub const PRODUCTS: [ParticleType; 2] = [ParticleType::NU_MU, ParticleType::GAMMA];

    pub fn new(point: &ModelPoint) -> Self {
        Self { mass: point.mass() }
    }

    /// Samples the daughters `[nu_mu, gamma]` isotropically in the parent rest frame.
    pub fn sample_daughters<R: Rng + ?Sized>(
        &self,
        parent: &FourMomentum,
        rng: &mut R,
    ) -> [FourMomentum; 2] {
        let half = self.mass / 2.0;
        let z = Unit::new_normalize(Vector3::z());
        let cos_theta = rng.gen_range(-1.0..=1.0);
        let phi = rng.gen_range(0.0..2.0 * PI);
        let axis = direction_about_axis(&z, cos_theta, phi);
        let beta = parent.velocity();
        let neutrino = FourMomentum::new(half, -axis.as_ref() * half).boost(&beta);
        let photon = FourMomentum::new(half, axis.as_ref() * half).boost(&beta);
        [neutrino, photon]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn point(mass: f64, coupling: f64) -> ModelPoint {
        ModelPoint::new(mass, coupling).unwrap()
    }

    #[test]
    fn radiative_width_scales_with_coupling_squared_and_mass_cubed() {
        let base = DipoleModel::new(&point(0.1, 1e-6)).radiative_width();
        let doubled_mu = DipoleModel::new(&point(0.1, 2e-6)).radiative_width();
        let doubled_m = DipoleModel::new(&point(0.2, 1e-6)).radiative_width();
        assert!((doubled_mu / base - 4.0).abs() < 1e-12);
        assert!((doubled_m / base - 8.0).abs() < 1e-12);
        let expected = 1e-12 * 1e-3 / (4.0 * PI);
        assert!((base - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn min_decay_width_is_positive_for_valid_points() {
        let model = DipoleModel::new(&point(0.02, 5e-8));
        assert!(model.min_decay_width() > 0.0);
        assert!(model.min_decay_width().is_finite());
    }

    #[test]
    fn threshold_includes_recoil_correction() {
        let xs = DipoleCrossSection::new(&point(0.5, 1e-6));
        assert!((xs.threshold(1.0) - 0.625).abs() < 1e-12);
    }

    #[test]
    fn total_cross_section_vanishes_below_threshold() {
        let xs = DipoleCrossSection::new(&point(0.3, 1e-6));
        assert_eq!(xs.total(0.2, ParticleType::O16_NUCLEUS), 0.0);
        assert!(xs.total(2.0, ParticleType::O16_NUCLEUS) > 0.0);
        assert_eq!(xs.total(2.0, ParticleType::GAMMA), 0.0);
    }

    #[test]
    fn total_cross_section_grows_with_energy_and_charge() {
        let xs = DipoleCrossSection::new(&point(0.05, 1e-6));
        let low = xs.total(0.5, ParticleType::C12_NUCLEUS);
        let high = xs.total(5.0, ParticleType::C12_NUCLEUS);
        assert!(high > low);
        assert!(xs.total(5.0, ParticleType::AR40_NUCLEUS) > high);
    }

    #[test]
    fn y_range_is_empty_below_threshold_and_ordered_above() {
        let xs = DipoleCrossSection::new(&point(0.1, 1e-6));
        let mass = ParticleType::O16_NUCLEUS.mass().unwrap();
        assert!(xs.y_range(0.05, mass).is_none());
        let (lo, hi) = xs.y_range(2.0, mass).unwrap();
        assert!(0.0 <= lo && lo < hi && hi < 1.0);
    }

    #[test]
    fn sampled_final_state_conserves_four_momentum() {
        let xs = DipoleCrossSection::new(&point(0.1, 1e-6));
        let target = ParticleType::C12_NUCLEUS.mass().unwrap();
        let dir = Unit::new_normalize(Vector3::new(0.0, 0.3, 1.0));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let state = xs.sample_final_state(3.0, &dir, target, &mut rng).unwrap();
            let total = state.lepton + state.recoil;
            assert!((total.energy - (3.0 + target)).abs() < 1e-9);
            assert!((total.momentum - dir.as_ref() * 3.0).norm() < 1e-9);
            assert!((state.lepton.invariant_mass_squared() - 0.01).abs() < 1e-9);
            let (lo, hi) = xs.y_range(3.0, target).unwrap();
            assert!(state.inelasticity >= lo - 1e-12 && state.inelasticity <= hi + 1e-12);
        }
    }

    #[test]
    fn up_scattering_on_nuclei_is_forward_peaked() {
        let xs = DipoleCrossSection::new(&point(0.02, 5e-8));
        let beam = Unit::new_normalize(Vector3::z());
        let mut rng = StdRng::seed_from_u64(11);
        for target in [ParticleType::O16_NUCLEUS, ParticleType::C12_NUCLEUS] {
            let mass = target.mass().unwrap();
            let samples = 10_000;
            let (mut forward, mut backward) = (0, 0);
            for _ in 0..samples {
                let state = xs.sample_final_state(1.0, &beam, mass, &mut rng).unwrap();
                let cos = state.lepton.momentum.normalize().dot(&beam);
                if cos > 0.99 {
                    forward += 1;
                }
                if cos < 0.0 {
                    backward += 1;
                }
            }
            let forward = forward as f64 / samples as f64;
            let backward = backward as f64 / samples as f64;
            assert!(forward > 0.5, "{}: forward fraction {}", target, forward);
            assert!(backward < 0.1, "{}: backward fraction {}", target, backward);
        }
    }

    #[test]
    fn minimum_momentum_transfer_matches_the_heavy_target_limit() {
        let xs = DipoleCrossSection::new(&point(0.02, 5e-8));
        let (y_min, _) = xs.y_range(1.0, 1e6).unwrap();
        let q2_min = y_min * 2.0 * 1e6 * 1.0;
        let expected = 0.02_f64.powi(4) / 4.0;
        assert!((q2_min - expected).abs() / expected < 1e-3, "{}", q2_min);
    }

    #[test]
    fn log_enhanced_sampler_stays_in_bounds_and_favours_small_values() {
        let mut rng = StdRng::seed_from_u64(5);
        let draws: Vec<f64> = (0..5_000)
            .map(|_| sample_log_enhanced(1e-6, 1.0, &mut rng).unwrap())
            .collect();
        assert!(draws.iter().all(|q| (1e-6..=1.0).contains(q)));
        let below = draws.iter().filter(|q| **q < 1e-3).count();
        assert!(below > draws.len() / 3);
    }

    #[test]
    fn decay_daughters_are_massless_and_conserve_momentum() {
        let decay = DipoleDecay::new(&point(0.2, 1e-6));
        let parent = FourMomentum::on_shell(0.2, 1.5, &Unit::new_normalize(Vector3::z()));
        let mut rng = StdRng::seed_from_u64(3);
        let [nu, gamma] = decay.sample_daughters(&parent, &mut rng);
        assert!(nu.invariant_mass_squared().abs() < 1e-9);
        assert!(gamma.invariant_mass_squared().abs() < 1e-9);
        let total = nu + gamma;
        assert!((total.energy - parent.energy).abs() < 1e-9);
        assert!((total.momentum - parent.momentum).norm() < 1e-9);
    }
}
