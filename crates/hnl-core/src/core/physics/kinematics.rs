use nalgebra::{Unit, Vector3};
use std::ops::Add;

/// Energy-momentum four-vector `(E, p)` in GeV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FourMomentum {
    pub energy: f64,
    pub momentum: Vector3<f64>,
}

impl FourMomentum {
    pub fn new(energy: f64, momentum: Vector3<f64>) -> Self {
        Self { energy, momentum }
    }

    /// On-shell four-momentum of a particle with `mass` and total `energy` moving along
    /// `direction`. Energies below the mass are treated as at rest.
    pub fn on_shell(mass: f64, energy: f64, direction: &Unit<Vector3<f64>>) -> Self {
        let p = (energy * energy - mass * mass).max(0.0).sqrt();
        Self {
            energy,
            momentum: direction.as_ref() * p,
        }
    }

    pub fn at_rest(mass: f64) -> Self {
        Self {
            energy: mass,
            momentum: Vector3::zeros(),
        }
    }

    pub fn momentum_magnitude(&self) -> f64 {
        self.momentum.norm()
    }

    pub fn invariant_mass_squared(&self) -> f64 {
        self.energy * self.energy - self.momentum.norm_squared()
    }

    /// Velocity `p / E` of the frame in which this four-vector is at rest.
    pub fn velocity(&self) -> Vector3<f64> {
        if self.energy <= 0.0 {
            return Vector3::zeros();
        }
        self.momentum / self.energy
    }

    pub fn direction(&self) -> Option<Unit<Vector3<f64>>> {
        Unit::try_new(self.momentum, f64::EPSILON)
    }

    /// Lorentz boost by velocity `beta` (|beta| < 1).
    pub fn boost(&self, beta: &Vector3<f64>) -> Self {
        let beta2 = beta.norm_squared();
        if beta2 <= 0.0 {
            return *self;
        }
        let gamma = 1.0 / (1.0 - beta2).sqrt();
        let bp = beta.dot(&self.momentum);
        let factor = (gamma - 1.0) * bp / beta2 + gamma * self.energy;
        Self {
            energy: gamma * (self.energy + bp),
            momentum: self.momentum + beta * factor,
        }
    }
}

impl Add for FourMomentum {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            energy: self.energy + rhs.energy,
            momentum: self.momentum + rhs.momentum,
        }
    }
}

/// Lorentz factor `beta * gamma = |p| / m` of a particle with `mass` and total `energy`.
pub fn beta_gamma(mass: f64, energy: f64) -> f64 {
    if mass <= 0.0 {
        return f64::INFINITY;
    }
    (energy * energy - mass * mass).max(0.0).sqrt() / mass
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_shell_vector_has_requested_mass() {
        let dir = Unit::new_normalize(Vector3::new(1.0, 2.0, 3.0));
        let p = FourMomentum::on_shell(0.1, 2.0, &dir);
        assert!((p.invariant_mass_squared() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn boost_preserves_invariant_mass() {
        let p = FourMomentum::new(0.5, Vector3::new(0.1, -0.2, 0.3));
        let boosted = p.boost(&Vector3::new(0.3, 0.4, -0.5));
        assert!((p.invariant_mass_squared() - boosted.invariant_mass_squared()).abs() < 1e-12);
    }

    #[test]
    fn boosting_rest_frame_by_velocity_recovers_moving_particle() {
        let dir = Unit::new_normalize(Vector3::z());
        let moving = FourMomentum::on_shell(1.0, 3.0, &dir);
        let rest = FourMomentum::at_rest(1.0);
        let boosted = rest.boost(&moving.velocity());
        assert!((boosted.energy - 3.0).abs() < 1e-12);
        assert!((boosted.momentum - moving.momentum).norm() < 1e-12);
    }

    #[test]
    fn beta_gamma_matches_momentum_over_mass() {
        assert!((beta_gamma(1.0, 5.0_f64.sqrt()) - 2.0).abs() < 1e-12);
        assert_eq!(beta_gamma(1.0, 0.5), 0.0);
    }

    #[test]
    fn sum_of_back_to_back_photons_is_at_rest() {
        let a = FourMomentum::new(0.5, Vector3::new(0.0, 0.0, 0.5));
        let b = FourMomentum::new(0.5, Vector3::new(0.0, 0.0, -0.5));
        let total = a + b;
        assert!((total.invariant_mass_squared() - 1.0).abs() < 1e-12);
    }
}
