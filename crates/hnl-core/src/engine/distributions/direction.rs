use nalgebra::{Unit, Vector3};
use rand::RngCore;
use std::fmt::Debug;

const DIRECTION_TOLERANCE: f64 = 1e-9;

pub trait DirectionDistribution: Debug + Send + Sync {
    fn sample(&self, rng: &mut dyn RngCore) -> Unit<Vector3<f64>>;
    /// Density for continuous distributions; probability mass for degenerate ones.
    fn density(&self, direction: &Unit<Vector3<f64>>) -> f64;
    /// The single direction a degenerate distribution always returns.
    fn fixed_direction(&self) -> Option<Unit<Vector3<f64>>> {
        None
    }
}

/// A degenerate distribution concentrated on one direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDirection {
    direction: Unit<Vector3<f64>>,
}

impl FixedDirection {
    pub fn new(direction: Unit<Vector3<f64>>) -> Self {
        Self { direction }
    }
}

impl DirectionDistribution for FixedDirection {
    fn sample(&self, _rng: &mut dyn RngCore) -> Unit<Vector3<f64>> {
        self.direction
    }

    fn density(&self, direction: &Unit<Vector3<f64>>) -> f64 {
        if same_direction(&self.direction, direction) {
            1.0
        } else {
            0.0
        }
    }

    fn fixed_direction(&self) -> Option<Unit<Vector3<f64>>> {
        Some(self.direction)
    }
}

pub fn same_direction(a: &Unit<Vector3<f64>>, b: &Unit<Vector3<f64>>) -> bool {
    (a.as_ref() - b.as_ref()).norm() < DIRECTION_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn fixed_direction_always_samples_its_vector() {
        let beam = Unit::new_normalize(Vector3::new(0.0, 0.0, 1.0));
        let dist = FixedDirection::new(beam);
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..10 {
            assert_eq!(dist.sample(&mut rng), beam);
        }
        assert_eq!(dist.fixed_direction(), Some(beam));
    }

    #[test]
    fn density_is_a_point_mass() {
        let dist = FixedDirection::new(Unit::new_normalize(Vector3::z()));
        assert_eq!(dist.density(&Unit::new_normalize(Vector3::z())), 1.0);
        assert_eq!(dist.density(&Unit::new_normalize(Vector3::x())), 0.0);
    }
}
