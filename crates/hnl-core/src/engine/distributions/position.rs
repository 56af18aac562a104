use nalgebra::{Point3, Unit, Vector3};
use rand::RngCore;
use std::f64::consts::PI;
use std::fmt::Debug;

use crate::core::detector::geometry::Path;
use crate::core::detector::model::DetectorModel;
use crate::core::models::particle::ParticleType;
use crate::core::physics::constants::HBAR_C_GEV_M;
use crate::core::physics::kinematics::beta_gamma;
use crate::core::utils::geometry::{closest_approach_to_origin, point_on_plane};
use crate::engine::utils::sampling::{
    sample_disk, sample_truncated_exponential, truncated_exponential_density,
};

const ON_PATH_TOLERANCE: f64 = 1e-6;

pub trait VertexDistribution: Debug + Send + Sync {
    /// Draws a production vertex for a primary of `energy` travelling along `direction`.
    /// `None` when the injection region does not intersect the detector.
    fn sample(
        &self,
        detector: &DetectorModel,
        energy: f64,
        direction: &Unit<Vector3<f64>>,
        rng: &mut dyn RngCore,
    ) -> Option<Point3<f64>>;

    /// Density per m^3 of producing the vertex at `vertex`.
    fn density(
        &self,
        detector: &DetectorModel,
        energy: f64,
        direction: &Unit<Vector3<f64>>,
        vertex: &Point3<f64>,
    ) -> f64;

    fn target_types(&self) -> &[ParticleType];
}

/// Lab-frame decay length of a long-lived particle and the injection range derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayRangeFunction {
    pub particle_mass: f64,
    pub decay_width: f64,
    pub multiplier: f64,
    pub max_distance: f64,
}

impl DecayRangeFunction {
    pub fn new(particle_mass: f64, decay_width: f64, multiplier: f64, max_distance: f64) -> Self {
        Self {
            particle_mass,
            decay_width,
            multiplier,
            max_distance,
        }
    }

    /// Mean lab-frame decay length in meters of the particle carrying `energy`.
    pub fn decay_length(&self, energy: f64) -> f64 {
        HBAR_C_GEV_M * beta_gamma(self.particle_mass, energy) / self.decay_width
    }

    pub fn range(&self, energy: f64) -> f64 {
        (self.decay_length(energy) * self.multiplier).min(self.max_distance)
    }
}

/// Vertices along the beam line, upstream of the detector by up to a few decay lengths.
///
/// A point of closest approach is drawn uniformly on a disk of `radius` normal to the beam,
/// the segment `[-endcap_length, +endcap_length]` around it is extended upstream by
/// [`DecayRangeFunction::range`] and clipped to the detector bounds, and the vertex is placed
/// on that segment following a truncated exponential in the decay length.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayRangePositionDistribution {
    pub radius: f64,
    pub endcap_length: f64,
    pub range_function: DecayRangeFunction,
    pub target_types: Vec<ParticleType>,
}

impl DecayRangePositionDistribution {
    pub fn new(
        radius: f64,
        endcap_length: f64,
        range_function: DecayRangeFunction,
        target_types: Vec<ParticleType>,
    ) -> Self {
        Self {
            radius,
            endcap_length,
            range_function,
            target_types,
        }
    }

    fn injection_path(
        &self,
        detector: &DetectorModel,
        energy: f64,
        direction: &Unit<Vector3<f64>>,
        pca: &Point3<f64>,
    ) -> Option<Path> {
        let start = pca - direction.as_ref() * self.endcap_length;
        let mut path = Path::new(start, *direction, 2.0 * self.endcap_length);
        path.extend_from_start(self.range_function.range(energy));
        path.clip_to(detector.outer_bounds()).then_some(path)
    }
}

impl VertexDistribution for DecayRangePositionDistribution {
    fn sample(
        &self,
        detector: &DetectorModel,
        energy: f64,
        direction: &Unit<Vector3<f64>>,
        rng: &mut dyn RngCore,
    ) -> Option<Point3<f64>> {
        let (x, y) = sample_disk(self.radius, rng);
        let pca = point_on_plane(direction, x, y);
        let path = self.injection_path(detector, energy, direction, &pca)?;
        let scale = self.range_function.decay_length(energy);
        let distance = sample_truncated_exponential(scale, path.length(), rng);
        Some(path.point_at(distance))
    }

    fn density(
        &self,
        detector: &DetectorModel,
        energy: f64,
        direction: &Unit<Vector3<f64>>,
        vertex: &Point3<f64>,
    ) -> f64 {
        let pca = closest_approach_to_origin(vertex, direction);
        if pca.coords.norm() > self.radius {
            return 0.0;
        }
        let Some(path) = self.injection_path(detector, energy, direction, &pca) else {
            return 0.0;
        };
        let Some(distance) = path.distance_along(vertex, ON_PATH_TOLERANCE) else {
            return 0.0;
        };
        let scale = self.range_function.decay_length(energy);
        truncated_exponential_density(distance, scale, path.length()) / (PI * self.radius * self.radius)
    }

    fn target_types(&self) -> &[ParticleType] {
        &self.target_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::path::Path as FsPath;

    fn detector() -> DetectorModel {
        DetectorModel::load(&DetectorModel::resource_path(
            FsPath::new(crate::BUNDLED_RESOURCE_DIR),
            "ND280UPGRD",
        ))
        .unwrap()
    }

    fn beam() -> Unit<Vector3<f64>> {
        Unit::new_normalize(Vector3::z())
    }

    #[test]
    fn decay_length_follows_boost_over_width() {
        let range = DecayRangeFunction::new(1.0, HBAR_C_GEV_M, 3.0, 1e9);
        // beta * gamma = 2 at E = sqrt(5) m
        assert!((range.decay_length(5.0_f64.sqrt()) - 2.0).abs() < 1e-12);
        assert!((range.range(5.0_f64.sqrt()) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn range_is_capped_at_max_distance() {
        let range = DecayRangeFunction::new(0.02, 1e-21, 3.0, 284.9);
        assert!(range.decay_length(1.0) > 1e6);
        assert_eq!(range.range(1.0), 284.9);
    }

    #[test]
    fn short_lived_particles_are_injected_near_the_detector() {
        let range = DecayRangeFunction::new(0.1, 1e-14, 3.0, 284.9);
        let dist = DecayRangePositionDistribution::new(5.0, 9.0, range, vec![]);
        let det = detector();
        let mut rng = StdRng::seed_from_u64(2);
        let reach = range.range(1.0);
        for _ in 0..100 {
            let v = dist.sample(&det, 1.0, &beam(), &mut rng).unwrap();
            assert!(v.z >= -9.0 - reach - 1e-9 && v.z <= 9.0);
            assert!(v.x * v.x + v.y * v.y <= 25.0 + 1e-9);
        }
    }

    #[test]
    fn long_lived_particles_reach_the_world_boundary() {
        let range = DecayRangeFunction::new(0.02, 1e-21, 3.0, 284.9);
        let dist = DecayRangePositionDistribution::new(5.0, 9.0, range, vec![]);
        let det = detector();
        let mut rng = StdRng::seed_from_u64(3);
        let min_z = (0..500)
            .map(|_| dist.sample(&det, 2.0, &beam(), &mut rng).unwrap().z)
            .fold(f64::INFINITY, f64::min);
        assert!(min_z < -200.0);
        assert!(min_z >= -293.9 - 1e-9);
    }

    #[test]
    fn density_is_positive_at_sampled_vertices_and_zero_off_path() {
        let range = DecayRangeFunction::new(0.05, 1e-18, 3.0, 284.9);
        let dist = DecayRangePositionDistribution::new(5.0, 9.0, range, vec![]);
        let det = detector();
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..50 {
            let v = dist.sample(&det, 3.0, &beam(), &mut rng).unwrap();
            let density = dist.density(&det, 3.0, &beam(), &v);
            assert!(density > 0.0 && density.is_finite());
        }
        assert_eq!(
            dist.density(&det, 3.0, &beam(), &Point3::new(6.0, 0.0, 0.0)),
            0.0
        );
        assert_eq!(
            dist.density(&det, 3.0, &beam(), &Point3::new(0.0, 0.0, 20.0)),
            0.0
        );
    }

    #[test]
    fn density_integrates_to_one_over_the_injection_volume() {
        // A long decay length makes the longitudinal profile flat, so the integral reduces to
        // disk area times path length.
        let range = DecayRangeFunction::new(0.02, 1e-21, 3.0, 284.9);
        let dist = DecayRangePositionDistribution::new(5.0, 9.0, range, vec![]);
        let det = detector();
        let density = dist.density(&det, 2.0, &beam(), &Point3::new(1.0, 1.0, 0.0));
        let path_length = 9.0 + 284.9 + 9.0;
        let volume = PI * 25.0 * path_length;
        assert!((density * volume - 1.0).abs() < 1e-3);
    }
}
