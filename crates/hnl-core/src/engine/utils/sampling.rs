use rand::{Rng, distributions::WeightedIndex, prelude::*};
use std::f64::consts::PI;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("Input weights list is empty, cannot perform sampling")]
    EmptyWeights,
    #[error("All weights are zero, cannot perform sampling")]
    ZeroTotalWeight,
    #[error("Failed to create weighted distribution: {source}")]
    DistributionError {
        #[from]
        source: rand::distributions::WeightedError,
    },
}

/// Draws an index with probability proportional to its weight.
#[instrument(level = "trace", skip_all, fields(n = weights.len()))]
pub fn weighted_choice<R: Rng + ?Sized>(
    weights: &[f64],
    rng: &mut R,
) -> Result<usize, SamplingError> {
    if weights.is_empty() {
        return Err(SamplingError::EmptyWeights);
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(SamplingError::ZeroTotalWeight);
    }
    let dist = WeightedIndex::new(weights)?;
    Ok(dist.sample(rng))
}

/// Samples `d` in `[0, max]` from `exp(-d / scale)` truncated to that interval.
pub fn sample_truncated_exponential<R: Rng + ?Sized>(scale: f64, max: f64, rng: &mut R) -> f64 {
    if max <= 0.0 || scale <= 0.0 {
        return 0.0;
    }
    let y: f64 = rng.r#gen();
    (-scale * (y * (-max / scale).exp_m1()).ln_1p()).clamp(0.0, max)
}

/// Density of [`sample_truncated_exponential`] at `d`.
pub fn truncated_exponential_density(d: f64, scale: f64, max: f64) -> f64 {
    if !(0.0..=max).contains(&d) || scale <= 0.0 || max <= 0.0 {
        return 0.0;
    }
    (-d / scale).exp() / (scale * -(-max / scale).exp_m1())
}

/// Probability that an exponential decay with mean `scale` happens within `max`.
pub fn exponential_probability_within(scale: f64, max: f64) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    if scale <= 0.0 {
        return 1.0;
    }
    -(-max / scale).exp_m1()
}

/// Uniform point on a disk of `radius` centred at the origin.
pub fn sample_disk<R: Rng + ?Sized>(radius: f64, rng: &mut R) -> (f64, f64) {
    let r = radius * rng.r#gen::<f64>().sqrt();
    let phi = rng.gen_range(0.0..2.0 * PI);
    (r * phi.cos(), r * phi.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn weighted_choice_never_picks_zero_weights() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let idx = weighted_choice(&[0.0, 3.0, 0.0, 1.0], &mut rng).unwrap();
            assert!(idx == 1 || idx == 3);
        }
    }

    #[test]
    fn weighted_choice_rejects_degenerate_weights() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            weighted_choice(&[], &mut rng),
            Err(SamplingError::EmptyWeights)
        ));
        assert!(matches!(
            weighted_choice(&[0.0, 0.0], &mut rng),
            Err(SamplingError::ZeroTotalWeight)
        ));
    }

    #[test]
    fn truncated_exponential_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        for &(scale, max) in &[(1e-9, 300.0), (2.0, 10.0), (1e7, 300.0)] {
            for _ in 0..100 {
                let d = sample_truncated_exponential(scale, max, &mut rng);
                assert!((0.0..=max).contains(&d));
            }
        }
    }

    #[test]
    fn truncated_exponential_density_integrates_to_one() {
        let (scale, max) = (3.0, 10.0);
        let steps = 100_000;
        let h = max / steps as f64;
        let integral: f64 = (0..steps)
            .map(|i| truncated_exponential_density((i as f64 + 0.5) * h, scale, max) * h)
            .sum();
        assert!((integral - 1.0).abs() < 1e-6);
        assert_eq!(truncated_exponential_density(11.0, scale, max), 0.0);
    }

    #[test]
    fn long_decay_lengths_are_numerically_stable() {
        let p = exponential_probability_within(6.0e6, 300.0);
        assert!((p - 5.0e-5).abs() / 5.0e-5 < 1e-4);
        let density = truncated_exponential_density(150.0, 6.0e6, 300.0);
        assert!((density - 1.0 / 300.0).abs() < 1e-6);
    }

    #[test]
    fn disk_samples_lie_inside_radius() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let (x, y) = sample_disk(5.0, &mut rng);
            assert!(x * x + y * y <= 25.0 + 1e-12);
        }
    }
}
