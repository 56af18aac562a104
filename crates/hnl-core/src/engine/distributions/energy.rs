use rand::{Rng, RngCore};
use std::fmt::Debug;
use std::sync::Arc;

use crate::core::flux::TabulatedFlux;

pub trait EnergyDistribution: Debug + Send + Sync {
    fn sample(&self, rng: &mut dyn RngCore) -> f64;
    fn density(&self, energy: f64) -> f64;
    /// Closed interval outside of which the density vanishes.
    fn support(&self) -> (f64, f64);
    /// Share of the distribution's probability above `threshold`.
    fn fraction_above(&self, threshold: f64) -> f64;
}

/// A tabulated flux restricted to `[min, max]`.
///
/// As an injection distribution it is normalized to a pdf; as a physical distribution its
/// density is the flux itself.
#[derive(Debug, Clone)]
pub struct TabulatedFluxDistribution {
    table: Arc<TabulatedFlux>,
    min: f64,
    max: f64,
    normalized: bool,
    knots: Vec<f64>,
    cumulative: Vec<f64>,
}

impl TabulatedFluxDistribution {
    /// The window is clamped to the table; an empty window yields an empty distribution
    /// that [`TabulatedFluxDistribution::is_empty`] reports.
    pub fn new(table: Arc<TabulatedFlux>, min: f64, max: f64, normalized: bool) -> Self {
        let min = min.max(table.min_energy());
        let max = max.min(table.max_energy());
        let mut knots = vec![min];
        if max > min {
            knots.extend(table.nodes().map(|(e, _)| e).filter(|&e| e > min && e < max));
            knots.push(max);
        }
        let mut cumulative = Vec::with_capacity(knots.len());
        let mut total = 0.0;
        cumulative.push(0.0);
        for w in knots.windows(2) {
            total += 0.5 * (table.value_at(w[0]) + table.value_at(w[1])) * (w[1] - w[0]);
            cumulative.push(total);
        }
        Self {
            table,
            min,
            max,
            normalized,
            knots,
            cumulative,
        }
    }

    /// Full range of the table with the flux as density.
    pub fn physical(table: Arc<TabulatedFlux>) -> Self {
        let (min, max) = (table.min_energy(), table.max_energy());
        Self::new(table, min, max, false)
    }

    pub fn total(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.max <= self.min || self.total() <= 0.0
    }

    pub fn table(&self) -> &Arc<TabulatedFlux> {
        &self.table
    }

    /// Inverse CDF of the piecewise-linear density.
    fn invert(&self, u: f64) -> f64 {
        if self.is_empty() {
            return self.min;
        }
        let target = u.clamp(0.0, 1.0) * self.total();
        let segment = self
            .cumulative
            .partition_point(|&c| c <= target)
            .clamp(1, self.knots.len() - 1)
            - 1;
        let (e0, e1) = (self.knots[segment], self.knots[segment + 1]);
        let (f0, f1) = (self.table.value_at(e0), self.table.value_at(e1));
        let width = e1 - e0;
        let local = target - self.cumulative[segment];
        let slope = (f1 - f0) / width;
        let offset = if slope.abs() * width < 1e-12 * f0.max(f1) {
            if f0 > 0.0 { local / f0 } else { 0.0 }
        } else {
            (-f0 + (f0 * f0 + 2.0 * slope * local).max(0.0).sqrt()) / slope
        };
        (e0 + offset).clamp(e0, e1)
    }
}

impl EnergyDistribution for TabulatedFluxDistribution {
    fn sample(&self, rng: &mut dyn RngCore) -> f64 {
        self.invert(rng.r#gen::<f64>())
    }

    fn density(&self, energy: f64) -> f64 {
        if energy < self.min || energy > self.max {
            return 0.0;
        }
        let value = self.table.value_at(energy);
        if !self.normalized {
            return value;
        }
        let total = self.total();
        if total > 0.0 { value / total } else { 0.0 }
    }

    fn support(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    fn fraction_above(&self, threshold: f64) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        self.table.integral(threshold.max(self.min), self.max) / total
    }
}
