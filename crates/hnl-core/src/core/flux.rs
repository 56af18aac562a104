use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FluxLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Flux table parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Malformed flux row {row} in '{path}': {message}")]
    Row {
        path: String,
        row: usize,
        message: String,
    },
    #[error("Invalid flux table '{path}': {reason}")]
    Invalid { path: String, reason: String },
}

/// A neutrino flux tabulated on an increasing energy grid.
///
/// Energies are in GeV, values in nu / m^2 / GeV / POT. Between nodes the flux is linear;
/// outside the table it is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedFlux {
    energies: Vec<f64>,
    values: Vec<f64>,
}

impl TabulatedFlux {
    /// `<resource-dir>/fluxes/<experiment>/<species>.dat`
    pub fn resource_path(resource_dir: &Path, experiment: &str, species: &str) -> PathBuf {
        resource_dir
            .join("fluxes")
            .join(experiment)
            .join(format!("{}.dat", species))
    }

    /// Reads a whitespace-separated two-column table; lines starting with `#` are ignored.
    pub fn load(path: &Path) -> Result<Self, FluxLoadError> {
        let path_str = path.to_string_lossy().to_string();
        let file = std::fs::File::open(path).map_err(|e| FluxLoadError::Io {
            path: path_str.clone(),
            source: e,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b' ')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut energies = Vec::new();
        let mut values = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| FluxLoadError::Csv {
                path: path_str.clone(),
                source: e,
            })?;
            let fields: Vec<&str> = record.iter().filter(|f| !f.is_empty()).collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() < 2 {
                return Err(FluxLoadError::Row {
                    path: path_str,
                    row,
                    message: format!("expected 2 columns, found {}", fields.len()),
                });
            }
            let parse = |s: &str| {
                s.parse::<f64>().map_err(|e| FluxLoadError::Row {
                    path: path_str.clone(),
                    row,
                    message: format!("'{}': {}", s, e),
                })
            };
            energies.push(parse(fields[0])?);
            values.push(parse(fields[1])?);
        }

        let flux = Self::from_points(energies, values).map_err(|e| match e {
            FluxLoadError::Invalid { reason, .. } => FluxLoadError::Invalid {
                path: path_str.clone(),
                reason,
            },
            other => other,
        })?;
        debug!(path = %path_str, nodes = flux.energies.len(), "Loaded flux table.");
        Ok(flux)
    }

    pub fn from_points(energies: Vec<f64>, values: Vec<f64>) -> Result<Self, FluxLoadError> {
        let invalid = |reason: String| FluxLoadError::Invalid {
            path: "<memory>".to_string(),
            reason,
        };
        if energies.len() != values.len() {
            return Err(invalid(format!(
                "{} energies but {} values",
                energies.len(),
                values.len()
            )));
        }
        if energies.len() < 2 {
            return Err(invalid("at least two nodes are required".to_string()));
        }
        if energies.iter().any(|e| !e.is_finite()) {
            return Err(invalid("energies must be finite".to_string()));
        }
        if energies.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid("energies must be strictly increasing".to_string()));
        }
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(invalid("flux values must be finite and non-negative".to_string()));
        }
        Ok(Self { energies, values })
    }

    pub fn min_energy(&self) -> f64 {
        self.energies[0]
    }

    pub fn max_energy(&self) -> f64 {
        self.energies[self.energies.len() - 1]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.energies.iter().copied().zip(self.values.iter().copied())
    }

    pub fn value_at(&self, energy: f64) -> f64 {
        if !(self.min_energy()..=self.max_energy()).contains(&energy) {
            return 0.0;
        }
        let upper = self.energies.partition_point(|&e| e < energy);
        if upper == 0 {
            return self.values[0];
        }
        let (e0, e1) = (self.energies[upper - 1], self.energies[upper]);
        let (f0, f1) = (self.values[upper - 1], self.values[upper]);
        f0 + (f1 - f0) * (energy - e0) / (e1 - e0)
    }

    /// Exact integral of the piecewise-linear flux over `[lo, hi]`.
    pub fn integral(&self, lo: f64, hi: f64) -> f64 {
        let lo = lo.max(self.min_energy());
        let hi = hi.min(self.max_energy());
        if hi <= lo {
            return 0.0;
        }
        let mut knots = vec![lo];
        knots.extend(self.energies.iter().copied().filter(|&e| e > lo && e < hi));
        knots.push(hi);
        knots
            .windows(2)
            .map(|w| 0.5 * (self.value_at(w[0]) + self.value_at(w[1])) * (w[1] - w[0]))
            .sum()
    }
}
