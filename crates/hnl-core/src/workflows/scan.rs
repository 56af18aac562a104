use std::path::Path;
use tracing::{info, instrument, warn};

use super::signal;
use crate::core::io::scan_log;
use crate::core::models::model::ModelPoint;
use crate::core::models::scan::ScanResult;
use crate::core::utils::grid::{geomspace, mesh_points};
use crate::engine::config::{ExperimentConfig, PipelineConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};

/// Log-spaced `(mass, coupling)` grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanGrid {
    pub mass_range: (f64, f64),
    pub coupling_range: (f64, f64),
    pub mass_points: usize,
    pub coupling_points: usize,
}

impl Default for ScanGrid {
    fn default() -> Self {
        Self {
            mass_range: (0.02, 0.4),
            coupling_range: (5e-8, 1e-2),
            mass_points: 10,
            coupling_points: 10,
        }
    }
}

impl ScanGrid {
    /// Grid points in traversal order: couplings in the outer loop, masses in the inner.
    pub fn points(&self) -> Result<Vec<(f64, f64)>, EngineError> {
        let masses = geomspace(self.mass_range.0, self.mass_range.1, self.mass_points)?;
        let couplings = geomspace(
            self.coupling_range.0,
            self.coupling_range.1,
            self.coupling_points,
        )?;
        Ok(mesh_points(&masses, &couplings))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Skip failing points instead of aborting the scan.
    pub keep_going: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSummary {
    pub results: Vec<ScanResult>,
    /// Points that failed and were skipped under `keep_going`.
    pub skipped: Vec<(f64, f64)>,
}

#[instrument(skip_all, name = "scan_workflow", fields(log = %log_path.display()))]
pub fn run(
    grid: &ScanGrid,
    config: &PipelineConfig,
    log_path: &Path,
    options: ScanOptions,
    reporter: &ProgressReporter,
) -> Result<ScanSummary, EngineError> {
    let points = grid.points()?;
    info!(points = points.len(), "Starting scan.");

    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let experiment = ExperimentConfig::load(config)?;
    reporter.report(Progress::PhaseFinish);

    let silent = ProgressReporter::new();
    let mut summary = ScanSummary::default();

    reporter.report(Progress::PhaseStart { name: "Scanning" });
    reporter.report(Progress::TaskStart {
        total_steps: points.len() as u64,
    });
    for (mass, coupling) in points {
        match run_point(mass, coupling, &experiment, config, &silent) {
            Ok(rate) => {
                let result = ScanResult {
                    mass,
                    coupling,
                    rate,
                };
                scan_log::append(log_path, &result)?;
                reporter.report(Progress::PointFinish {
                    mass,
                    coupling,
                    rate,
                });
                summary.results.push(result);
            }
            Err(e) if options.keep_going => {
                warn!(mass, coupling, error = %e, "Skipping failed scan point.");
                summary.skipped.push((mass, coupling));
            }
            Err(e) => return Err(e),
        }
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    info!(
        completed = summary.results.len(),
        skipped = summary.skipped.len(),
        "Scan finished."
    );
    Ok(summary)
}

fn run_point(
    mass: f64,
    coupling: f64,
    experiment: &ExperimentConfig,
    config: &PipelineConfig,
    reporter: &ProgressReporter,
) -> Result<f64, EngineError> {
    let model = ModelPoint::new(mass, coupling)?;
    Ok(signal::run_with_experiment(&model, experiment, config, reporter)?.rate)
}
