use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

use crate::core::models::model::ModelPoint;
use crate::core::physics::tables::resolve_table_dir;
use crate::engine::config::{ExperimentConfig, PipelineConfig};
use crate::engine::context::SimulationContext;
use crate::engine::distributions::assemble;
use crate::engine::error::EngineError;
use crate::engine::injector::Injector;
use crate::engine::process::ProcessRegistration;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::selection;

#[derive(Debug, Clone, PartialEq)]
pub struct SignalResult {
    pub model: ModelPoint,
    /// Expected signal events for the configured POT and efficiency.
    pub rate: f64,
    pub events_path: PathBuf,
    pub events: usize,
    pub attempts: u64,
}

/// Runs the full pipeline for one `(mass, coupling)` point.
#[instrument(skip(config, reporter), name = "signal_workflow")]
pub fn run(
    mass: f64,
    coupling: f64,
    config: &PipelineConfig,
    reporter: &ProgressReporter,
) -> Result<SignalResult, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let model = ModelPoint::new(mass, coupling)?;
    info!(%model, experiment = %config.experiment, "Loading experiment resources.");
    let experiment = ExperimentConfig::load(config)?;
    reporter.report(Progress::PhaseFinish);

    run_with_experiment(&model, &experiment, config, reporter)
}

/// Same as [`run`] with the detector and flux already loaded.
pub fn run_with_experiment(
    model: &ModelPoint,
    experiment: &ExperimentConfig,
    config: &PipelineConfig,
    reporter: &ProgressReporter,
) -> Result<SignalResult, EngineError> {
    if let Some(tables) = &config.tables {
        let dir = resolve_table_dir(&tables.root, &tables.version, model, false).map_err(|e| {
            EngineError::Io {
                path: tables.root.to_string_lossy().to_string(),
                source: e,
            }
        })?;
        debug!(table_dir = %dir.display(), "Resolved cross-section table directory.");
    }

    let context = SimulationContext::new(model, experiment, config, reporter);

    reporter.report(Progress::PhaseStart {
        name: "Assembling Distributions",
    });
    let distributions = assemble(&context)?;
    let mut injector = Injector::new(context, ProcessRegistration::dipole(model), distributions);
    injector.initialize()?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Generating Events",
    });
    let mut rng = StdRng::seed_from_u64(config.seed);
    let events = injector.generate_events(&mut rng)?.len();
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Saving Events",
    });
    let events_path = config.output_path(model);
    injector.save_events(&events_path)?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Selection" });
    let rate = selection::aggregate(&events_path, &config.selection)?;
    reporter.report(Progress::PhaseFinish);

    info!(%model, rate, "Signal rate computed.");
    Ok(SignalResult {
        model: *model,
        rate,
        events_path,
        events,
        attempts: injector.attempts(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{DecayWindow, RangeSettings, SelectionConfig, nd280_builder};
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn config(output: &Path, events: usize) -> PipelineConfig {
        nd280_builder(Path::new(crate::BUNDLED_RESOURCE_DIR), output)
            .events_to_inject(events)
            .build()
            .unwrap()
    }

    /// A few-meter decay length with vertices kept inside the fiducial cross-section, so a
    /// few hundred events already select photons.
    fn near_decay_config(output: &Path, events: usize) -> PipelineConfig {
        nd280_builder(Path::new(crate::BUNDLED_RESOURCE_DIR), output)
            .events_to_inject(events)
            .range(RangeSettings {
                radius: 0.8,
                endcap_length: 3.0,
            })
            .decay_window(DecayWindow {
                multiplier: 1.0,
                max_distance: 284.9,
            })
            .build()
            .unwrap()
    }

    const NEAR_MASS: f64 = 0.1;
    const NEAR_COUPLING: f64 = 2e-6;

    #[test]
    fn reference_point_writes_the_table_and_reproduces_on_rerun() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("output");
        let config = config(&output, 1000);
        let reporter = ProgressReporter::new();

        let first = run(0.02, 5e-8, &config, &reporter).unwrap();
        let expected = output.join("ND280UPGRD_Dipole_M2.00e-02_mu5.00e-08_example.json");
        assert_eq!(first.events_path, expected);
        assert!(expected.exists());
        assert_eq!(first.events, 1000);
        assert!(first.rate.is_finite() && first.rate >= 0.0);

        let second = run(0.02, 5e-8, &config, &reporter).unwrap();
        assert_eq!(first.rate, second.rate);
        let leftovers = std::fs::read_dir(&output).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn short_lived_point_yields_a_positive_reproducible_rate() {
        let dir = tempdir().unwrap();
        let config = near_decay_config(dir.path(), 400);
        let reporter = ProgressReporter::new();

        let first = run(NEAR_MASS, NEAR_COUPLING, &config, &reporter).unwrap();
        assert!(first.rate.is_finite());
        assert!(first.rate > 0.0, "rate {}", first.rate);

        let second = run(NEAR_MASS, NEAR_COUPLING, &config, &reporter).unwrap();
        assert_eq!(first.rate, second.rate);

        let reseeded = PipelineConfig {
            seed: 2,
            ..config.clone()
        };
        let third = run(NEAR_MASS, NEAR_COUPLING, &reseeded, &reporter).unwrap();
        assert!(third.rate > 0.0);
        assert_ne!(first.rate, third.rate);
    }

    #[test]
    fn rate_scales_linearly_with_pot() {
        let dir = tempdir().unwrap();
        let base = near_decay_config(dir.path(), 400);
        let doubled = PipelineConfig {
            selection: SelectionConfig {
                pot: 2e21,
                ..base.selection
            },
            ..base.clone()
        };
        let reporter = ProgressReporter::new();
        let r1 = run(NEAR_MASS, NEAR_COUPLING, &base, &reporter).unwrap().rate;
        let r2 = run(NEAR_MASS, NEAR_COUPLING, &doubled, &reporter).unwrap().rate;
        assert!(r1 > 0.0);
        assert!((r2 - 2.0 * r1).abs() <= 1e-12 * r2.abs());
    }

    #[test]
    fn degenerate_decay_widths_abort_before_any_output() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("output");
        let config = config(&output, 10);
        let reporter = ProgressReporter::new();

        let underflow = run(1e-110, 1e-100, &config, &reporter);
        assert!(
            matches!(underflow, Err(EngineError::DegenerateDecayWidth { width, .. }) if width == 0.0)
        );
        let overflow = run(1e120, 1e10, &config, &reporter);
        assert!(
            matches!(overflow, Err(EngineError::DegenerateDecayWidth { width, .. }) if width.is_infinite())
        );
        assert!(!output.exists());
    }

    #[test]
    fn invalid_model_point_is_rejected_before_any_output() {
        let dir = tempdir().unwrap();
        let config = config(&dir.path().join("output"), 10);
        let result = run(-0.1, 5e-8, &config, &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::InvalidParameter { .. })));
        assert!(!dir.path().join("output").exists());
    }

    #[test]
    fn failed_initialization_writes_no_table() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("output");
        let config = config(&output, 10);
        let result = run(19.99, 5e-8, &config, &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::Initialization(_))));
        assert!(!output.exists());
    }

    #[test]
    fn phases_are_reported_in_order() {
        let dir = tempdir().unwrap();
        let config = config(dir.path(), 5);
        let phases = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PhaseStart { name } = event {
                phases.lock().unwrap().push(name);
            }
        }));
        run(0.1, 1e-6, &config, &reporter).unwrap();
        assert_eq!(
            *phases.lock().unwrap(),
            vec![
                "Preparation",
                "Assembling Distributions",
                "Generating Events",
                "Saving Events",
                "Selection"
            ]
        );
    }
}
