use crate::cli::ScanArgs;
use crate::config::builder::build_config;
use crate::error::Result;
use crate::resources::ResourceManager;
use crate::utils::progress::CliProgressHandler;
use hnlyield::engine::progress::ProgressReporter;
use hnlyield::workflows;
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: ScanArgs, config_path: Option<&Path>, set_values: &[String]) -> Result<()> {
    info!("Initializing resource manager...");
    let resources = ResourceManager::new()?;
    let app = build_config(config_path, set_values, &args.pipeline, Some(&args), &resources)?;
    let scan = app.scan;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Scanning {} x {} model points, logging to {}...",
        scan.grid.mass_points,
        scan.grid.coupling_points,
        scan.log_path.display()
    );
    let summary = workflows::scan::run(
        &scan.grid,
        &app.pipeline,
        &scan.log_path,
        scan.options,
        &reporter,
    )?;

    if !summary.skipped.is_empty() {
        warn!(skipped = summary.skipped.len(), "Some scan points failed.");
        println!(
            "Warning: {} point(s) failed and were skipped.",
            summary.skipped.len()
        );
    }
    println!(
        "Scan complete: {} point(s) appended to {}",
        summary.results.len(),
        scan.log_path.display()
    );
    Ok(())
}
