use crate::cli::RunArgs;
use crate::config::builder::build_config;
use crate::error::Result;
use crate::resources::ResourceManager;
use crate::utils::progress::CliProgressHandler;
use hnlyield::core::utils::format::format_scientific;
use hnlyield::engine::progress::ProgressReporter;
use hnlyield::workflows;
use std::path::Path;
use tracing::info;

pub fn run(args: RunArgs, config_path: Option<&Path>, set_values: &[String]) -> Result<()> {
    info!("Initializing resource manager...");
    let resources = ResourceManager::new()?;
    let app = build_config(config_path, set_values, &args.pipeline, None, &resources)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Computing signal rate for m4 = {} GeV, mu = {} GeV^-1 ({} events)...",
        format_scientific(args.mass, 2),
        format_scientific(args.coupling, 2),
        app.pipeline.events_to_inject
    );
    let result = workflows::signal::run(args.mass, args.coupling, &app.pipeline, &reporter)?;

    info!(
        events = result.events,
        attempts = result.attempts,
        "Signal workflow finished."
    );
    println!("Events written to: {}", result.events_path.display());
    println!("{}", result.rate);
    Ok(())
}
