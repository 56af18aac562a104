use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    author,
    about = "hnlyield - expected signal yields for heavy neutral leptons with a transition magnetic moment at near neutrino detectors.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to a pipeline configuration file in TOML format.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S selection.pot=2e21
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", global = true)]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the signal rate for one (mass, coupling) model point.
    Run(RunArgs),
    /// Compute signal rates over a log-spaced grid of model points.
    Scan(ScanArgs),
    /// Manage the directory holding flux tables and detector descriptions.
    Resources(ResourcesArgs),
}

/// Overrides shared by every command that runs the pipeline.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Number of events to generate per model point.
    #[arg(short = 'n', long, value_name = "INT")]
    pub events: Option<usize>,

    /// Directory receiving the event tables.
    #[arg(short, long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Seed of the event generator.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Protons on target the rate is normalized to.
    #[arg(long, value_name = "FLOAT")]
    pub pot: Option<f64>,

    /// Detection efficiency applied to the selected weight.
    #[arg(long, value_name = "FLOAT")]
    pub efficiency: Option<f64>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Heavy neutral lepton mass in GeV.
    #[arg(value_name = "MASS")]
    pub mass: f64,

    /// Transition magnetic moment in GeV^-1.
    #[arg(value_name = "COUPLING")]
    pub coupling: f64,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Arguments for the `scan` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Number of mass points.
    #[arg(long, value_name = "INT")]
    pub n_mass: Option<usize>,

    /// Number of coupling points.
    #[arg(long, value_name = "INT")]
    pub n_coupling: Option<usize>,

    /// Lowest mass in GeV.
    #[arg(long, value_name = "FLOAT")]
    pub mass_min: Option<f64>,

    /// Highest mass in GeV.
    #[arg(long, value_name = "FLOAT")]
    pub mass_max: Option<f64>,

    /// Lowest coupling in GeV^-1.
    #[arg(long, value_name = "FLOAT")]
    pub coupling_min: Option<f64>,

    /// Highest coupling in GeV^-1.
    #[arg(long, value_name = "FLOAT")]
    pub coupling_max: Option<f64>,

    /// Text log receiving one `[m, mu, rate]` line per point.
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// Skip model points that fail instead of aborting the scan.
    #[arg(long)]
    pub keep_going: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Arguments for the `resources` subcommand.
#[derive(Args, Debug)]
pub struct ResourcesArgs {
    #[command(subcommand)]
    pub command: ResourcesCommands,
}

#[derive(Subcommand, Debug)]
pub enum ResourcesCommands {
    /// Show the resource directory in use and whether the default tables are present.
    Path,
    /// Set a custom absolute path for the resource directory.
    SetPath {
        /// Directory containing `fluxes/` and `detectors/`.
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Reset the resource path to the tables bundled with the library.
    ResetPath,
}
