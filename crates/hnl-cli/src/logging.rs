use crate::error::{CliError, Result};
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

/// Targets that follow `-v`; every other crate stays at `warn` unless `RUST_LOG` says otherwise.
const PIPELINE_TARGETS: [&str; 2] = ["hnlyield", "hnlyield_cli"];

/// The file log always records at least this much, so a scan can be audited after the fact.
const FILE_FLOOR: LevelFilter = LevelFilter::DEBUG;

pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Pipeline crates at `level`, dependencies at `warn` or quieter.
fn pipeline_filter(level: LevelFilter) -> Result<EnvFilter> {
    let mut directives = vec![level.min(LevelFilter::WARN).to_string()];
    directives.extend(
        PIPELINE_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level)),
    );
    EnvFilter::try_new(directives.join(","))
        .map_err(|e| CliError::Config(format!("invalid log filter: {}", e)))
}

fn terminal_filter(level: LevelFilter) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => pipeline_filter(level),
    }
}

/// Opens `path` for appending, creating missing parent directories, so successive runs and
/// scan points accumulate in one file.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Installs the global subscriber: a compact stderr layer at the `-v`/`-q` level and, with
/// `--log-file`, a plain-text file layer that keeps debug detail from the pipeline crates.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let level = level_filter(verbosity, quiet);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact()
        .with_filter(terminal_filter(level)?);

    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(open_log_file(path)?)
                .with_ansi(false)
                .with_target(true)
                .with_filter(pipeline_filter(level.max(FILE_FLOOR))?),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("failed to install logger: {}", e)))
}
