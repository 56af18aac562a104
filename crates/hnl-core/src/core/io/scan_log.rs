use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::core::models::scan::ScanResult;
use crate::core::utils::format::format_scientific;

const LOG_PRECISION: usize = 16;

#[derive(Debug, Error)]
pub enum ScanLogError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Malformed scan log line {line} in '{path}': {content}")]
    Malformed {
        path: String,
        line: usize,
        content: String,
    },
}

/// Renders one result as `[mass, coupling, rate]`.
pub fn format_line(result: &ScanResult) -> String {
    format!(
        "[{}, {}, {}]",
        format_scientific(result.mass, LOG_PRECISION),
        format_scientific(result.coupling, LOG_PRECISION),
        format_scientific(result.rate, LOG_PRECISION)
    )
}

pub fn parse_line(line: &str) -> Option<ScanResult> {
    let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?;
    let values: Vec<f64> = inner
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match values.as_slice() {
        [mass, coupling, rate] => Some(ScanResult {
            mass: *mass,
            coupling: *coupling,
            rate: *rate,
        }),
        _ => None,
    }
}

/// Appends one line to the log, creating the file (and its directory) on first use.
pub fn append(path: &Path, result: &ScanResult) -> Result<(), ScanLogError> {
    let io_err = |source| ScanLogError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    writeln!(file, "{}", format_line(result)).map_err(io_err)
}

pub fn read(path: &Path) -> Result<Vec<ScanResult>, ScanLogError> {
    let path_str = path.to_string_lossy().to_string();
    let content = fs::read_to_string(path).map_err(|e| ScanLogError::Io {
        path: path_str.clone(),
        source: e,
    })?;
    content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| {
            parse_line(l).ok_or_else(|| ScanLogError::Malformed {
                path: path_str.clone(),
                line: i + 1,
                content: l.to_string(),
            })
        })
        .collect()
}
