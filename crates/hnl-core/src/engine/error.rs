use thiserror::Error;

use super::config::ConfigError;
use super::state::InjectorState;
use crate::core::detector::model::DetectorLoadError;
use crate::core::flux::FluxLoadError;
use crate::core::io::event_table::TableError;
use crate::core::io::scan_log::ScanLogError;
use crate::core::models::model::ModelError;
use crate::core::utils::grid::GridError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid model parameter: {source}")]
    InvalidParameter {
        #[from]
        source: ModelError,
    },

    #[error("Degenerate decay width {width:e} GeV for {model}")]
    DegenerateDecayWidth { width: f64, model: String },

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Operation '{operation}' is not allowed while the injector is {state}")]
    InvalidState {
        operation: &'static str,
        state: InjectorState,
    },

    #[error("Gave up after {attempts} attempts with only {accepted} accepted events")]
    AttemptLimit { attempts: u64, accepted: usize },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error(
        "Event {event} has no secondary ({interaction}, {secondary}); only {available} available at that level"
    )]
    SelectionIndex {
        event: usize,
        interaction: usize,
        secondary: usize,
        available: usize,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Flux table error: {source}")]
    Flux {
        #[from]
        source: FluxLoadError,
    },

    #[error("Detector description error: {source}")]
    Detector {
        #[from]
        source: DetectorLoadError,
    },

    /// Malformed or inconsistent event table. Filesystem failures on the table surface as
    /// [`EngineError::Io`] instead.
    #[error("Event table error: {source}")]
    Table { source: TableError },

    #[error("Scan log error: {source}")]
    ScanLog {
        #[from]
        source: ScanLogError,
    },

    #[error("Scan grid error: {source}")]
    Grid {
        #[from]
        source: GridError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl From<TableError> for EngineError {
    fn from(error: TableError) -> Self {
        match error {
            TableError::Io { path, source } => Self::Io { path, source },
            source => Self::Table { source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn table_io_failures_become_io_errors() {
        let error = EngineError::from(TableError::Io {
            path: "events.json".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        });
        assert!(matches!(error, EngineError::Io { ref path, .. } if path == "events.json"));
    }

    #[test]
    fn malformed_tables_stay_table_errors() {
        let error = EngineError::from(TableError::Ragged { event: 3 });
        assert!(matches!(
            error,
            EngineError::Table {
                source: TableError::Ragged { event: 3 }
            }
        ));
    }
}
