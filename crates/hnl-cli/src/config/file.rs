use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Pipeline settings as written in a TOML file; every field is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub experiment: Option<String>,
    pub events_to_inject: Option<usize>,
    pub resource_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub beam_direction: Option<[f64; 3]>,
    pub flux: Option<FileFluxConfig>,
    pub range: Option<FileRangeConfig>,
    pub decay_window: Option<FileDecayWindowConfig>,
    pub selection: Option<FileSelectionConfig>,
    pub tables: Option<FileTablesConfig>,
    pub scan: Option<FileScanConfig>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileFluxConfig {
    pub experiment: Option<String>,
    pub species: Option<String>,
    pub energy_max: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileRangeConfig {
    pub radius: Option<f64>,
    pub endcap_length: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileDecayWindowConfig {
    pub multiplier: Option<f64>,
    pub max_distance: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSelectionConfig {
    pub interaction_index: Option<usize>,
    pub secondary_index: Option<usize>,
    /// PDG code of the particle counted as signal.
    pub signal_particle: Option<i32>,
    pub pot: Option<f64>,
    pub efficiency: Option<f64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileTablesConfig {
    pub root: PathBuf,
    pub version: String,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileScanConfig {
    pub mass_min: Option<f64>,
    pub mass_max: Option<f64>,
    pub mass_points: Option<usize>,
    pub coupling_min: Option<f64>,
    pub coupling_max: Option<f64>,
    pub coupling_points: Option<usize>,
    pub log: Option<PathBuf>,
    pub keep_going: Option<bool>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
