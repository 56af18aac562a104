use crate::error::{CliError, Result};
use directories::ProjectDirs;
use hnlyield::core::detector::model::DetectorModel;
use hnlyield::core::flux::TabulatedFlux;
use hnlyield::engine::config::FluxSource;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PATH_FILE_NAME: &str = "resources-path.conf";

/// Locates the directory holding `fluxes/` and `detectors/`.
///
/// A custom location set with `hnlyield resources set-path` wins; otherwise the tables
/// bundled with the library are used.
#[derive(Debug)]
pub struct ResourceManager {
    base_path: PathBuf,
}

impl ResourceManager {
    pub fn new() -> Result<Self> {
        let path = Self::determine_resource_path(Self::get_path_config_file().ok().as_deref())?;
        debug!("ResourceManager initialized with path: {:?}", &path);
        Ok(Self { base_path: path })
    }

    pub fn with_custom_path(path: PathBuf) -> Self {
        Self { base_path: path }
    }

    pub fn get_resource_path(&self) -> &Path {
        &self.base_path
    }

    /// Files the given experiment needs that are absent from the resource directory.
    pub fn missing_files(&self, experiment: &str, flux: &FluxSource) -> Vec<PathBuf> {
        [
            DetectorModel::resource_path(&self.base_path, experiment),
            TabulatedFlux::resource_path(&self.base_path, &flux.experiment, &flux.species),
        ]
        .into_iter()
        .filter(|p| !p.is_file())
        .collect()
    }

    pub fn set_custom_path(path: &Path) -> Result<()> {
        Self::write_path_file(&Self::get_path_config_file()?, path)
    }

    pub fn reset_path() -> Result<()> {
        if let Ok(config_path) = Self::get_path_config_file() {
            Self::remove_path_file(&config_path)?;
        }
        Ok(())
    }

    fn write_path_file(config_path: &Path, path: &Path) -> Result<()> {
        if !path.is_absolute() {
            return Err(CliError::Resource(format!(
                "Resource path must be absolute, got {:?}.",
                path
            )));
        }
        let path_str = path.to_str().ok_or_else(|| {
            CliError::Resource(format!("Resource path {:?} is not valid UTF-8.", path))
        })?;
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(config_path, path_str).map_err(CliError::from)
    }

    fn remove_path_file(config_path: &Path) -> Result<()> {
        if config_path.exists() {
            fs::remove_file(config_path)?;
        }
        Ok(())
    }

    fn determine_resource_path(config_path: Option<&Path>) -> Result<PathBuf> {
        match config_path {
            Some(config_path) if config_path.exists() => {
                let custom_path_str = fs::read_to_string(config_path)?.trim().to_string();
                if custom_path_str.is_empty() {
                    warn!("Custom path config file is empty, falling back to bundled resources.");
                    Ok(Self::get_default_resource_path())
                } else {
                    Ok(PathBuf::from(custom_path_str))
                }
            }
            _ => Ok(Self::get_default_resource_path()),
        }
    }

    fn get_path_config_file() -> Result<PathBuf> {
        ProjectDirs::from("org", "hnlyield", "hnlyield")
            .map(|dirs| dirs.config_dir().join(PATH_FILE_NAME))
            .ok_or_else(|| {
                CliError::Resource("Could not determine config directory path.".to_string())
            })
    }

    fn get_default_resource_path() -> PathBuf {
        PathBuf::from(hnlyield::BUNDLED_RESOURCE_DIR)
    }
}
