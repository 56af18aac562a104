use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::{AppConfig, ScanSettings};
use crate::cli::{PipelineArgs, ScanArgs};
use crate::error::{CliError, Result};
use crate::resources::ResourceManager;
use crate::utils::parser::{self, ParseError};
use hnlyield::core::models::event::SelectionIndex;
use hnlyield::core::models::particle::ParticleType;
use hnlyield::engine::config::{
    self as core_config, DecayWindow, FluxSource, RangeSettings, SelectionConfig, TableSettings,
};
use hnlyield::workflows::scan::{ScanGrid, ScanOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Merges defaults, the optional TOML file, `-S` overrides and command-line flags, in that
/// order of increasing precedence.
pub fn build_config(
    config_path: Option<&Path>,
    set_values: &[String],
    args: &PipelineArgs,
    scan_args: Option<&ScanArgs>,
    resources: &ResourceManager,
) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = config_path {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };
    let mut file_config = apply_set_values(file_config, set_values)?;

    let experiment = file_config
        .experiment
        .take()
        .unwrap_or_else(|| defaults.experiment.clone());
    let events_to_inject = args
        .events
        .or(file_config.events_to_inject)
        .unwrap_or(defaults.events_to_inject);
    let output_dir = args
        .output_dir
        .clone()
        .or(file_config.output_dir.take())
        .unwrap_or_else(|| PathBuf::from(&defaults.output_dir));
    let seed = args.seed.or(file_config.seed).unwrap_or(defaults.seed);
    let resource_dir = file_config
        .resource_dir
        .take()
        .unwrap_or_else(|| resources.get_resource_path().to_path_buf());

    let flux = merge_flux(&mut file_config);
    let range = merge_range(&file_config);
    let decay_window = merge_decay_window(&file_config);
    let selection = merge_selection(&file_config, args);

    let missing = ResourceManager::with_custom_path(resource_dir.clone())
        .missing_files(&experiment, &flux);
    if !missing.is_empty() {
        return Err(CliError::Resource(format!(
            "Missing resource files: {:?}.\nHint: Run 'hnlyield resources set-path <DIR>' to point at a directory with 'fluxes/' and 'detectors/'.",
            missing
        )));
    }

    let mut builder = core_config::PipelineConfigBuilder::new()
        .experiment(experiment)
        .events_to_inject(events_to_inject)
        .resource_dir(resource_dir)
        .output_dir(output_dir)
        .flux(flux)
        .range(range)
        .decay_window(decay_window)
        .selection(selection)
        .seed(seed);
    if let Some(direction) = file_config.beam_direction {
        builder = builder.beam_direction(direction);
    }
    if let Some(tables) = file_config.tables.take() {
        builder = builder.tables(TableSettings {
            root: tables.root,
            version: tables.version,
        });
    }
    let pipeline = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let scan = merge_scan(&mut file_config, scan_args, &defaults);
    Ok(AppConfig { pipeline, scan })
}

fn merge_flux(file_config: &mut FileConfig) -> FluxSource {
    let defaults = FluxSource::default();
    let file_val = file_config.flux.take().unwrap_or_default();
    FluxSource {
        experiment: file_val.experiment.unwrap_or(defaults.experiment),
        species: file_val.species.unwrap_or(defaults.species),
        energy_max: file_val.energy_max.unwrap_or(defaults.energy_max),
    }
}

fn merge_range(file_config: &FileConfig) -> RangeSettings {
    let defaults = RangeSettings::default();
    let file_val = file_config.range.clone().unwrap_or_default();
    RangeSettings {
        radius: file_val.radius.unwrap_or(defaults.radius),
        endcap_length: file_val.endcap_length.unwrap_or(defaults.endcap_length),
    }
}

fn merge_decay_window(file_config: &FileConfig) -> DecayWindow {
    let defaults = DecayWindow::default();
    let file_val = file_config.decay_window.clone().unwrap_or_default();
    DecayWindow {
        multiplier: file_val.multiplier.unwrap_or(defaults.multiplier),
        max_distance: file_val.max_distance.unwrap_or(defaults.max_distance),
    }
}

fn merge_selection(file_config: &FileConfig, args: &PipelineArgs) -> SelectionConfig {
    let defaults = SelectionConfig::default();
    let file_val = file_config.selection.clone().unwrap_or_default();
    SelectionConfig {
        index: SelectionIndex::new(
            file_val
                .interaction_index
                .unwrap_or(defaults.index.interaction),
            file_val
                .secondary_index
                .unwrap_or(defaults.index.secondary),
        ),
        signal_particle: file_val
            .signal_particle
            .map(ParticleType::from_code)
            .unwrap_or(defaults.signal_particle),
        pot: args.pot.or(file_val.pot).unwrap_or(defaults.pot),
        efficiency: args
            .efficiency
            .or(file_val.efficiency)
            .unwrap_or(defaults.efficiency),
    }
}

fn merge_scan(
    file_config: &mut FileConfig,
    scan_args: Option<&ScanArgs>,
    defaults: &DefaultsConfig,
) -> ScanSettings {
    let file_val = file_config.scan.take().unwrap_or_default();
    let args = scan_args.cloned().unwrap_or_default();
    let grid = ScanGrid {
        mass_range: (
            args.mass_min
                .or(file_val.mass_min)
                .unwrap_or(defaults.mass_range.0),
            args.mass_max
                .or(file_val.mass_max)
                .unwrap_or(defaults.mass_range.1),
        ),
        coupling_range: (
            args.coupling_min
                .or(file_val.coupling_min)
                .unwrap_or(defaults.coupling_range.0),
            args.coupling_max
                .or(file_val.coupling_max)
                .unwrap_or(defaults.coupling_range.1),
        ),
        mass_points: args
            .n_mass
            .or(file_val.mass_points)
            .unwrap_or(defaults.mass_points),
        coupling_points: args
            .n_coupling
            .or(file_val.coupling_points)
            .unwrap_or(defaults.coupling_points),
    };
    ScanSettings {
        grid,
        log_path: args
            .log
            .or(file_val.log)
            .unwrap_or_else(|| PathBuf::from(&defaults.scan_log)),
        options: ScanOptions {
            keep_going: args.keep_going || file_val.keep_going.unwrap_or(false),
        },
    }
}

fn set<T: FromStr>(
    slot: &mut Option<T>,
    key: &str,
    value: &str,
    expected: &'static str,
) -> std::result::Result<(), ParseError> {
    *slot = Some(parser::parse_value(key, value, expected)?);
    Ok(())
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value) =
            parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

        let result = match key {
            "experiment" => set(&mut config.experiment, key, value, "string"),
            "events-to-inject" => set(&mut config.events_to_inject, key, value, "integer"),
            "resource-dir" => set(&mut config.resource_dir, key, value, "path"),
            "output-dir" => set(&mut config.output_dir, key, value, "path"),
            "seed" => set(&mut config.seed, key, value, "integer"),
            "flux.experiment" => {
                let flux = config.flux.get_or_insert_with(Default::default);
                set(&mut flux.experiment, key, value, "string")
            }
            "flux.species" => {
                let flux = config.flux.get_or_insert_with(Default::default);
                set(&mut flux.species, key, value, "string")
            }
            "flux.energy-max" => {
                let flux = config.flux.get_or_insert_with(Default::default);
                set(&mut flux.energy_max, key, value, "float")
            }
            "range.radius" => {
                let range = config.range.get_or_insert_with(Default::default);
                set(&mut range.radius, key, value, "float")
            }
            "range.endcap-length" => {
                let range = config.range.get_or_insert_with(Default::default);
                set(&mut range.endcap_length, key, value, "float")
            }
            "decay-window.multiplier" => {
                let window = config.decay_window.get_or_insert_with(Default::default);
                set(&mut window.multiplier, key, value, "float")
            }
            "decay-window.max-distance" => {
                let window = config.decay_window.get_or_insert_with(Default::default);
                set(&mut window.max_distance, key, value, "float")
            }
            "selection.pot" => {
                let selection = config.selection.get_or_insert_with(Default::default);
                set(&mut selection.pot, key, value, "float")
            }
            "selection.efficiency" => {
                let selection = config.selection.get_or_insert_with(Default::default);
                set(&mut selection.efficiency, key, value, "float")
            }
            "selection.interaction-index" => {
                let selection = config.selection.get_or_insert_with(Default::default);
                set(&mut selection.interaction_index, key, value, "integer")
            }
            "selection.secondary-index" => {
                let selection = config.selection.get_or_insert_with(Default::default);
                set(&mut selection.secondary_index, key, value, "integer")
            }
            "selection.signal-particle" => {
                let selection = config.selection.get_or_insert_with(Default::default);
                set(&mut selection.signal_particle, key, value, "integer")
            }
            "scan.mass-points" => {
                let scan = config.scan.get_or_insert_with(Default::default);
                set(&mut scan.mass_points, key, value, "integer")
            }
            "scan.coupling-points" => {
                let scan = config.scan.get_or_insert_with(Default::default);
                set(&mut scan.coupling_points, key, value, "integer")
            }
            "scan.log" => {
                let scan = config.scan.get_or_insert_with(Default::default);
                set(&mut scan.log, key, value, "path")
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        };
        result.map_err(|e| CliError::Config(e.to_string()))?;
    }
    Ok(config)
}
