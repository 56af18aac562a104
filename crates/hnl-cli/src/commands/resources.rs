use crate::cli::{ResourcesArgs, ResourcesCommands};
use crate::error::Result;
use crate::resources::ResourceManager;
use hnlyield::engine::config::FluxSource;
use std::path::PathBuf;
use tracing::info;

const DEFAULT_EXPERIMENT: &str = "ND280UPGRD";

pub fn run(args: ResourcesArgs) -> Result<()> {
    match args.command {
        ResourcesCommands::Path => {
            handle_path()?;
        }
        ResourcesCommands::SetPath { path } => {
            handle_set_path(path)?;
        }
        ResourcesCommands::ResetPath => {
            handle_reset_path()?;
        }
    }
    Ok(())
}

fn handle_path() -> Result<()> {
    let manager = ResourceManager::new()?;
    println!("{}", manager.get_resource_path().display());

    let missing = manager.missing_files(DEFAULT_EXPERIMENT, &FluxSource::default());
    if missing.is_empty() {
        println!("✓ Default experiment tables are present.");
    } else {
        for path in missing {
            println!("✗ Missing: {}", path.display());
        }
    }
    Ok(())
}

fn handle_set_path(path: PathBuf) -> Result<()> {
    info!("Setting custom resource path to {:?}", &path);
    ResourceManager::set_custom_path(&path)?;
    println!("✓ Resource path set to: {}", path.display());
    Ok(())
}

fn handle_reset_path() -> Result<()> {
    info!("Resetting resource path to the bundled tables.");
    ResourceManager::reset_path()?;
    let manager = ResourceManager::new()?;
    println!(
        "✓ Resource path reset to: {}",
        manager.get_resource_path().display()
    );
    Ok(())
}
