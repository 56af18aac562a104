use nalgebra::Point3;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::geometry::Shape;
use super::material::Material;
use crate::core::models::particle::ParticleType;

#[derive(Debug, Error)]
pub enum DetectorLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid detector description: {0}")]
    Invalid(String),
}

/// A volume filled with one material. Higher levels take precedence where sectors overlap.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Sector {
    pub name: String,
    pub level: i32,
    pub material: String,
    pub geometry: Shape,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectorModel {
    pub name: String,
    outer_bounds: Shape,
    fiducial: Shape,
    sectors: Vec<Sector>,
    materials: HashMap<String, Material>,
}

impl DetectorModel {
    /// Path of a built-in detector description under a resource directory.
    pub fn resource_path(resource_dir: &Path, name: &str) -> PathBuf {
        resource_dir.join("detectors").join(format!("{}.toml", name))
    }

    pub fn load(path: &Path) -> Result<Self, DetectorLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| DetectorLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            DetectorLoadError::Toml { source, .. } => DetectorLoadError::Toml {
                path: path.to_string_lossy().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DetectorLoadError> {
        let model: Self = toml::from_str(content).map_err(|e| DetectorLoadError::Toml {
            path: "<inline>".to_string(),
            source: e,
        })?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), DetectorLoadError> {
        if self.sectors.is_empty() {
            return Err(DetectorLoadError::Invalid(format!(
                "detector '{}' defines no sectors",
                self.name
            )));
        }
        for sector in &self.sectors {
            if !self.materials.contains_key(&sector.material) {
                return Err(DetectorLoadError::Invalid(format!(
                    "sector '{}' uses unknown material '{}'",
                    sector.name, sector.material
                )));
            }
        }
        for (name, material) in &self.materials {
            if material.density < 0.0 || material.components.iter().any(|c| c.mass_fraction < 0.0)
            {
                return Err(DetectorLoadError::Invalid(format!(
                    "material '{}' has a negative density or mass fraction",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn outer_bounds(&self) -> &Shape {
        &self.outer_bounds
    }

    pub fn fiducial(&self) -> &Shape {
        &self.fiducial
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn is_in_fiducial(&self, point: &Point3<f64>) -> bool {
        self.fiducial.contains(point)
    }

    /// The highest-level sector containing `point`; later sectors win ties.
    pub fn sector_at(&self, point: &Point3<f64>) -> Option<&Sector> {
        if !self.outer_bounds.contains(point) {
            return None;
        }
        self.sectors
            .iter()
            .filter(|s| s.geometry.contains(point))
            .max_by_key(|s| s.level)
    }

    pub fn material_at(&self, point: &Point3<f64>) -> Option<&Material> {
        self.sector_at(point)
            .and_then(|s| self.materials.get(&s.material))
    }

    /// Nuclei per m^3 of each species at `point`; empty outside the detector.
    pub fn number_densities_at(&self, point: &Point3<f64>) -> Vec<(ParticleType, f64)> {
        self.material_at(point)
            .map(Material::number_densities)
            .unwrap_or_default()
    }

    /// Every nuclear species present in any sector, sorted by code.
    pub fn target_types(&self) -> Vec<ParticleType> {
        let targets: BTreeSet<ParticleType> = self
            .sectors
            .iter()
            .filter_map(|s| self.materials.get(&s.material))
            .flat_map(|m| m.components.iter().map(|c| c.nucleus()))
            .collect();
        targets.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SIMPLE: &str = r#"
        name = "TEST"

        [outer_bounds]
        shape = "sphere"
        center = [0.0, 0.0, 0.0]
        radius = 100.0

        [fiducial]
        shape = "box"
        center = [0.0, 0.0, 0.0]
        half_extents = [1.0, 1.0, 1.0]

        [[sectors]]
        name = "world"
        level = -1
        material = "rock"
        geometry = { shape = "sphere", center = [0.0, 0.0, 0.0], radius = 100.0 }

        [[sectors]]
        name = "tracker"
        level = 1
        material = "plastic"
        geometry = { shape = "box", center = [0.0, 0.0, 0.0], half_extents = [2.0, 2.0, 2.0] }

        [materials.rock]
        density = 2650.0
        components = [{ z = 8, a = 16, mass_fraction = 0.532 }, { z = 14, a = 28, mass_fraction = 0.468 }]

        [materials.plastic]
        density = 1050.0
        components = [{ z = 6, a = 12, mass_fraction = 0.923 }, { z = 1, a = 1, mass_fraction = 0.077 }]
    "#;

    #[test]
    fn innermost_sector_wins() {
        let detector = DetectorModel::from_toml_str(SIMPLE).unwrap();
        let inside = Point3::new(0.0, 0.0, 1.5);
        assert_eq!(detector.sector_at(&inside).unwrap().name, "tracker");
        let rock = Point3::new(0.0, 0.0, 50.0);
        assert_eq!(detector.sector_at(&rock).unwrap().name, "world");
        assert!(detector.sector_at(&Point3::new(0.0, 0.0, 150.0)).is_none());
        assert!(detector.number_densities_at(&Point3::new(0.0, 0.0, 150.0)).is_empty());
    }

    #[test]
    fn fiducial_membership() {
        let detector = DetectorModel::from_toml_str(SIMPLE).unwrap();
        assert!(detector.is_in_fiducial(&Point3::new(0.5, -0.5, 0.9)));
        assert!(!detector.is_in_fiducial(&Point3::new(0.0, 0.0, 1.5)));
    }

    #[test]
    fn target_types_collects_all_nuclei() {
        let detector = DetectorModel::from_toml_str(SIMPLE).unwrap();
        assert_eq!(
            detector.target_types(),
            vec![
                ParticleType::H_NUCLEUS,
                ParticleType::C12_NUCLEUS,
                ParticleType::O16_NUCLEUS,
                ParticleType::SI28_NUCLEUS,
            ]
        );
    }

    #[test]
    fn unknown_material_is_rejected() {
        let broken = SIMPLE.replace("material = \"plastic\"", "material = \"unobtainium\"");
        assert!(matches!(
            DetectorModel::from_toml_str(&broken),
            Err(DetectorLoadError::Invalid(_))
        ));
    }

    #[test]
    fn load_reports_path_on_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            DetectorModel::load(&missing),
            Err(DetectorLoadError::Io { .. })
        ));

        let malformed = dir.path().join("bad.toml");
        fs::write(&malformed, "this is not toml").unwrap();
        match DetectorModel::load(&malformed) {
            Err(DetectorLoadError::Toml { path, .. }) => assert!(path.ends_with("bad.toml")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn bundled_nd280_description_loads() {
        let path = DetectorModel::resource_path(
            Path::new(crate::BUNDLED_RESOURCE_DIR),
            "ND280UPGRD",
        );
        let detector = DetectorModel::load(&path).unwrap();
        assert_eq!(detector.name, "ND280UPGRD");
        assert!(detector.is_in_fiducial(&Point3::new(0.0, 0.0, 0.0)));
        assert!(detector.target_types().contains(&ParticleType::O16_NUCLEUS));
        assert!(
            detector
                .outer_bounds()
                .contains(&Point3::new(0.0, 0.0, -299.0))
        );
    }
}
