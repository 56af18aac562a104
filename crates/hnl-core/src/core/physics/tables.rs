use std::io;
use std::path::{Path, PathBuf};

use crate::core::models::model::ModelPoint;

/// Locates the pre-computed cross-section table directory for a model point:
/// `<root>/DarkNewsTables-v<version>/<model tag>`.
///
/// Absence is only an error when `must_exist` is set.
pub fn resolve_table_dir(
    root: &Path,
    version: &str,
    point: &ModelPoint,
    must_exist: bool,
) -> io::Result<PathBuf> {
    let dir = root
        .join(format!("DarkNewsTables-v{}", version))
        .join(point.model_tag());
    if must_exist && !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("cross-section table directory '{}' does not exist", dir.display()),
        ));
    }
    Ok(dir)
}
