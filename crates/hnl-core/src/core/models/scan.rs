use serde::{Deserialize, Serialize};

/// Signal rate computed for one grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub mass: f64,
    pub coupling: f64,
    pub rate: f64,
}
