//! Detector description: volumes, materials and the fiducial region.

pub mod geometry;
pub mod material;
pub mod model;
