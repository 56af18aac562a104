//! # Core Module
//!
//! Stateless building blocks of the signal-yield pipeline.
//!
//! - [`models`] - particle species, model points, event records and scan results
//! - [`physics`] - dipole cross-section, decay width and kinematics
//! - [`detector`] - detector geometry, materials and the fiducial volume
//! - [`flux`] - tabulated neutrino flux loading and sampling
//! - [`io`] - the persisted event table and the scan log
//! - [`utils`] - formatting, grids and vector geometry helpers

pub mod detector;
pub mod flux;
pub mod io;
pub mod models;
pub mod physics;
pub mod utils;
