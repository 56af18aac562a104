//! # hnlyield
//!
//! Expected signal yields for a heavy neutral lepton with a transition magnetic moment,
//! produced by neutrino up-scattering in and around a near detector and observed through
//! its radiative decay `N4 -> nu gamma`.
//!
//! The library keeps the three-layer split:
//!
//! - **[`core`]** holds stateless data and physics: model points, particle species, the
//!   dipole cross-section and width, detector geometry, the tabulated flux, and the on-disk
//!   event table and scan log.
//! - **[`engine`]** is the stateful generation machinery: configuration, distribution
//!   assembly, the injector state machine with its stopping condition, event weighting,
//!   selection and progress reporting.
//! - **[`workflows`]** ties both together into the public entry points: the single-point
//!   signal pipeline and the grid scan.

pub mod core;
pub mod engine;
pub mod workflows;

/// Directory holding the flux tables and detector descriptions shipped with the crate.
pub const BUNDLED_RESOURCE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/resources");
