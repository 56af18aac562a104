//! # Workflows Module
//!
//! Public entry points that run the whole pipeline.
//!
//! - **Signal** ([`signal`]) - one model point: load the experiment, assemble distributions,
//!   generate and persist weighted events, reduce them to a POT-normalized rate.
//! - **Scan** ([`scan`]) - the signal workflow over a log-spaced `(mass, coupling)` grid,
//!   appending each result to a text log.

pub mod scan;
pub mod signal;
