//! Small numeric helpers shared across the crate: C-style number rendering used in file
//! names and logs, and geometric grids for parameter scans.

pub mod format;
pub mod geometry;
pub mod grid;
