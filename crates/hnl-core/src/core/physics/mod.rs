//! Leading-order physics of the dipole-portal heavy neutral lepton.
//!
//! Everything here is stateless: cross-sections and widths are pure functions of the model
//! point and the kinematics, and final-state sampling only borrows a random source.

pub mod constants;
pub mod dipole;
pub mod kinematics;
pub mod tables;
