//! Plain data describing what is simulated: particle species, the model point being
//! scanned, generated events, and scan results.

pub mod event;
pub mod model;
pub mod particle;
pub mod scan;
