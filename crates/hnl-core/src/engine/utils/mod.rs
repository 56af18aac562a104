//! Random sampling helpers shared by the distributions and the injector.

pub mod sampling;
