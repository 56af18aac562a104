//! # Engine Module
//!
//! Stateful side of the pipeline: configuration, distribution assembly, the event
//! generator and the reduction of its output to a signal rate.
//!
//! ## Overview
//!
//! A run binds a [`context::SimulationContext`] (model point, experiment, pipeline
//! settings, progress reporter) and moves through three steps:
//!
//! - **Distribution assembly** ([`distributions`]) builds matched injection and physical
//!   energy, direction and vertex distributions for the model point.
//! - **Generation** ([`injector`]) samples primaries, up-scatters them on a target nucleus
//!   chosen by interaction density, expands decays breadth-first under a
//!   [`stopping::StoppingCondition`] and weighs every event ([`weighting`]).
//! - **Selection** ([`selection`]) applies the fiducial and signal-particle cut to the
//!   persisted event table and scales the summed weight by POT and efficiency.
//!
//! Errors from every step surface as [`error::EngineError`].

pub mod config;
pub mod context;
pub mod distributions;
pub mod error;
pub mod injector;
pub mod process;
pub mod progress;
pub mod selection;
pub mod state;
pub mod stopping;
pub(crate) mod utils;
pub mod weighting;
