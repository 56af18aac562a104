//! Persistence of generated events and scan results.

pub mod event_table;
pub mod scan_log;
