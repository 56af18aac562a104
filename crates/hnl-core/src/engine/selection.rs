use std::path::Path;
use tracing::{debug, info, instrument};

use super::config::SelectionConfig;
use super::error::EngineError;
use crate::core::io::event_table::EventTable;
use crate::core::models::event::{EventIndexError, EventRecord};

/// Whether `record` passes the signal cut: the selected secondary has the signal type and its
/// interaction lies inside the fiducial volume.
pub fn selection_mask(
    record: &EventRecord,
    config: &SelectionConfig,
) -> Result<bool, EventIndexError> {
    let index = config.index;
    let is_signal = record.secondary_type(index)? == config.signal_particle;
    let in_fiducial = record.in_fiducial(index.interaction)?;
    Ok(is_signal && in_fiducial)
}

/// Sums `weight * mask` over `records` and scales by POT and efficiency.
pub fn aggregate_records(
    records: &[EventRecord],
    config: &SelectionConfig,
) -> Result<f64, EngineError> {
    let mut selected = 0usize;
    let mut sum = 0.0;
    for (event, record) in records.iter().enumerate() {
        let passes = selection_mask(record, config).map_err(|e| index_error(event, config, e))?;
        if passes {
            selected += 1;
            sum += record.event_weight;
        }
    }
    debug!(selected, total = records.len(), "Applied selection mask.");
    Ok(sum * config.pot * config.efficiency)
}

/// Reads a persisted event table and reduces it to the POT-normalized rate.
#[instrument(skip_all, name = "aggregate", fields(path = %path.display()))]
pub fn aggregate(path: &Path, config: &SelectionConfig) -> Result<f64, EngineError> {
    let records = EventTable::read(path)?.into_records()?;
    let rate = aggregate_records(&records, config)?;
    info!(events = records.len(), rate, "Aggregated signal rate.");
    Ok(rate)
}

fn index_error(event: usize, config: &SelectionConfig, error: EventIndexError) -> EngineError {
    match error {
        EventIndexError::MissingInteraction { requested, available } => EngineError::SelectionIndex {
            event,
            interaction: requested,
            secondary: config.index.secondary,
            available,
        },
        EventIndexError::MissingSecondary {
            interaction,
            requested,
            available,
        } => EngineError::SelectionIndex {
            event,
            interaction,
            secondary: requested,
            available,
        },
    }
}
